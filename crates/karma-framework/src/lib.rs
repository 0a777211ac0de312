//! # Karma Framework
//!
//! Turns a raw inbound chat message into a resolved [`Request`] and walks it
//! through an ordered chain of handlers.
//!
//! - [`RequestBuilder`] looks up the sender and the optional `@mention`
//!   target concurrently, then builds an immutable [`Request`]
//! - [`Handler`] is the unit of work; it returns an explicit [`Outcome`]
//!   instead of calling a continuation
//! - [`HandlerService`] adapts any handler into a `tower::Service`, so tower
//!   layers can be stacked around individual handlers
//! - [`Dispatcher`] runs handlers in registration order until one reports
//!   [`Outcome::Handled`]
//!
//! ```rust,ignore
//! use karma_framework::{Dispatcher, Outcome, handler_fn};
//!
//! let dispatcher = Dispatcher::new(directory, transport, own_user_id)
//!     .with(handler_fn("ping", |ctx| async move {
//!         if ctx.request().message() != "ping" {
//!             return Outcome::Continue;
//!         }
//!         ctx.respond("pong").await;
//!         Outcome::Handled
//!     }));
//!
//! dispatcher.dispatch(InboundMessage::new("lobby", "Alice", "ping")).await;
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod request;

pub use context::{MessageContext, Response};
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::IdentityError;
pub use handler::{BoxedHandlerService, Handler, HandlerFn, HandlerService, Outcome, handler_fn};
pub use request::{Request, RequestBuilder};
