//! Handler system.
//!
//! A [`Handler`] inspects the shared [`MessageContext`] and reports whether it
//! consumed the message. Returning [`Outcome::Continue`] passes the message to
//! the next handler in the chain; [`Outcome::Handled`] ends dispatch, whether
//! or not a reply was sent.
//!
//! Handlers are stored as tower services. [`HandlerService`] wraps any
//! handler, and anything that already is a
//! `Service<Arc<MessageContext>, Response = Outcome>` can be registered
//! directly, so ordinary tower layers (timeouts, filters, rate limits) stack
//! around a single handler without the dispatcher knowing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tower::util::BoxCloneSyncService;
use tower::{BoxError, Service};

use crate::context::MessageContext;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What a handler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The message was consumed; no later handler runs.
    Handled,
    /// The message was not for this handler; try the next one.
    Continue,
}

impl Outcome {
    pub fn is_handled(self) -> bool {
        matches!(self, Outcome::Handled)
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// A unit of work in the dispatch chain.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Short name used in logs and in [`crate::Dispatched::Handled`].
    fn name(&self) -> &str;

    /// Processes one message.
    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome {
        (**self).handle(ctx).await
    }
}

// ============================================================================
// HandlerFn - closures as handlers
// ============================================================================

/// A handler backed by an async closure. Build one with [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    name: String,
    f: F,
}

/// Wraps an async closure into a named [`Handler`].
///
/// ```rust,ignore
/// let ping = handler_fn("ping", |ctx| async move {
///     ctx.respond("pong").await;
///     Outcome::Handled
/// });
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> HandlerFn<F>
where
    F: Fn(Arc<MessageContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    HandlerFn {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Arc<MessageContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: Arc<MessageContext>) -> Outcome {
        (self.f)(ctx).await
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HandlerService
// ============================================================================

/// A type-erased, `Clone + Send + Sync` tower service as stored by the
/// dispatcher.
pub type BoxedHandlerService = BoxCloneSyncService<Arc<MessageContext>, Outcome, BoxError>;

/// A tower [`Service`] that calls a single [`Handler`].
///
/// Handlers are infallible, so the error side is only ever produced by
/// layers stacked on top.
pub struct HandlerService<H> {
    handler: Arc<H>,
}

impl<H> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: Handler> HandlerService<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }
}

impl<H: Handler> Service<Arc<MessageContext>> for HandlerService<H> {
    type Response = Outcome;
    type Error = BoxError;
    type Future = BoxFuture<Result<Outcome, BoxError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<MessageContext>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        Box::pin(async move { Ok(handler.handle(ctx).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Response;
    use crate::request::Request;
    use karma_core::{RecordingTransport, User};
    use tower::ServiceExt;

    fn ctx(message: &str) -> Arc<MessageContext> {
        let user = User {
            id: 1,
            jid: "1_1@chat.example.com".into(),
            display_name: "Alice".into(),
            mention_name: "alice".into(),
        };
        let request = Request::new("lobby", message, message, user, None, false);
        Arc::new(MessageContext::new(
            request,
            Response::new("lobby", Arc::new(RecordingTransport::new())),
        ))
    }

    #[tokio::test]
    async fn test_handler_fn_reports_outcome() {
        let h = handler_fn("ping", |ctx: Arc<MessageContext>| async move {
            if ctx.request().message() == "ping" {
                Outcome::Handled
            } else {
                Outcome::Continue
            }
        });

        assert_eq!(h.name(), "ping");
        assert_eq!(h.handle(ctx("ping")).await, Outcome::Handled);
        assert_eq!(h.handle(ctx("pong")).await, Outcome::Continue);
    }

    #[tokio::test]
    async fn test_handler_service_wraps_handler() {
        let svc = HandlerService::new(handler_fn("always", |_| async { Outcome::Handled }));
        assert_eq!(svc.name(), "always");

        let outcome = svc.clone().oneshot(ctx("anything")).await.unwrap();
        assert!(outcome.is_handled());
    }
}
