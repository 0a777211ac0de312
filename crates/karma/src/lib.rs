//! # Karma
//!
//! A chat-room bot that keeps score. Users hand out `name++` and `name--`,
//! the bot resolves the name, applies the award and answers in the channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ InboundMessage ┌─────────┐   Request   ┌────────────┐
//! │ Transport │───────────────▶│ Runtime │────────────▶│ Dispatcher │──▶ plusplus ──▶ echo ──▶ snark
//! └───────────┘                └─────────┘             └────────────┘        │
//!       ▲                                                    │               ▼
//!       └──────────────────────── respond ───────────────────┘        SqliteStore
//! ```
//!
//! - **Runtime**: loads configuration, sets up logging, owns the message loop
//! - **Dispatcher**: resolves who sent a message and who it addresses, then
//!   walks the handler chain until one reports it handled the message
//! - **Plugins**: the award pipeline plus two small reference handlers
//! - **Store**: SQLite-backed user directory and score rows
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use karma::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = KarmaRuntime::builder().build(my_transport)?;
//!     runtime.refresh_roster(&roster).await?;
//!     runtime.run(inbound_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use karma_core as core;
pub use karma_framework as framework;
pub use karma_plugins as plugins;
pub use karma_runtime as runtime;
pub use karma_store as store;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use karma::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use karma_runtime::{KarmaConfig, KarmaRuntime, LoggingBuilder, SpanEvents};

    // Handler chain - for custom handlers
    pub use karma_framework::{
        Dispatched, Dispatcher, Handler, HandlerService, MessageContext, Outcome, Request,
        handler_fn,
    };

    // Built-in handlers
    pub use karma_plugins::{Echo, PlusPlus, Snark};

    // Domain types and collaborator traits
    pub use karma_core::{
        BoxedTransport, Clock, Directory, InboundMessage, RosterEntry, ScoreStore,
        TemplatePicker, Transport, TransportError, TransportResult, User,
    };
    pub use karma_store::SqliteStore;
}
