//! Karma Runtime - wiring layer for the karma chat bot.
//!
//! This crate provides:
//! - Configuration loading and validation (`KarmaConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `SpanEvents`)
//! - The message loop (`KarmaRuntime`) that feeds inbound messages from a
//!   transport into the dispatcher
//!
//! ```ignore
//! use karma_runtime::KarmaRuntime;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = KarmaRuntime::builder()
//!         .config_file("karma.toml")
//!         .build(transport)?;
//!
//!     let (tx, rx) = mpsc::channel(64);
//!     // hand `tx` to the transport's receive side
//!
//!     // Run until Ctrl+C or until the transport drops `tx`
//!     runtime.run(rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, KarmaConfig, LoggingConfig, PluginsConfig,
    StoreConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{KarmaRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
