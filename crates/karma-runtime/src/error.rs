//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use karma_core::StoreError;

/// Errors that can occur while assembling or running the bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be opened or seeded.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
