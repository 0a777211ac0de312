//! Award pipeline errors.
//!
//! The `Display` of every variant is the exact text replied into the channel.

use thiserror::Error;

use karma_core::StoreError;

/// Why an award did not happen.
#[derive(Debug, Error)]
pub enum AwardError {
    /// The sender is still inside their cooldown window.
    #[error("{0}")]
    Throttled(&'static str),

    /// The target resolved to the sender.
    #[error("Sorry @{mention_name}, you can't {action} points.")]
    SelfAward {
        mention_name: String,
        action: &'static str,
    },

    /// No tier produced exactly one user.
    #[error("Sorry, I don't see a user like `{name}`.")]
    NameNotFound { name: String },

    /// A persistence failure mid-pipeline.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AwardResult<T> = Result<T, AwardError>;
