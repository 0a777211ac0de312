//! Error types shared by the karma crates.
//!
//! Handler-level errors (such as the award pipeline's rejections) live next to
//! the handlers that raise them; this module only covers the two external
//! collaborators every layer talks to.

use thiserror::Error;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by a [`Directory`](crate::Directory) or
/// [`ScoreStore`](crate::ScoreStore) implementation.
///
/// The `Display` output is user-facing: the award pipeline relays it verbatim
/// as the chat reply when a persistence step fails.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing database rejected or failed a statement.
    #[error("database error: {0}")]
    Database(String),

    /// The blocking task that ran the statement panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),

    /// A score row expected to exist was not found.
    #[error("no score record for user {user_id}")]
    MissingRecord {
        /// The user whose row is missing.
        user_id: i64,
    },
}

impl StoreError {
    /// Creates a database error from any displayable cause.
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while sending a reply.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The transport has no live connection.
    #[error("transport is not connected")]
    NotConnected,

    /// The reply could not be delivered.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
