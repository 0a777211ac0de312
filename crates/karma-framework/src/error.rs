//! Error types for the framework layer.

use thiserror::Error;

use karma_core::StoreError;

/// Why a message could not be turned into a [`Request`](crate::Request).
///
/// The dispatcher never surfaces these to the channel: a message whose
/// identities cannot be resolved is dropped without a reply.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// A directory lookup failed.
    #[error("identity lookup failed: {0}")]
    Lookup(#[from] StoreError),

    /// The sender's display name has no directory entry.
    #[error("sender '{name}' is not in the directory")]
    UnknownSender {
        /// The display name the transport reported.
        name: String,
    },
}
