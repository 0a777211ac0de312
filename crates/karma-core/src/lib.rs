//! # Karma Core
//!
//! Foundation layer of the karma chat bot.
//!
//! This crate owns the vocabulary every other layer speaks:
//!
//! - **Domain types**: [`User`], [`ScoreRecord`], [`InboundMessage`], [`RosterEntry`]
//! - **Collaborator interfaces**: [`Transport`] for outbound replies,
//!   [`Directory`] for identity lookups and [`ScoreStore`] for score rows
//! - **Injectable effects**: [`Clock`] and [`TemplatePicker`], so time and
//!   randomness can be pinned in tests
//! - **Errors**: [`StoreError`] and [`TransportError`]
//!
//! ```text
//! ┌───────────┐  InboundMessage  ┌──────────────┐   Directory / ScoreStore   ┌─────────┐
//! │ Transport │─────────────────▶│  Dispatcher  │───────────────────────────▶│  Store  │
//! │           │◀─────────────────│  + handlers  │                            │         │
//! └───────────┘     respond      └──────────────┘                            └─────────┘
//! ```

pub mod clock;
pub mod error;
pub mod jid;
pub mod model;
pub mod random;
pub mod store;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult, TransportError, TransportResult};
pub use jid::{jid_to_organization_id, jid_to_user_id};
pub use model::{InboundMessage, RosterEntry, ScoreRecord, User};
pub use random::{FixedPicker, RandomPicker, TemplatePicker, choose};
pub use store::{Directory, MatchKind, NameField, ScoreStore};
pub use transport::{BoxedTransport, RecordingTransport, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::clock::Clock;
    pub use super::error::{StoreError, StoreResult, TransportError, TransportResult};
    pub use super::model::{InboundMessage, ScoreRecord, User};
    pub use super::random::TemplatePicker;
    pub use super::store::{Directory, ScoreStore};
    pub use super::transport::Transport;
}
