//! Domain types.

use serde::{Deserialize, Serialize};

use crate::jid::jid_to_user_id;

/// A directory entry for one chat participant.
///
/// Users are populated by roster synchronisation and are read-only from the
/// bot's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable numeric key.
    pub id: i64,
    /// Transport identity.
    pub jid: String,
    /// Free-text display name.
    pub display_name: String,
    /// Short handle used for `@` addressing.
    pub mention_name: String,
}

/// Per-user reputation state.
///
/// Created lazily the first time a user gives or receives an award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user_id: i64,
    pub score: i64,
    /// Epoch seconds of the last accepted award this user gave; `None` until
    /// the first one.
    pub last_award_epoch: Option<i64>,
    /// Consecutive throttled attempts since the last accepted award.
    pub award_tries: u32,
}

impl ScoreRecord {
    /// A freshly created row.
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            score: 0,
            last_award_epoch: None,
            award_tries: 0,
        }
    }
}

/// A chat message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The channel (room) the message was posted in.
    pub channel: String,
    /// Display name of the sender.
    pub from: String,
    /// Message text exactly as received.
    pub text: String,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        from: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            from: from.into(),
            text: text.into(),
        }
    }
}

/// One roster item as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub jid: String,
    pub name: String,
    pub mention_name: String,
}

impl RosterEntry {
    pub fn new(
        jid: impl Into<String>,
        name: impl Into<String>,
        mention_name: impl Into<String>,
    ) -> Self {
        Self {
            jid: jid.into(),
            name: name.into(),
            mention_name: mention_name.into(),
        }
    }

    /// Converts the entry into a [`User`], or `None` when the JID carries no
    /// numeric user id.
    pub fn to_user(&self) -> Option<User> {
        Some(User {
            id: jid_to_user_id(&self.jid)?,
            jid: self.jid.clone(),
            display_name: self.name.clone(),
            mention_name: self.mention_name.clone(),
        })
    }
}
