//! Per-sender award cooldown.

use tracing::debug;

use karma_core::ScoreStore;

use super::messages::throttle_message;
use crate::error::{AwardError, AwardResult};

/// Default cooldown between two accepted awards from one sender, in seconds.
pub const THROTTLE_LIMIT: i64 = 10;

/// Admits at most one award per sender per window.
///
/// The check and the slot update happen in one conditional store statement,
/// so two racing attempts from the same sender cannot both get through.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleGate {
    window_secs: i64,
}

impl ThrottleGate {
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Claims the award slot for `user_id` at `now`.
    ///
    /// The sender's score row must already exist. When throttled, the
    /// attempt counter is bumped and the matching escalation message is
    /// returned as [`AwardError::Throttled`].
    pub async fn admit(&self, store: &dyn ScoreStore, user_id: i64, now: i64) -> AwardResult<()> {
        if store.claim_award_slot(user_id, now, self.window_secs).await? {
            return Ok(());
        }

        let tries = store.record_throttled_attempt(user_id).await?;
        debug!(user_id, tries, "Award throttled");
        Err(AwardError::Throttled(throttle_message(tries)))
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::new(THROTTLE_LIMIT)
    }
}
