//! Persistence interfaces.
//!
//! Two logical tables back the bot: `users` (read through [`Directory`]) and
//! `scores` (read and written through [`ScoreStore`]). Every method maps to a
//! single statement against the store, so the store's own statement-level
//! atomicity is the only isolation the callers rely on.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{ScoreRecord, User};

/// Which user name column a directory search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// The `@`-handle.
    Mention,
    /// The free-text display name.
    Display,
}

/// How a directory search compares the fragment to the column.
///
/// All kinds are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
}

/// Read access to the user directory.
#[async_trait]
pub trait Directory: Send + Sync + 'static {
    /// Looks a user up by exact display name.
    async fn find_by_display_name(&self, name: &str) -> StoreResult<Option<User>>;

    /// Looks a user up by exact mention name.
    async fn find_by_mention_name(&self, mention_name: &str) -> StoreResult<Option<User>>;

    /// Looks a user up by id.
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Looks a user up by transport identity.
    async fn find_by_jid(&self, jid: &str) -> StoreResult<Option<User>>;

    /// Returns every user whose `field` matches `fragment` under `kind`.
    ///
    /// The fragment is taken literally: implementations must not interpret
    /// wildcard characters in it.
    async fn search(
        &self,
        field: NameField,
        kind: MatchKind,
        fragment: &str,
    ) -> StoreResult<Vec<User>>;
}

/// Read/write access to score rows.
#[async_trait]
pub trait ScoreStore: Send + Sync + 'static {
    /// Creates the row for `user_id` if it does not exist; a no-op otherwise.
    async fn ensure_record(&self, user_id: i64) -> StoreResult<()>;

    /// Claims the award slot for `user_id` if its cooldown has elapsed.
    ///
    /// In one conditional statement: when `last_award_epoch` is unset or at
    /// most `now - window_secs`, sets it to `now`, resets `award_tries` to 0
    /// and returns `true`. Otherwise leaves the row untouched and returns
    /// `false`.
    async fn claim_award_slot(&self, user_id: i64, now: i64, window_secs: i64)
    -> StoreResult<bool>;

    /// Increments `award_tries` and returns the value it held before.
    async fn record_throttled_attempt(&self, user_id: i64) -> StoreResult<u32>;

    /// Applies `score += delta` as a single relative update.
    async fn adjust_score(&self, user_id: i64, delta: i64) -> StoreResult<()>;

    /// Point read of a score row.
    async fn score_record(&self, user_id: i64) -> StoreResult<Option<ScoreRecord>>;
}
