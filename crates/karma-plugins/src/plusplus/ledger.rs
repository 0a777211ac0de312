//! Score row bookkeeping.

use karma_core::{ScoreStore, StoreError, StoreResult};

/// Applies `delta` to `user_id`'s score and returns the new score.
///
/// Creates the row first if needed, then does one relative update and reads
/// the row back.
pub async fn apply_award(store: &dyn ScoreStore, user_id: i64, delta: i64) -> StoreResult<i64> {
    store.ensure_record(user_id).await?;
    store.adjust_score(user_id, delta).await?;
    store
        .score_record(user_id)
        .await?
        .map(|record| record.score)
        .ok_or(StoreError::MissingRecord { user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_store::SqliteStore;

    #[tokio::test]
    async fn test_apply_award_creates_and_accumulates() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(apply_award(&store, 7, 1).await.unwrap(), 1);
        assert_eq!(apply_award(&store, 7, 1).await.unwrap(), 2);
        assert_eq!(apply_award(&store, 7, -1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ensure_record_keeps_existing_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        apply_award(&store, 3, -1).await.unwrap();
        store.ensure_record(3).await.unwrap();
        store.claim_award_slot(3, 50, 10).await.unwrap();
        let before = store.score_record(3).await.unwrap().unwrap();

        store.ensure_record(3).await.unwrap();
        assert_eq!(store.score_record(3).await.unwrap().unwrap(), before);
        assert_eq!(before.score, -1);
        assert_eq!(before.last_award_epoch, Some(50));
    }
}
