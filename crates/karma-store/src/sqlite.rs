use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use karma_core::{
    Directory, MatchKind, NameField, RosterEntry, ScoreRecord, ScoreStore, StoreError,
    StoreResult, User,
};

use crate::schema;

const USER_COLUMNS: &str = "id, jid, name, mention_name";

/// A [`Directory`] and [`ScoreStore`] over one SQLite connection.
///
/// Cloning is cheap and every clone shares the same connection. Statements
/// are serialised by the connection lock; no lock is held across an `await`.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and creates missing tables.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(StoreError::database)?;
        }

        let conn = Connection::open(path).map_err(StoreError::database)?;
        info!(path = %path.display(), "Opened karma database");
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::database)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        schema::init(&conn).map_err(StoreError::database)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `op` against the connection on the blocking thread pool.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
        .map_err(StoreError::database)
    }

    /// Inserts or replaces the `users` rows for a roster snapshot.
    ///
    /// Entries whose JID carries no numeric user id are skipped. Returns the
    /// number of rows written.
    pub async fn refresh_roster(&self, roster: &[RosterEntry]) -> StoreResult<usize> {
        let users: Vec<User> = roster
            .iter()
            .filter_map(|entry| {
                let user = entry.to_user();
                if user.is_none() {
                    debug!(jid = %entry.jid, "Skipping roster entry without a numeric user id");
                }
                user
            })
            .collect();
        let count = users.len();

        self.run(move |conn| {
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO users (id, jid, name, mention_name) \
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for user in &users {
                    stmt.execute(params![user.id, user.jid, user.display_name, user.mention_name])?;
                }
            }
            tx.commit()
        })
        .await?;

        debug!(count, "Roster refreshed");
        Ok(count)
    }

    async fn find_user(&self, column: &'static str, value: Value) -> StoreResult<Option<User>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1 ORDER BY id LIMIT 1"),
                [value],
                user_from_row,
            )
            .optional()
        })
        .await
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        jid: row.get(1)?,
        display_name: row.get(2)?,
        mention_name: row.get(3)?,
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
    let tries: i64 = row.get(3)?;
    Ok(ScoreRecord {
        user_id: row.get(0)?,
        score: row.get(1)?,
        last_award_epoch: row.get(2)?,
        award_tries: tries.max(0) as u32,
    })
}

/// Escapes `LIKE` wildcards so the fragment matches literally under `ESCAPE '\'`.
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl Directory for SqliteStore {
    async fn find_by_display_name(&self, name: &str) -> StoreResult<Option<User>> {
        self.find_user("name", Value::from(name.to_string())).await
    }

    async fn find_by_mention_name(&self, mention_name: &str) -> StoreResult<Option<User>> {
        self.find_user("mention_name", Value::from(mention_name.to_string()))
            .await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.find_user("id", Value::from(id)).await
    }

    async fn find_by_jid(&self, jid: &str) -> StoreResult<Option<User>> {
        self.find_user("jid", Value::from(jid.to_string())).await
    }

    async fn search(
        &self,
        field: NameField,
        kind: MatchKind,
        fragment: &str,
    ) -> StoreResult<Vec<User>> {
        let column = match field {
            NameField::Mention => "mention_name",
            NameField::Display => "name",
        };
        let escaped = escape_like(fragment);
        let pattern = match kind {
            MatchKind::Exact => escaped,
            MatchKind::Prefix => format!("{escaped}%"),
            MatchKind::Substring => format!("%{escaped}%"),
        };

        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE {column} LIKE ?1 ESCAPE '\\' ORDER BY id"
            ))?;
            let users = stmt
                .query_map([pattern], user_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
    }
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn ensure_record(&self, user_id: i64) -> StoreResult<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO scores (user_id) VALUES (?1)",
                [user_id],
            )
            .map(|_| ())
        })
        .await
    }

    async fn claim_award_slot(
        &self,
        user_id: i64,
        now: i64,
        window_secs: i64,
    ) -> StoreResult<bool> {
        let changed = self
            .run(move |conn| {
                conn.execute(
                    "UPDATE scores SET award_tries = 0, last_award = ?2 \
                     WHERE user_id = ?1 AND (last_award IS NULL OR last_award <= ?2 - ?3)",
                    params![user_id, now, window_secs],
                )
            })
            .await?;
        Ok(changed == 1)
    }

    async fn record_throttled_attempt(&self, user_id: i64) -> StoreResult<u32> {
        let previous: Option<i64> = self
            .run(move |conn| {
                conn.query_row(
                    "UPDATE scores SET award_tries = award_tries + 1 \
                     WHERE user_id = ?1 RETURNING award_tries - 1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        previous
            .map(|tries| tries.max(0) as u32)
            .ok_or(StoreError::MissingRecord { user_id })
    }

    async fn adjust_score(&self, user_id: i64, delta: i64) -> StoreResult<()> {
        let changed = self
            .run(move |conn| {
                conn.execute(
                    "UPDATE scores SET score = score + ?2 WHERE user_id = ?1",
                    params![user_id, delta],
                )
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::MissingRecord { user_id });
        }
        Ok(())
    }

    async fn score_record(&self, user_id: i64) -> StoreResult<Option<ScoreRecord>> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT user_id, score, last_award, award_tries FROM scores WHERE user_id = ?1",
                [user_id],
                score_from_row,
            )
            .optional()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .refresh_roster(&[
                RosterEntry::new("1_10@chat.example.com", "Alice Liddell", "alice"),
                RosterEntry::new("1_20@chat.example.com", "Bob Stone", "bob_x"),
                RosterEntry::new("1_30@chat.example.com", "Bobax Quill", "bobax"),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_refresh_roster_skips_unparseable_jids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let written = store
            .refresh_roster(&[
                RosterEntry::new("1_10@chat.example.com", "Alice", "alice"),
                RosterEntry::new("guest@chat.example.com", "Guest", "guest"),
            ])
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert!(store.find_by_mention_name("guest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_roster_replaces_existing_rows() {
        let store = seeded_store().await;
        store
            .refresh_roster(&[RosterEntry::new("1_10@chat.example.com", "Alice L.", "ali")])
            .await
            .unwrap();

        let alice = store.find_by_id(10).await.unwrap().unwrap();
        assert_eq!(alice.display_name, "Alice L.");
        assert_eq!(alice.mention_name, "ali");
    }

    #[tokio::test]
    async fn test_point_lookups() {
        let store = seeded_store().await;

        let by_name = store.find_by_display_name("Alice Liddell").await.unwrap();
        assert_eq!(by_name.map(|u| u.id), Some(10));

        let by_mention = store.find_by_mention_name("bobax").await.unwrap();
        assert_eq!(by_mention.map(|u| u.id), Some(30));

        let by_jid = store.find_by_jid("1_20@chat.example.com").await.unwrap();
        assert_eq!(by_jid.map(|u| u.mention_name), Some("bob_x".to_string()));

        assert!(store.find_by_display_name("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = seeded_store().await;

        let exact = store
            .search(NameField::Mention, MatchKind::Exact, "ALICE")
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let prefix = store
            .search(NameField::Display, MatchKind::Prefix, "bob")
            .await
            .unwrap();
        assert_eq!(prefix.iter().map(|u| u.id).collect::<Vec<_>>(), vec![20, 30]);

        let substring = store
            .search(NameField::Display, MatchKind::Substring, "LIDD")
            .await
            .unwrap();
        assert_eq!(substring.len(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let store = seeded_store().await;

        // "_" would match the "a" in "bobax" if it were a wildcard
        let hits = store
            .search(NameField::Mention, MatchKind::Exact, "bob_x")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 20);

        let none = store
            .search(NameField::Mention, MatchKind::Substring, "%")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_record_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_record(7).await.unwrap();
        assert_eq!(
            store.score_record(7).await.unwrap(),
            Some(ScoreRecord::new(7))
        );

        store.adjust_score(7, 3).await.unwrap();
        assert!(store.claim_award_slot(7, 100, 10).await.unwrap());
        store.record_throttled_attempt(7).await.unwrap();
        let before = store.score_record(7).await.unwrap();

        store.ensure_record(7).await.unwrap();
        assert_eq!(store.score_record(7).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_claim_award_slot_honours_window() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_record(1).await.unwrap();

        assert!(store.claim_award_slot(1, 0, 10).await.unwrap());
        assert!(!store.claim_award_slot(1, 5, 10).await.unwrap());
        assert!(!store.claim_award_slot(1, 9, 10).await.unwrap());

        let record = store.score_record(1).await.unwrap().unwrap();
        assert_eq!(record.last_award_epoch, Some(0));

        assert!(store.claim_award_slot(1, 10, 10).await.unwrap());
        let record = store.score_record(1).await.unwrap().unwrap();
        assert_eq!(record.last_award_epoch, Some(10));
    }

    #[tokio::test]
    async fn test_throttled_attempts_count_up_and_reset() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_record(1).await.unwrap();
        assert!(store.claim_award_slot(1, 0, 10).await.unwrap());

        assert_eq!(store.record_throttled_attempt(1).await.unwrap(), 0);
        assert_eq!(store.record_throttled_attempt(1).await.unwrap(), 1);
        assert_eq!(store.record_throttled_attempt(1).await.unwrap(), 2);
        assert_eq!(store.score_record(1).await.unwrap().unwrap().award_tries, 3);

        assert!(store.claim_award_slot(1, 11, 10).await.unwrap());
        assert_eq!(store.score_record(1).await.unwrap().unwrap().award_tries, 0);
    }

    #[tokio::test]
    async fn test_updates_without_row_fail() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert!(matches!(
            store.adjust_score(99, 1).await,
            Err(StoreError::MissingRecord { user_id: 99 })
        ));
        assert!(matches!(
            store.record_throttled_attempt(99).await,
            Err(StoreError::MissingRecord { user_id: 99 })
        ));
        assert!(!store.claim_award_slot(99, 0, 10).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_grant_one_slot() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_record(1).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.claim_award_slot(1, 1_000, 10).await.unwrap()
            }));
        }

        let mut granted = 0;
        for task in tasks {
            if task.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("karma.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.ensure_record(5).await.unwrap();
            store.adjust_score(5, -2).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let record = reopened.score_record(5).await.unwrap().unwrap();
        assert_eq!(record.score, -2);
    }
}
