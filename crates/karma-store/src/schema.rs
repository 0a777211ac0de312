//! Table definitions.

use rusqlite::Connection;

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY,
    jid          TEXT NOT NULL,
    name         TEXT NOT NULL,
    mention_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scores (
    user_id     INTEGER PRIMARY KEY,
    score       INTEGER NOT NULL DEFAULT 0,
    last_award  INTEGER,
    award_tries INTEGER NOT NULL DEFAULT 0
);
";

/// Creates any missing tables.
pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
