//! SQLite storage for the karma chat bot.
//!
//! [`SqliteStore`] implements both [`Directory`](karma_core::Directory) and
//! [`ScoreStore`](karma_core::ScoreStore) over a single connection. Each
//! trait method runs exactly one SQL statement on a blocking worker thread,
//! so the async callers never stall the scheduler.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;
