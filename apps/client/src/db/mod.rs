//! SQLite-backed persistence for sessions and flashcard sets.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;
