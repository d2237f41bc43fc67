//! SQLite implementation of the session and flashcard stores.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use studycards_core::{Flashcard, FlashcardSet, FlashcardSetWithMeta};

use crate::error::{ClientError, Result};
use crate::session::SessionStore;
use crate::store::FlashcardStore;

impl From<rusqlite::Error> for ClientError {
    fn from(err: rusqlite::Error) -> Self {
        ClientError::StorageUnavailable(err.to_string())
    }
}

fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| ClientError::StorageUnavailable(format!("timestamp out of range: {ms}")))
}

/// Durable on-device store. One instance per process; the connection is
/// mutex-guarded so writes to a key commit before the next read on it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database at `path`, creating it if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(super::schema::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn load_cards(conn: &Connection, set_id: &str) -> Result<Vec<Flashcard>> {
        let mut stmt = conn.prepare(
            "SELECT id, set_id, front, back, created_at_ms FROM cards
             WHERE set_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![set_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut cards = Vec::new();
        for row in rows {
            let (id, set_id, front, back, created_at_ms) = row?;
            cards.push(Flashcard {
                id,
                set_id,
                front,
                back,
                created_at: millis_to_datetime(created_at_ms)?,
            });
        }
        Ok(cards)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[async_trait]
impl FlashcardStore for SqliteStore {
    async fn save(&self, set: &FlashcardSetWithMeta) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO sets (id, topic, created_at_ms, is_local_only)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 topic = excluded.topic,
                 created_at_ms = excluded.created_at_ms,
                 is_local_only = excluded.is_local_only",
            params![
                set.set.id,
                set.set.topic,
                set.set.created_at.timestamp_millis(),
                set.is_local_only as i64,
            ],
        )?;

        // Full replacement: the card sequence is rewritten on every save.
        tx.execute("DELETE FROM cards WHERE set_id = ?1", params![set.set.id])?;
        for (position, card) in set.set.flashcards.iter().enumerate() {
            tx.execute(
                "INSERT INTO cards (id, set_id, front, back, created_at_ms, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    card.id,
                    set.set.id,
                    card.front,
                    card.back,
                    card.created_at.timestamp_millis(),
                    position as i64,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<FlashcardSetWithMeta>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, topic, created_at_ms, is_local_only FROM sets")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut sets = Vec::new();
        for row in rows {
            let (id, topic, created_at_ms, is_local_only) = row?;
            let flashcards = Self::load_cards(&conn, &id)?;
            sets.push(FlashcardSetWithMeta {
                set: FlashcardSet {
                    id,
                    topic,
                    flashcards,
                    created_at: millis_to_datetime(created_at_ms)?,
                },
                is_local_only: is_local_only != 0,
            });
        }
        Ok(sets)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FlashcardSetWithMeta>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, topic, created_at_ms, is_local_only FROM sets WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, topic, created_at_ms, is_local_only)) = row else {
            return Ok(None);
        };
        let flashcards = Self::load_cards(&conn, &id)?;
        Ok(Some(FlashcardSetWithMeta {
            set: FlashcardSet {
                id,
                topic,
                flashcards,
                created_at: millis_to_datetime(created_at_ms)?,
            },
            is_local_only: is_local_only != 0,
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sets WHERE id = ?1", params![id])?;
        Ok(())
    }
}
