//! SQLite database operations

use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use uuid::Uuid;

use studycards_core::{Flashcard, FlashcardSet, OAuthProvider};

use crate::error::Result;
use crate::models::{millis_to_datetime, DbCard, DbSet, Session};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sets (
    id TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    set_id TEXT NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL,
    position INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cards_set ON cards(set_id, position);
"#;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite and create the connection pool.
    ///
    /// A single connection keeps this minimal server simple and makes
    /// `sqlite::memory:` safe (every pooled connection would otherwise
    /// see its own empty database).
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// Apply the schema, creating tables if missing
    pub async fn apply_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === Sessions ===

    /// Mint a new bearer session for the given provider
    pub async fn create_session(&self, provider: OAuthProvider) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            provider: provider.as_str().to_string(),
            created_at_ms: Utc::now().timestamp_millis(),
        };

        sqlx::query("INSERT INTO sessions (token, provider, created_at_ms) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(&session.provider)
            .bind(session.created_at_ms)
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    /// Look up a session by bearer token
    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, provider, created_at_ms FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Revoke a session; returns false if the token was unknown
    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // === Flashcard sets ===

    /// Upsert a set and its full card sequence
    pub async fn upsert_set(&self, set: &FlashcardSet) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sets (id, topic, created_at_ms) VALUES ($1, $2, $3)
             ON CONFLICT(id) DO UPDATE SET
                 topic = excluded.topic,
                 created_at_ms = excluded.created_at_ms",
        )
        .bind(&set.id)
        .bind(&set.topic)
        .bind(set.created_at.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cards WHERE set_id = $1")
            .bind(&set.id)
            .execute(&mut *tx)
            .await?;

        for (position, card) in set.flashcards.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cards (id, set_id, front, back, created_at_ms, position)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&card.id)
            .bind(&set.id)
            .bind(&card.front)
            .bind(&card.back)
            .bind(card.created_at.timestamp_millis())
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// All sets with cards, newest first (ties by id ascending)
    pub async fn get_all_sets(&self) -> Result<Vec<FlashcardSet>> {
        let rows = sqlx::query_as::<_, DbSet>(
            "SELECT id, topic, created_at_ms FROM sets
             ORDER BY created_at_ms DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut sets = Vec::with_capacity(rows.len());
        for row in rows {
            let flashcards = self.get_cards(&row.id).await?;
            sets.push(FlashcardSet {
                id: row.id,
                topic: row.topic,
                flashcards,
                created_at: millis_to_datetime(row.created_at_ms),
            });
        }
        Ok(sets)
    }

    /// Single set with cards
    pub async fn get_set(&self, id: &str) -> Result<Option<FlashcardSet>> {
        let row = sqlx::query_as::<_, DbSet>(
            "SELECT id, topic, created_at_ms FROM sets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let flashcards = self.get_cards(&row.id).await?;
        Ok(Some(FlashcardSet {
            id: row.id,
            topic: row.topic,
            flashcards,
            created_at: millis_to_datetime(row.created_at_ms),
        }))
    }

    /// Delete a set; returns false if it did not exist
    pub async fn delete_set(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of stored sets
    pub async fn count_sets(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM sets")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    async fn get_cards(&self, set_id: &str) -> Result<Vec<Flashcard>> {
        let rows = sqlx::query_as::<_, DbCard>(
            "SELECT id, set_id, front, back, created_at_ms, position
             FROM cards WHERE set_id = $1 ORDER BY position",
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(DbCard::to_api_card).collect())
    }
}
