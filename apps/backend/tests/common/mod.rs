//! Common test utilities and fixtures for integration tests.
//!
//! Tests run against an in-memory SQLite database, so no external
//! services are required.

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use uuid::Uuid;

use studycards_backend::db::Database;
use studycards_backend::error::{ApiError, Result};
use studycards_backend::models::OAuthProvider;
use studycards_backend::services::generate::FlashcardGenerator;
use studycards_backend::{build_router, AppState};
use studycards_core::{Flashcard, FlashcardSet};

/// Generator stub that builds deterministic sets without any upstream
/// service. Counts calls so tests can assert delegation happened.
pub struct StubGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl FlashcardGenerator for StubGenerator {
    async fn generate(&self, topic: &str, count: u32) -> Result<FlashcardSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(ApiError::Upstream("generator unreachable".to_string()));
        }

        let set_id = Uuid::new_v4().to_string();
        let flashcards = (0..count)
            .map(|i| Flashcard {
                id: Uuid::new_v4().to_string(),
                set_id: set_id.clone(),
                front: format!("{} question {}", topic, i + 1),
                back: format!("{} answer {}", topic, i + 1),
                created_at: Utc::now(),
            })
            .collect();

        Ok(FlashcardSet {
            id: set_id,
            topic: topic.to_string(),
            flashcards,
            created_at: Utc::now(),
        })
    }
}

/// Test context containing the database and a ready-to-serve router
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
}

impl TestContext {
    /// Create a context backed by a fresh in-memory database.
    pub async fn new() -> Self {
        Self::with_generator(Arc::new(StubGenerator::new())).await
    }

    /// Create a context with a custom generator implementation.
    pub async fn with_generator(generator: Arc<dyn FlashcardGenerator>) -> Self {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");

        db.apply_schema().await.expect("Failed to apply schema");

        let db = Arc::new(db);

        let state = AppState {
            db: db.clone(),
            generator,
        };

        let app = build_router(state);

        Self { db, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Mint a session directly in the database and return its token.
    pub async fn create_session(&self) -> String {
        let session = self
            .db
            .create_session(OAuthProvider::Google)
            .await
            .expect("Failed to create test session");
        session.token
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }
}
