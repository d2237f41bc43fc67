//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Re-export shared types from studycards-core
pub use studycards_core::types::{
    AuthResponse, Flashcard, FlashcardSet, OAuthPlatform, OAuthProvider,
};

// === Database Entity Types ===

/// Bearer session minted after a completed OAuth handshake
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub token: String,
    pub provider: String,
    pub created_at_ms: i64,
}

/// Flashcard set row
#[derive(Debug, Clone, FromRow)]
pub struct DbSet {
    pub id: String,
    pub topic: String,
    pub created_at_ms: i64,
}

/// Flashcard row
#[derive(Debug, Clone, FromRow)]
pub struct DbCard {
    pub id: String,
    pub set_id: String,
    pub front: String,
    pub back: String,
    pub created_at_ms: i64,
    pub position: i64,
}

impl DbCard {
    pub fn to_api_card(&self) -> Flashcard {
        Flashcard {
            id: self.id.clone(),
            set_id: self.set_id.clone(),
            front: self.front.clone(),
            back: self.back.clone(),
            created_at: millis_to_datetime(self.created_at_ms),
        }
    }
}

/// Clamp out-of-range stored millis rather than failing the row.
pub fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

// === API Request/Response Types ===

#[derive(Debug, Deserialize)]
pub struct StartLoginRequest {
    pub provider: OAuthProvider,
    pub platform: OAuthPlatform,
}

#[derive(Debug, Serialize)]
pub struct StartLoginResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    pub provider: OAuthProvider,
    /// Authorization code from the provider redirect. Exchange is
    /// opaque to this minimal server; any non-empty code is accepted.
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SetListResponse {
    pub sets: Vec<FlashcardSet>,
}

#[derive(Debug, Serialize)]
pub struct RandomizedResponse {
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub count: u32,
}
