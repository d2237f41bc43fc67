//! Flashcard generation endpoint

use axum::{extract::State, http::StatusCode, Json};

use studycards_core::FlashcardSet;

use crate::error::{ApiError, Result};
use crate::models::GenerateRequest;
use crate::AppState;

const MAX_CARDS_PER_REQUEST: u32 = 100;

/// POST /api/v1/generate
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<FlashcardSet>)> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("Topic must not be empty".to_string()));
    }
    if payload.count == 0 || payload.count > MAX_CARDS_PER_REQUEST {
        return Err(ApiError::BadRequest(format!(
            "Count must be between 1 and {}",
            MAX_CARDS_PER_REQUEST
        )));
    }

    let set = state
        .generator
        .generate(&payload.topic, payload.count)
        .await?;

    state.db.upsert_set(&set).await?;

    tracing::info!(topic = %set.topic, cards = set.flashcards.len(), "Generated flashcard set");

    Ok((StatusCode::CREATED, Json(set)))
}
