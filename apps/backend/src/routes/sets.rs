//! Flashcard set endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rand::seq::SliceRandom;

use studycards_core::FlashcardSet;

use crate::error::{ApiError, Result};
use crate::models::{RandomizedResponse, SetListResponse};
use crate::AppState;

/// GET /api/v1/flashcards/sets
pub async fn list(State(state): State<AppState>) -> Result<Json<SetListResponse>> {
    let sets = state.db.get_all_sets().await?;
    Ok(Json(SetListResponse { sets }))
}

/// GET /api/v1/flashcards/sets/{id}
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlashcardSet>> {
    let set = state
        .db
        .get_set(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("set {}", id)))?;
    Ok(Json(set))
}

/// POST /api/v1/flashcards/sets
pub async fn create(
    State(state): State<AppState>,
    Json(set): Json<FlashcardSet>,
) -> Result<(StatusCode, Json<FlashcardSet>)> {
    if set.id.trim().is_empty() {
        return Err(ApiError::BadRequest("Set id must not be empty".to_string()));
    }
    if set.topic.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Set topic must not be empty".to_string(),
        ));
    }
    for card in &set.flashcards {
        if card.set_id != set.id {
            return Err(ApiError::BadRequest(format!(
                "Card {} belongs to set {}, not {}",
                card.id, card.set_id, set.id
            )));
        }
    }

    state.db.upsert_set(&set).await?;

    let stored = state
        .db
        .get_set(&set.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Set vanished after upsert".to_string()))?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE /api/v1/flashcards/sets/{id}
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let deleted = state.db.delete_set(&id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("set {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/flashcards/sets/{id}/randomized
pub async fn randomized(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RandomizedResponse>> {
    let set = state
        .db
        .get_set(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("set {}", id)))?;

    let mut flashcards = set.flashcards;
    flashcards.shuffle(&mut rand::thread_rng());

    Ok(Json(RandomizedResponse { flashcards }))
}
