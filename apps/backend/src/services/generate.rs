//! Flashcard generation backed by an external AI service

use async_trait::async_trait;

use studycards_core::FlashcardSet;

use crate::error::{ApiError, Result};
use crate::models::GenerateRequest;

/// Produces a flashcard set for a topic. The HTTP implementation talks
/// to the configured upstream service; tests inject a stub.
#[async_trait]
pub trait FlashcardGenerator: Send + Sync {
    async fn generate(&self, topic: &str, count: u32) -> Result<FlashcardSet>;
}

/// Generator that posts to the upstream service at `GENERATOR_URL`
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerator {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FlashcardGenerator for HttpGenerator {
    async fn generate(&self, topic: &str, count: u32) -> Result<FlashcardSet> {
        let url = format!("{}/generate", self.base_url);
        let body = GenerateRequest {
            topic: topic.to_string(),
            count,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("generator unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "generator returned {}",
                response.status()
            )));
        }

        let set = response
            .json::<FlashcardSet>()
            .await
            .map_err(|e| ApiError::Upstream(format!("invalid generator response: {}", e)))?;

        Ok(set)
    }
}

/// Placeholder used when no `GENERATOR_URL` is configured
pub struct UnconfiguredGenerator;

#[async_trait]
impl FlashcardGenerator for UnconfiguredGenerator {
    async fn generate(&self, _topic: &str, _count: u32) -> Result<FlashcardSet> {
        Err(ApiError::Upstream(
            "No generator service configured".to_string(),
        ))
    }
}
