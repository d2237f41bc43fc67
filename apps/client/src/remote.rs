//! HTTP client for the remote auth and flashcard services.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use studycards_core::{Flashcard, FlashcardSet, OAuthPlatform, OAuthProvider};

use crate::error::{ClientError, Result};

// === API Request/Response Types ===

#[derive(Debug, Serialize)]
struct StartLoginRequest {
    provider: OAuthProvider,
    platform: OAuthPlatform,
}

#[derive(Debug, Deserialize)]
struct StartLoginResponse {
    auth_url: String,
}

#[derive(Debug, Deserialize)]
struct SetListResponse {
    sets: Vec<FlashcardSet>,
}

#[derive(Debug, Deserialize)]
struct RandomizedResponse {
    flashcards: Vec<Flashcard>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    topic: &'a str,
    count: u32,
}

/// Remote service boundary used by the OAuth flows and the sync
/// repository. Implemented over HTTP in production and by fakes in
/// tests.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Ask the auth service for a provider authorization URL.
    async fn start_login(
        &self,
        provider: OAuthProvider,
        platform: OAuthPlatform,
    ) -> Result<String>;

    async fn list_sets(&self, token: &str) -> Result<Vec<FlashcardSet>>;
    async fn get_set(&self, token: &str, id: &str) -> Result<Option<FlashcardSet>>;
    /// Upsert a set remotely. A successful return is the remote's
    /// acknowledgement of the set identifier.
    async fn create_set(&self, token: &str, set: &FlashcardSet) -> Result<FlashcardSet>;
    /// Delete a remote set. Deleting an already-absent set succeeds.
    async fn delete_set(&self, token: &str, id: &str) -> Result<()>;
    async fn get_randomized(&self, token: &str, id: &str) -> Result<Vec<Flashcard>>;
    /// Trigger the external AI generation service.
    async fn generate(&self, token: &str, topic: &str, count: u32) -> Result<FlashcardSet>;
}

struct RemoteClientInner {
    client: Client,
    base_url: String,
}

/// reqwest-backed [`RemoteApi`] against the backend REST contract.
///
/// Clone-able; all state lives behind an Arc.
#[derive(Clone)]
pub struct HttpRemoteClient {
    inner: Arc<RemoteClientInner>,
}

impl HttpRemoteClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(RemoteClientInner {
                client: Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Map a non-success status to the client error taxonomy.
    async fn check(resp: Response) -> Result<Response> {
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(resp.url().path().to_string())),
            status => {
                let message = resp.text().await.unwrap_or_default();
                Err(ClientError::NetworkUnavailable(format!(
                    "{status}: {message}"
                )))
            }
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
        resp.json().await.map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn start_login(
        &self,
        provider: OAuthProvider,
        platform: OAuthPlatform,
    ) -> Result<String> {
        let resp = self
            .inner
            .client
            .post(self.url("/api/v1/auth/login/start"))
            .json(&StartLoginRequest { provider, platform })
            .send()
            .await
            .map_err(|e| ClientError::AuthServiceUnreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::AuthServiceUnreachable(format!(
                "{status}: {message}"
            )));
        }

        let response: StartLoginResponse = Self::decode(resp).await?;
        Ok(response.auth_url)
    }

    async fn list_sets(&self, token: &str) -> Result<Vec<FlashcardSet>> {
        let resp = self
            .inner
            .client
            .get(self.url("/api/v1/flashcards/sets"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        let response: SetListResponse = Self::decode(Self::check(resp).await?).await?;
        Ok(response.sets)
    }

    async fn get_set(&self, token: &str, id: &str) -> Result<Option<FlashcardSet>> {
        let resp = self
            .inner
            .client
            .get(self.url(&format!("/api/v1/flashcards/sets/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        match Self::check(resp).await {
            Ok(resp) => Ok(Some(Self::decode(resp).await?)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_set(&self, token: &str, set: &FlashcardSet) -> Result<FlashcardSet> {
        let resp = self
            .inner
            .client
            .post(self.url("/api/v1/flashcards/sets"))
            .bearer_auth(token)
            .json(set)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        Self::decode(Self::check(resp).await?).await
    }

    async fn delete_set(&self, token: &str, id: &str) -> Result<()> {
        let resp = self
            .inner
            .client
            .delete(self.url(&format!("/api/v1/flashcards/sets/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        match Self::check(resp).await {
            // Already gone remotely is as good as deleted.
            Ok(_) | Err(ClientError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn get_randomized(&self, token: &str, id: &str) -> Result<Vec<Flashcard>> {
        let resp = self
            .inner
            .client
            .get(self.url(&format!("/api/v1/flashcards/sets/{id}/randomized")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        let response: RandomizedResponse = Self::decode(Self::check(resp).await?).await?;
        Ok(response.flashcards)
    }

    async fn generate(&self, token: &str, topic: &str, count: u32) -> Result<FlashcardSet> {
        let resp = self
            .inner
            .client
            .post(self.url("/api/v1/generate"))
            .bearer_auth(token)
            .json(&GenerateRequest { topic, count })
            .send()
            .await
            .map_err(|e| ClientError::NetworkUnavailable(e.to_string()))?;

        Self::decode(Self::check(resp).await?).await
    }
}
