//! Session gateway: the one place session state changes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use studycards_core::{OAuthProvider, SessionState};

use crate::auth::flow::OAuthFlow;
use crate::error::{ClientError, Result};
use crate::session::{keys, SessionStore};

/// Façade over [`SessionStore`] and [`OAuthFlow`].
///
/// Owns the process-wide [`SessionState`]; every transition goes
/// through here and is persisted before callers can observe it, so
/// reads are never torn mid-update.
pub struct AuthGateway {
    sessions: Arc<dyn SessionStore>,
    flow: Arc<dyn OAuthFlow>,
    state: Mutex<SessionState>,
    in_flight: Arc<Mutex<HashSet<OAuthProvider>>>,
}

impl AuthGateway {
    /// Construct the gateway, restoring any persisted session.
    ///
    /// Storage failures fail open to the signed-out state.
    pub async fn new(sessions: Arc<dyn SessionStore>, flow: Arc<dyn OAuthFlow>) -> Self {
        let token = sessions.get(keys::SESSION_TOKEN).await.unwrap_or(None);
        let provider = sessions
            .get(keys::OAUTH_PROVIDER)
            .await
            .unwrap_or(None)
            .and_then(|value| value.parse::<OAuthProvider>().ok());

        let state = match (token, provider) {
            (Some(token), Some(provider)) => SessionState::SignedIn { token, provider },
            _ => SessionState::SignedOut,
        };

        Self {
            sessions,
            flow,
            state: Mutex::new(state),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// True iff a session token is held. Never touches the network.
    ///
    /// Policy note: the legacy Gemini API key does not count as signed
    /// in here; routing code that wants the historical "token OR legacy
    /// key" behavior combines this with [`legacy_api_key`].
    ///
    /// [`legacy_api_key`]: AuthGateway::legacy_api_key
    pub fn is_signed_in(&self) -> bool {
        self.state.lock().unwrap().is_signed_in()
    }

    /// Current session token, used as the bearer credential by the
    /// remote client.
    pub fn session_token(&self) -> Option<String> {
        self.state.lock().unwrap().token().map(str::to_string)
    }

    pub fn session_state(&self) -> SessionState {
        self.state.lock().unwrap().clone()
    }

    /// Run the OAuth handshake for `provider`.
    ///
    /// Returns `Ok(true)` once the session is persisted, `Ok(false)` if
    /// the user cancelled or the handshake timed out (prior state is
    /// untouched). At most one handshake per provider is in flight; a
    /// concurrent second call fails with `AlreadyInProgress`, and the
    /// guard is released even if this future is dropped mid-handshake.
    pub async fn sign_in(&self, provider: OAuthProvider) -> Result<bool> {
        let _guard = FlightGuard::acquire(self.in_flight.clone(), provider)?;

        let Some(response) = self.flow.authenticate(provider).await? else {
            return Ok(false);
        };

        self.sessions
            .set(keys::SESSION_TOKEN, &response.token)
            .await?;
        if let Err(err) = self
            .sessions
            .set(keys::OAUTH_PROVIDER, response.provider.as_str())
            .await
        {
            // Never leave a token without its provider; restore reads
            // them as a pair.
            if let Err(err) = self.sessions.clear(keys::SESSION_TOKEN).await {
                tracing::warn!(error = %err, "failed to roll back session token");
            }
            return Err(err);
        }

        *self.state.lock().unwrap() = SessionState::SignedIn {
            token: response.token,
            provider: response.provider,
        };
        tracing::info!(provider = provider.as_str(), "signed in");
        Ok(true)
    }

    /// Clear the session unconditionally. Idempotent; storage failures
    /// are logged, never raised.
    pub async fn sign_out(&self) {
        if let Err(err) = self.sessions.clear(keys::SESSION_TOKEN).await {
            tracing::warn!(error = %err, "failed to clear session token");
        }
        if let Err(err) = self.sessions.clear(keys::OAUTH_PROVIDER).await {
            tracing::warn!(error = %err, "failed to clear oauth provider");
        }
        *self.state.lock().unwrap() = SessionState::SignedOut;
        tracing::info!("signed out");
    }

    /// Legacy fallback credential. Absence and storage errors look the
    /// same to callers.
    pub async fn legacy_api_key(&self) -> Option<String> {
        self.sessions
            .get(keys::GEMINI_API_KEY)
            .await
            .unwrap_or(None)
    }

    pub async fn dark_mode(&self) -> bool {
        self.sessions
            .get(keys::DARK_MODE)
            .await
            .unwrap_or(None)
            .map(|value| value == "true")
            .unwrap_or(false)
    }

    pub async fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.sessions
            .set(keys::DARK_MODE, if enabled { "true" } else { "false" })
            .await
    }
}

/// Single-flight guard: released on drop, so a cancelled handshake
/// never blocks a retry.
struct FlightGuard {
    in_flight: Arc<Mutex<HashSet<OAuthProvider>>>,
    provider: OAuthProvider,
}

impl FlightGuard {
    fn acquire(
        in_flight: Arc<Mutex<HashSet<OAuthProvider>>>,
        provider: OAuthProvider,
    ) -> Result<Self> {
        if !in_flight.lock().unwrap().insert(provider) {
            return Err(ClientError::AlreadyInProgress);
        }
        Ok(Self {
            in_flight,
            provider,
        })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap().remove(&self.provider);
    }
}
