//! Provider handshake drivers, one per platform presentation mechanism.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use studycards_core::{AuthResponse, OAuthPlatform, OAuthProvider};

use crate::auth::callback::CallbackRegistry;
use crate::error::Result;
use crate::remote::RemoteApi;

/// Uniform bounded wait for the deep-link callback. Applies to every
/// callback-based variant instead of trusting the host browser
/// component's lifecycle.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(120);

/// How long the full-page redirect variant waits before concluding the
/// expected navigation never happened.
pub const REDIRECT_GRACE: Duration = Duration::from_millis(1000);

/// Drives the provider-specific authorization handshake.
///
/// `Ok(None)` means the user cancelled or the handshake timed out; the
/// caller stays signed out. Errors are reserved for setup failures such
/// as the auth service being unreachable.
#[async_trait]
pub trait OAuthFlow: Send + Sync {
    async fn authenticate(&self, provider: OAuthProvider) -> Result<Option<AuthResponse>>;
}

/// Platform mechanism for showing an authorization URL to the user:
/// custom tab, embedded secure browser sheet, or full-page navigation.
pub trait UrlPresenter: Send + Sync {
    fn present(&self, url: &str) -> Result<()>;
}

/// Handshake variant for platforms that get a deep-link callback after
/// presenting the URL in an in-app browser surface (Android custom tab,
/// iOS secure browser sheet).
pub struct CallbackOAuthFlow {
    remote: Arc<dyn RemoteApi>,
    presenter: Arc<dyn UrlPresenter>,
    callbacks: Arc<CallbackRegistry>,
    platform: OAuthPlatform,
    timeout: Duration,
}

impl CallbackOAuthFlow {
    pub fn new(
        remote: Arc<dyn RemoteApi>,
        presenter: Arc<dyn UrlPresenter>,
        callbacks: Arc<CallbackRegistry>,
        platform: OAuthPlatform,
    ) -> Self {
        Self {
            remote,
            presenter,
            callbacks,
            platform,
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl OAuthFlow for CallbackOAuthFlow {
    async fn authenticate(&self, provider: OAuthProvider) -> Result<Option<AuthResponse>> {
        let auth_url = self.remote.start_login(provider, self.platform).await?;

        let rx = self.callbacks.register()?;
        if let Err(err) = self.presenter.present(&auth_url) {
            self.callbacks.cancel();
            return Err(err);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => {
                if response.provider == provider {
                    Ok(Some(response))
                } else {
                    tracing::warn!(
                        expected = provider.as_str(),
                        got = response.provider.as_str(),
                        "callback provider mismatch, staying signed out"
                    );
                    Ok(None)
                }
            }
            // Sender side dropped: the handshake was cancelled.
            Ok(Err(_)) => Ok(None),
            Err(_) => {
                tracing::info!(provider = provider.as_str(), "auth handshake timed out");
                self.callbacks.cancel();
                Ok(None)
            }
        }
    }
}

/// Handshake variant for the web, where presenting the URL navigates
/// the page away entirely. On success this call never returns (the page
/// unloads); if we are still running after the grace period, the
/// navigation did not happen and the attempt is reported as failed.
pub struct RedirectOAuthFlow {
    remote: Arc<dyn RemoteApi>,
    presenter: Arc<dyn UrlPresenter>,
    grace: Duration,
}

impl RedirectOAuthFlow {
    pub fn new(remote: Arc<dyn RemoteApi>, presenter: Arc<dyn UrlPresenter>) -> Self {
        Self {
            remote,
            presenter,
            grace: REDIRECT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

#[async_trait]
impl OAuthFlow for RedirectOAuthFlow {
    async fn authenticate(&self, provider: OAuthProvider) -> Result<Option<AuthResponse>> {
        let auth_url = self.remote.start_login(provider, OAuthPlatform::Web).await?;
        self.presenter.present(&auth_url)?;

        tokio::time::sleep(self.grace).await;
        tracing::info!(
            provider = provider.as_str(),
            "page did not navigate away, treating sign-in as failed"
        );
        Ok(None)
    }
}
