//! Deep-link callback delivery for in-app browser OAuth variants.
//!
//! The platform shell receives `<app-scheme>://callback?...` and hands
//! the raw URL to [`CallbackRegistry::deliver`]. The registry holds at
//! most one pending handshake; the callback payload carries no
//! correlation identifier, so overlap prevention lives in the gateway's
//! single-flight guard and is enforced again here.

use std::str::FromStr;
use std::sync::Mutex;

use tokio::sync::oneshot;

use studycards_core::{AuthResponse, OAuthProvider};

use crate::error::{ClientError, Result};

/// Host component of the reserved callback URL.
pub const CALLBACK_HOST: &str = "callback";

/// One-shot continuation registry keyed by "current pending handshake".
#[derive(Default)]
pub struct CallbackRegistry {
    pending: Mutex<Option<oneshot::Sender<AuthResponse>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next pending handshake and return the receiving end.
    ///
    /// Fails with `AlreadyInProgress` while a live handshake is pending.
    /// A stale registration whose receiver was dropped (the flow future
    /// was cancelled) is replaced silently.
    pub fn register(&self) -> Result<oneshot::Receiver<AuthResponse>> {
        let mut pending = self.pending.lock().unwrap();
        if let Some(tx) = pending.as_ref() {
            if !tx.is_closed() {
                return Err(ClientError::AlreadyInProgress);
            }
        }
        let (tx, rx) = oneshot::channel();
        *pending = Some(tx);
        Ok(rx)
    }

    /// Deliver a raw deep-link URL to the pending handshake.
    ///
    /// Arrival outside of a pending handshake, or with an unparseable
    /// payload, is ignored.
    pub fn deliver(&self, url: &str) {
        let Some(response) = parse_callback_url(url) else {
            tracing::warn!(url, "ignoring malformed auth callback");
            return;
        };
        match self.pending.lock().unwrap().take() {
            Some(tx) => {
                // Send failure means the flow future was already dropped.
                let _ = tx.send(response);
            }
            None => tracing::debug!("auth callback with no pending handshake, ignoring"),
        }
    }

    /// Drop the pending handshake, if any.
    pub fn cancel(&self) {
        self.pending.lock().unwrap().take();
    }
}

/// Parse `<scheme>://callback?token=...&provider=...`.
fn parse_callback_url(url: &str) -> Option<AuthResponse> {
    let (_, rest) = url.split_once("://")?;
    let (host, query) = rest.split_once('?')?;
    if host.trim_end_matches('/') != CALLBACK_HOST {
        return None;
    }

    let mut token = None;
    let mut provider = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("token", value)) => token = Some(percent_decode(value)),
            Some(("provider", value)) => {
                provider = OAuthProvider::from_str(&percent_decode(value)).ok()
            }
            _ => {}
        }
    }

    Some(AuthResponse {
        token: token.filter(|t| !t.is_empty())?,
        provider: provider?,
    })
}

/// Decode %XX escapes and '+' in a query value (RFC 3986).
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                // Hex digits are read byte-wise; slicing the str here
                // could land inside a multi-byte character.
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
