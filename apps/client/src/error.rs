//! Error types for the client subsystem.
//!
//! Every boundary operation returns a definite success, absence, or one
//! of these typed failures. Nothing here is meant to reach the UI as an
//! unhandled fault.

use thiserror::Error;

/// Client error taxonomy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Underlying key-value or flashcard storage failed. Callers treat
    /// this like absence for decision purposes (fail open to signed out).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The user dismissed the OAuth surface. Recovered locally.
    #[error("authentication cancelled")]
    AuthCancelled,

    /// The auth service could not be reached while setting up a
    /// handshake. Fatal to the sign-in attempt.
    #[error("auth service unreachable: {0}")]
    AuthServiceUnreachable(String),

    /// Transport failure talking to the flashcard service.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The session token was rejected. Forces a sign-out transition.
    #[error("session expired, please sign in again")]
    Unauthorized,

    /// A handshake for this provider is already in flight.
    #[error("sign-in already in progress")]
    AlreadyInProgress,

    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
