//! Core types for the studycards application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParseEnumError;

/// OAuth identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Google,
    Apple,
}

impl OAuthProvider {
    /// Stable string form used for storage keys and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

impl FromStr for OAuthProvider {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            other => Err(ParseEnumError::new("oauth provider", other)),
        }
    }
}

/// Platform tag declared to the auth service when requesting an
/// authorization URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthPlatform {
    Android,
    Ios,
    Web,
}

impl OAuthPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }
}

/// Completed OAuth handshake result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub provider: OAuthProvider,
}

/// Process-wide session state. Exactly one exists per process, owned by
/// the auth gateway and persisted on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn {
        token: String,
        provider: OAuthProvider,
    },
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::SignedIn { token, .. } => Some(token),
            Self::SignedOut => None,
        }
    }
}

/// A single flashcard. Immutable value; mutation happens by replacing
/// the owning set wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    /// Must reference an existing set in the same store.
    pub set_id: String,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
}

/// An ordered collection of flashcards on one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub id: String,
    pub topic: String,
    pub flashcards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    /// Card count is always derived from the sequence, never stored.
    pub fn card_count(&self) -> usize {
        self.flashcards.len()
    }
}

/// A flashcard set tagged with its sync provenance.
///
/// `is_local_only` is true iff the set id has never been acknowledged
/// by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSetWithMeta {
    #[serde(flatten)]
    pub set: FlashcardSet,
    pub is_local_only: bool,
}

impl FlashcardSetWithMeta {
    pub fn local_only(set: FlashcardSet) -> Self {
        Self {
            set,
            is_local_only: true,
        }
    }

    pub fn synced(set: FlashcardSet) -> Self {
        Self {
            set,
            is_local_only: false,
        }
    }
}
