//! Core studycards library shared by the client and backend applications.
//!
//! Provides:
//! - Shared flashcard types (Flashcard, FlashcardSet, FlashcardSetWithMeta)
//! - Session and OAuth types (SessionState, OAuthProvider, OAuthPlatform)
//! - Deterministic freshness ordering for set listings

pub mod error;
pub mod order;
pub mod types;

pub use error::ParseEnumError;
pub use order::compare_sets_newest_first;
pub use types::{
    AuthResponse, Flashcard, FlashcardSet, FlashcardSetWithMeta, OAuthPlatform, OAuthProvider,
    SessionState,
};
