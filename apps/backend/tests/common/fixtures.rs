//! Test data builders

use chrono::{TimeZone, Utc};

use studycards_core::{Flashcard, FlashcardSet};

/// A flashcard set with `cards` cards, created at the given epoch millis
pub fn sample_set(id: &str, topic: &str, cards: usize, created_at_ms: i64) -> FlashcardSet {
    let created_at = Utc.timestamp_millis_opt(created_at_ms).unwrap();
    let flashcards = (0..cards)
        .map(|i| Flashcard {
            id: format!("{}-card-{}", id, i),
            set_id: id.to_string(),
            front: format!("Question {}", i + 1),
            back: format!("Answer {}", i + 1),
            created_at,
        })
        .collect();

    FlashcardSet {
        id: id.to_string(),
        topic: topic.to_string(),
        flashcards,
        created_at,
    }
}

/// Set whose cards claim to belong to a different set
pub fn mismatched_set(id: &str) -> FlashcardSet {
    let mut set = sample_set(id, "Mismatched", 1, 1_700_000_000_000);
    set.flashcards[0].set_id = "some-other-set".to_string();
    set
}
