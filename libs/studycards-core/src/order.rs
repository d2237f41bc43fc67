//! Freshness ordering for set listings.

use std::cmp::Ordering;

use crate::types::FlashcardSet;

/// Comparator for the unified set listing: most recently created first,
/// ties broken by id ascending so the order is deterministic.
///
/// Comparison uses epoch milliseconds, matching the granularity the
/// creation timestamps are persisted at.
pub fn compare_sets_newest_first(a: &FlashcardSet, b: &FlashcardSet) -> Ordering {
    b.created_at
        .timestamp_millis()
        .cmp(&a.created_at.timestamp_millis())
        .then_with(|| a.id.cmp(&b.id))
}
