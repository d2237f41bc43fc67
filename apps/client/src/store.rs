//! Device-local storage of flashcard sets.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use studycards_core::FlashcardSetWithMeta;

use crate::error::Result;

/// Durable storage for a device's flashcard sets.
///
/// `get_all` makes no ordering promise; freshness ordering is applied
/// by the sync repository.
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Upsert by set identifier.
    async fn save(&self, set: &FlashcardSetWithMeta) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<FlashcardSetWithMeta>>;
    async fn get_by_id(&self, id: &str) -> Result<Option<FlashcardSetWithMeta>>;
    /// Delete by identifier. Deleting an absent set is a no-op.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory flashcard store for tests.
#[derive(Default)]
pub struct MemoryFlashcardStore {
    sets: Mutex<HashMap<String, FlashcardSetWithMeta>>,
}

impl MemoryFlashcardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlashcardStore for MemoryFlashcardStore {
    async fn save(&self, set: &FlashcardSetWithMeta) -> Result<()> {
        self.sets
            .lock()
            .unwrap()
            .insert(set.set.id.clone(), set.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<FlashcardSetWithMeta>> {
        Ok(self.sets.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<FlashcardSetWithMeta>> {
        Ok(self.sets.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sets.lock().unwrap().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use studycards_core::FlashcardSet;

    fn sample(id: &str) -> FlashcardSetWithMeta {
        FlashcardSetWithMeta::local_only(FlashcardSet {
            id: id.to_string(),
            topic: "topic".to_string(),
            flashcards: vec![],
            created_at: Utc.timestamp_millis_opt(1_000).unwrap(),
        })
    }

    #[tokio::test]
    async fn save_then_get_round_trip() {
        let store = MemoryFlashcardStore::new();
        let set = sample("s1");
        store.save(&set).await.unwrap();

        let loaded = store.get_by_id("s1").await.unwrap().unwrap();
        assert_eq!(loaded, set);
    }

    #[tokio::test]
    async fn save_is_upsert() {
        let store = MemoryFlashcardStore::new();
        let mut set = sample("s1");
        store.save(&set).await.unwrap();

        set.set.topic = "revised".to_string();
        set.is_local_only = false;
        store.save(&set).await.unwrap();

        assert_eq!(store.get_all().await.unwrap().len(), 1);
        let loaded = store.get_by_id("s1").await.unwrap().unwrap();
        assert_eq!(loaded.set.topic, "revised");
        assert!(!loaded.is_local_only);
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = MemoryFlashcardStore::new();
        store.delete("ghost").await.unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
