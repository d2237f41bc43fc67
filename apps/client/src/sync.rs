//! Unified view over local and remote flashcard sets.
//!
//! Callers read and write through this repository without knowing about
//! the remote boundary. Local storage is the durability guarantee;
//! remote sync is best-effort and retried on the next reconciliation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Serialize;

use studycards_core::{
    compare_sets_newest_first, Flashcard, FlashcardSet, FlashcardSetWithMeta,
};

use crate::auth::AuthGateway;
use crate::error::{ClientError, Result};
use crate::remote::RemoteApi;
use crate::store::FlashcardStore;

/// Counters from one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Remote sets newly stored locally.
    pub pulled: usize,
    /// Local-only sets acknowledged by the remote.
    pub pushed: usize,
    /// Sets where both sides held divergent content.
    pub conflicts: usize,
}

/// Reconciles [`FlashcardStore`] contents with the remote flashcard
/// service and tags each set's provenance.
pub struct FlashcardSyncRepository {
    store: Arc<dyn FlashcardStore>,
    remote: Arc<dyn RemoteApi>,
    auth: Arc<AuthGateway>,
}

impl FlashcardSyncRepository {
    pub fn new(
        store: Arc<dyn FlashcardStore>,
        remote: Arc<dyn RemoteApi>,
        auth: Arc<AuthGateway>,
    ) -> Self {
        Self {
            store,
            remote,
            auth,
        }
    }

    /// All sets, most recently created first; ties break by id
    /// ascending so the order is stable.
    pub async fn get_all_flashcard_sets(&self) -> Result<Vec<FlashcardSetWithMeta>> {
        let mut sets = self.store.get_all().await?;
        sets.sort_by(|a, b| compare_sets_newest_first(&a.set, &b.set));
        Ok(sets)
    }

    /// Write through to local storage, then push best-effort.
    ///
    /// The local write is the durability guarantee; a failed push never
    /// surfaces to the caller. A set whose id was never acknowledged
    /// remotely stays local-only until a push succeeds.
    pub async fn save_flashcard_set(&self, set: FlashcardSet) -> Result<()> {
        let is_local_only = match self.store.get_by_id(&set.id).await? {
            Some(existing) => existing.is_local_only,
            None => true,
        };
        let mut meta = FlashcardSetWithMeta { set, is_local_only };
        self.store.save(&meta).await?;

        let Some(token) = self.auth.session_token() else {
            return Ok(());
        };

        match self.remote.create_set(&token, &meta.set).await {
            Ok(_) => {
                if meta.is_local_only {
                    meta.is_local_only = false;
                    self.store.save(&meta).await?;
                }
            }
            Err(ClientError::Unauthorized) => {
                tracing::warn!(set_id = %meta.set.id, "push rejected, session expired");
                self.auth.sign_out().await;
            }
            Err(err) => {
                tracing::warn!(set_id = %meta.set.id, error = %err, "push failed, set stays local-only");
            }
        }
        Ok(())
    }

    /// Local-first lookup by identifier.
    pub async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSetWithMeta>> {
        self.store.get_by_id(id).await
    }

    /// Remove a set locally; if it was previously synced, also issue a
    /// best-effort remote delete. Local deletion always wins.
    pub async fn delete_flashcard_set(&self, id: &str) -> Result<()> {
        let existing = self.store.get_by_id(id).await?;
        self.store.delete(id).await?;

        let Some(meta) = existing else { return Ok(()) };
        if meta.is_local_only {
            return Ok(());
        }
        let Some(token) = self.auth.session_token() else {
            return Ok(());
        };

        match self.remote.delete_set(&token, id).await {
            Ok(()) => {}
            Err(ClientError::Unauthorized) => {
                tracing::warn!(set_id = %id, "remote delete rejected, session expired");
                self.auth.sign_out().await;
            }
            Err(err) => {
                tracing::warn!(set_id = %id, error = %err, "remote delete failed");
            }
        }
        Ok(())
    }

    /// The set's cards in a freshly randomized order. Not persisted;
    /// every call shuffles anew.
    pub async fn get_randomized_flashcards(&self, set_id: &str) -> Result<Option<Vec<Flashcard>>> {
        let Some(meta) = self.store.get_by_id(set_id).await? else {
            return Ok(None);
        };
        let mut cards = meta.set.flashcards;
        cards.shuffle(&mut rand::thread_rng());
        Ok(Some(cards))
    }

    /// Merge local and remote collections. Run on sign-in and on
    /// explicit refresh.
    ///
    /// Remote sets unknown locally are stored as synced. Conflicting
    /// identifiers resolve by creation timestamp: remote-wins when the
    /// remote copy is newer, local-wins otherwise (with a best-effort
    /// push to realign the remote). Local-only sets absent remotely are
    /// pushed; the flag clears only on acknowledged success.
    pub async fn reconcile(&self) -> Result<SyncStats> {
        let Some(token) = self.auth.session_token() else {
            return Err(ClientError::Unauthorized);
        };

        let remote_sets = match self.remote.list_sets(&token).await {
            Ok(sets) => sets,
            Err(ClientError::Unauthorized) => {
                self.auth.sign_out().await;
                return Err(ClientError::Unauthorized);
            }
            Err(err) => return Err(err),
        };

        let local_sets = self.store.get_all().await?;
        let local_by_id: HashMap<&str, &FlashcardSetWithMeta> = local_sets
            .iter()
            .map(|meta| (meta.set.id.as_str(), meta))
            .collect();
        let remote_ids: HashSet<&str> =
            remote_sets.iter().map(|set| set.id.as_str()).collect();

        let mut stats = SyncStats::default();

        for remote_set in &remote_sets {
            match local_by_id.get(remote_set.id.as_str()) {
                None => {
                    self.store
                        .save(&FlashcardSetWithMeta::synced(remote_set.clone()))
                        .await?;
                    stats.pulled += 1;
                }
                Some(local) if local.set == *remote_set => {
                    // Same content both sides; the remote clearly knows
                    // the id, so make sure the flag agrees.
                    if local.is_local_only {
                        self.store
                            .save(&FlashcardSetWithMeta::synced(remote_set.clone()))
                            .await?;
                    }
                }
                Some(local) => {
                    stats.conflicts += 1;
                    let remote_newer = remote_set.created_at.timestamp_millis()
                        > local.set.created_at.timestamp_millis();
                    if remote_newer {
                        self.store
                            .save(&FlashcardSetWithMeta::synced(remote_set.clone()))
                            .await?;
                    } else {
                        // Local wins: realign the remote copy.
                        match self.remote.create_set(&token, &local.set).await {
                            Ok(_) => {
                                self.store
                                    .save(&FlashcardSetWithMeta::synced(local.set.clone()))
                                    .await?;
                            }
                            Err(ClientError::Unauthorized) => {
                                self.auth.sign_out().await;
                                return Err(ClientError::Unauthorized);
                            }
                            Err(err) => {
                                tracing::warn!(set_id = %local.set.id, error = %err,
                                    "failed to realign remote after local-wins conflict");
                            }
                        }
                    }
                }
            }
        }

        for local in &local_sets {
            if !local.is_local_only || remote_ids.contains(local.set.id.as_str()) {
                continue;
            }
            match self.remote.create_set(&token, &local.set).await {
                Ok(_) => {
                    self.store
                        .save(&FlashcardSetWithMeta::synced(local.set.clone()))
                        .await?;
                    stats.pushed += 1;
                }
                Err(ClientError::Unauthorized) => {
                    self.auth.sign_out().await;
                    return Err(ClientError::Unauthorized);
                }
                Err(err) => {
                    tracing::warn!(set_id = %local.set.id, error = %err,
                        "push failed, set stays local-only until next reconciliation");
                }
            }
        }

        tracing::info!(
            pulled = stats.pulled,
            pushed = stats.pushed,
            conflicts = stats.conflicts,
            "reconciliation complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OAuthFlow;
    use crate::remote::tests::StubRemote;
    use crate::session::MemorySessionStore;
    use crate::store::MemoryFlashcardStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet as StdHashSet;
    use std::sync::atomic::Ordering;
    use studycards_core::{AuthResponse, OAuthProvider};

    struct AutoFlow;

    #[async_trait]
    impl OAuthFlow for AutoFlow {
        async fn authenticate(
            &self,
            provider: OAuthProvider,
        ) -> Result<Option<AuthResponse>> {
            Ok(Some(AuthResponse {
                token: "tok".to_string(),
                provider,
            }))
        }
    }

    fn sample_set(id: &str, millis: i64, cards: usize) -> FlashcardSet {
        let flashcards = (0..cards)
            .map(|i| Flashcard {
                id: format!("{id}-c{i}"),
                set_id: id.to_string(),
                front: format!("front {i}"),
                back: format!("back {i}"),
                created_at: Utc.timestamp_millis_opt(millis).unwrap(),
            })
            .collect();
        FlashcardSet {
            id: id.to_string(),
            topic: "topic".to_string(),
            flashcards,
            created_at: Utc.timestamp_millis_opt(millis).unwrap(),
        }
    }

    struct Fixture {
        repo: FlashcardSyncRepository,
        store: Arc<MemoryFlashcardStore>,
        remote: Arc<StubRemote>,
        auth: Arc<AuthGateway>,
    }

    async fn fixture(signed_in: bool) -> Fixture {
        let store = Arc::new(MemoryFlashcardStore::new());
        let remote = Arc::new(StubRemote::new());
        let auth = Arc::new(
            AuthGateway::new(Arc::new(MemorySessionStore::new()), Arc::new(AutoFlow)).await,
        );
        if signed_in {
            auth.sign_in(OAuthProvider::Google).await.unwrap();
        }
        Fixture {
            repo: FlashcardSyncRepository::new(store.clone(), remote.clone(), auth.clone()),
            store,
            remote,
            auth,
        }
    }

    #[tokio::test]
    async fn listing_orders_by_freshness_then_id() {
        let f = fixture(false).await;
        f.repo.save_flashcard_set(sample_set("a", 100, 0)).await.unwrap();
        f.repo.save_flashcard_set(sample_set("b", 300, 0)).await.unwrap();
        f.repo.save_flashcard_set(sample_set("c", 200, 0)).await.unwrap();

        let sets = f.repo.get_all_flashcard_sets().await.unwrap();
        let millis: Vec<i64> = sets
            .iter()
            .map(|m| m.set.created_at.timestamp_millis())
            .collect();
        assert_eq!(millis, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn save_while_signed_out_stays_local_only() {
        let f = fixture(false).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 2)).await.unwrap();

        let meta = f.repo.get_flashcard_set("s1").await.unwrap().unwrap();
        assert!(meta.is_local_only);
        assert_eq!(f.remote.push_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_while_signed_in_pushes_and_marks_synced() {
        let f = fixture(true).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 2)).await.unwrap();

        let meta = f.repo.get_flashcard_set("s1").await.unwrap().unwrap();
        assert!(!meta.is_local_only);
        assert!(f.remote.sets.lock().unwrap().contains_key("s1"));
    }

    #[tokio::test]
    async fn failed_push_keeps_local_only_until_retried() {
        let f = fixture(true).await;
        f.remote.offline.store(true, Ordering::SeqCst);

        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();
        assert!(f.repo.get_flashcard_set("s1").await.unwrap().unwrap().is_local_only);

        // Still local-only after a failed reconciliation.
        assert!(f.repo.reconcile().await.is_err());
        assert!(f.repo.get_flashcard_set("s1").await.unwrap().unwrap().is_local_only);

        // Back online: the next reconciliation pushes it through.
        f.remote.offline.store(false, Ordering::SeqCst);
        let stats = f.repo.reconcile().await.unwrap();
        assert_eq!(stats.pushed, 1);
        assert!(!f.repo.get_flashcard_set("s1").await.unwrap().unwrap().is_local_only);
    }

    #[tokio::test]
    async fn push_rejection_signs_out_but_save_succeeds() {
        let f = fixture(true).await;
        f.remote.reject_tokens.store(true, Ordering::SeqCst);

        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();

        assert!(!f.auth.is_signed_in());
        let meta = f.repo.get_flashcard_set("s1").await.unwrap().unwrap();
        assert!(meta.is_local_only);
    }

    #[tokio::test]
    async fn reconcile_requires_session() {
        let f = fixture(false).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();

        let err = f.repo.reconcile().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(f.repo.get_flashcard_set("s1").await.unwrap().unwrap().is_local_only);
    }

    #[tokio::test]
    async fn reconcile_after_sign_out_treats_sets_as_local_only() {
        let f = fixture(true).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();

        f.auth.sign_out().await;
        assert_eq!(f.auth.session_token(), None);
        assert!(matches!(
            f.repo.reconcile().await,
            Err(ClientError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn reconcile_pulls_unknown_remote_sets_as_synced() {
        let f = fixture(true).await;
        f.remote.seed(sample_set("r1", 500, 3));

        let stats = f.repo.reconcile().await.unwrap();
        assert_eq!(stats.pulled, 1);

        let meta = f.repo.get_flashcard_set("r1").await.unwrap().unwrap();
        assert!(!meta.is_local_only);
        assert_eq!(meta.set.card_count(), 3);
    }

    #[tokio::test]
    async fn reconcile_conflict_remote_newer_wins() {
        let f = fixture(true).await;
        let local = sample_set("s1", 100, 1);
        f.store
            .save(&FlashcardSetWithMeta::synced(local))
            .await
            .unwrap();
        let remote = sample_set("s1", 200, 2);
        f.remote.seed(remote.clone());

        let stats = f.repo.reconcile().await.unwrap();
        assert_eq!(stats.conflicts, 1);

        let meta = f.repo.get_flashcard_set("s1").await.unwrap().unwrap();
        assert_eq!(meta.set, remote);
        assert!(!meta.is_local_only);
    }

    #[tokio::test]
    async fn reconcile_conflict_local_newer_wins_and_realigns_remote() {
        let f = fixture(true).await;
        let local = sample_set("s1", 300, 2);
        f.store
            .save(&FlashcardSetWithMeta::synced(local.clone()))
            .await
            .unwrap();
        f.remote.seed(sample_set("s1", 100, 1));

        let stats = f.repo.reconcile().await.unwrap();
        assert_eq!(stats.conflicts, 1);

        let meta = f.repo.get_flashcard_set("s1").await.unwrap().unwrap();
        assert_eq!(meta.set, local);
        assert_eq!(f.remote.sets.lock().unwrap().get("s1"), Some(&local));
    }

    #[tokio::test]
    async fn reconcile_realign_rejection_forces_sign_out() {
        // Token expires between the pull and the local-wins push.
        let f = fixture(true).await;
        f.store
            .save(&FlashcardSetWithMeta::synced(sample_set("s1", 300, 2)))
            .await
            .unwrap();
        f.remote.seed(sample_set("s1", 100, 1));
        f.remote.reject_pushes.store(true, Ordering::SeqCst);

        assert!(matches!(
            f.repo.reconcile().await,
            Err(ClientError::Unauthorized)
        ));
        assert!(!f.auth.is_signed_in());
    }

    #[tokio::test]
    async fn reconcile_unauthorized_forces_sign_out() {
        let f = fixture(true).await;
        f.remote.reject_tokens.store(true, Ordering::SeqCst);

        assert!(matches!(
            f.repo.reconcile().await,
            Err(ClientError::Unauthorized)
        ));
        assert!(!f.auth.is_signed_in());
    }

    #[tokio::test]
    async fn delete_synced_set_issues_remote_delete() {
        let f = fixture(true).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();
        assert!(f.remote.sets.lock().unwrap().contains_key("s1"));

        f.repo.delete_flashcard_set("s1").await.unwrap();
        assert_eq!(f.repo.get_flashcard_set("s1").await.unwrap(), None);
        assert!(!f.remote.sets.lock().unwrap().contains_key("s1"));
    }

    #[tokio::test]
    async fn delete_survives_remote_failure() {
        let f = fixture(true).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 1)).await.unwrap();

        f.remote.offline.store(true, Ordering::SeqCst);
        f.repo.delete_flashcard_set("s1").await.unwrap();
        assert_eq!(f.repo.get_flashcard_set("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn randomized_cards_keep_the_multiset() {
        let f = fixture(false).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 6)).await.unwrap();

        let original: StdHashSet<String> = (0..6).map(|i| format!("s1-c{i}")).collect();
        let shuffled = f
            .repo
            .get_randomized_flashcards("s1")
            .await
            .unwrap()
            .unwrap();

        let ids: StdHashSet<String> = shuffled.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, original);
        assert_eq!(shuffled.len(), 6);
    }

    #[tokio::test]
    async fn randomized_order_varies_across_calls() {
        let f = fixture(false).await;
        f.repo.save_flashcard_set(sample_set("s1", 100, 5)).await.unwrap();

        // 5 cards have 120 permutations; 30 draws landing on a single
        // ordering is ~1e-62 under a uniform shuffle.
        let mut seen: StdHashSet<Vec<String>> = StdHashSet::new();
        for _ in 0..30 {
            let order: Vec<String> = f
                .repo
                .get_randomized_flashcards("s1")
                .await
                .unwrap()
                .unwrap()
                .into_iter()
                .map(|c| c.id)
                .collect();
            seen.insert(order);
        }
        assert!(seen.len() > 1, "shuffle produced a single ordering");
    }

    #[tokio::test]
    async fn randomized_missing_set_is_absent() {
        let f = fixture(false).await;
        assert_eq!(f.repo.get_randomized_flashcards("ghost").await.unwrap(), None);
    }
}
