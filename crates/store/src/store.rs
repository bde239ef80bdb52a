//! Store facade: per-call backend selection, quota-bounded collection
//! writes, expiry sweeping, and the narrow counter/limits record paths.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::backend::KeyValueBackend;
use crate::error::StoreError;
use crate::local::LocalStore;
use crate::synced::SyncedStore;
use storyforge_core::constants::{DAILY_COUNTS_KEY, DAILY_LIMITS_KEY, SAVED_ITEMS_KEY};
use storyforge_core::{DailyCounts, DailyLimits, SavedItem};

/// Persistence facade over the synchronized and local backends.
///
/// Collections are stored newest-first; the tail (oldest) is the eviction
/// end. Concurrent writers to the same key are not guarded against: callers
/// serialize their own writes per key.
#[derive(Debug)]
pub struct StudioStore {
    synced: Option<SyncedStore>,
    local: LocalStore,
}

impl StudioStore {
    #[must_use]
    pub const fn new(local: LocalStore) -> Self {
        Self { synced: None, local }
    }

    /// Attaches a synchronized backend, preferred whenever it answers.
    #[must_use]
    pub fn with_synced(mut self, synced: SyncedStore) -> Self {
        self.synced = Some(synced);
        self
    }

    /// Picks the backend for this call. Probed every time, never cached:
    /// the synchronized service can appear or vanish mid-session.
    async fn active(&self) -> &dyn KeyValueBackend {
        if let Some(synced) = &self.synced {
            if synced.probe().await {
                return synced;
            }
            tracing::debug!("synchronized store unavailable, falling back to local");
        }
        &self.local
    }

    /// Writes the full collection under `key`, evicting from the tail on
    /// quota failures until the write fits.
    ///
    /// Eviction is best-effort data loss by policy: after a near-quota save
    /// the oldest records may be gone.
    ///
    /// # Errors
    /// Propagates any non-quota failure immediately, and a quota failure
    /// that persists once the collection is empty.
    pub async fn save_collection<T: Serialize>(
        &self,
        key: &str,
        records: &[T],
    ) -> Result<(), StoreError> {
        let backend = self.active().await;
        let mut working: Vec<&T> = records.iter().collect();
        loop {
            let blob = serde_json::to_string(&working)?;
            match backend.set(key, &blob).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_quota() && !working.is_empty() => {
                    working.pop();
                    tracing::warn!(
                        key,
                        remaining = working.len(),
                        "storage quota hit, evicting oldest record"
                    );
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Reads and parses the collection under `key`, empty when absent.
    ///
    /// # Errors
    /// Returns backend or parse failures; expiry handling is layered on by
    /// [`Self::load_saved_items`].
    pub async fn load_collection<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<T>, StoreError> {
        match self.active().await.get(key).await? {
            None => Ok(Vec::new()),
            Some(raw) => Ok(serde_json::from_str(&raw)?),
        }
    }

    /// Persists the saved-items collection (newest-first).
    ///
    /// # Errors
    /// See [`Self::save_collection`].
    pub async fn save_saved_items(&self, items: &[SavedItem]) -> Result<(), StoreError> {
        self.save_collection(SAVED_ITEMS_KEY, items).await
    }

    /// Loads saved items, sweeping out anything expired.
    pub async fn load_saved_items(&self) -> Vec<SavedItem> {
        self.load_saved_items_at(Utc::now()).await
    }

    /// Expiry evaluated against an explicit `now` (tests pin this).
    ///
    /// Expired records are dropped and the filtered collection is eagerly
    /// re-persisted, so dead entries do not accumulate unbounded in
    /// storage. Load failures degrade to an empty collection: the caller
    /// can always start from empty state.
    pub async fn load_saved_items_at(&self, now: DateTime<Utc>) -> Vec<SavedItem> {
        let items: Vec<SavedItem> = match self.load_collection(SAVED_ITEMS_KEY).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load saved items, starting empty");
                return Vec::new();
            },
        };
        let total = items.len();
        let live: Vec<SavedItem> =
            items.into_iter().filter(|item| !item.is_expired(now)).collect();
        if live.len() < total {
            tracing::debug!(dropped = total - live.len(), "sweeping expired saved items");
            if let Err(e) = self.save_saved_items(&live).await {
                tracing::warn!(error = %e, "failed to persist expiry sweep");
            }
        }
        live
    }

    /// Reads the daily counters record, `None` when never written.
    ///
    /// The store does no day-rollover logic: it hands back whatever is
    /// stored and persists whatever it is given. Rollover lives on
    /// `DailyCounts::apply` in the caller.
    ///
    /// # Errors
    /// Returns backend or parse failures.
    pub async fn load_counts(&self) -> Result<Option<DailyCounts>, StoreError> {
        match self.active().await.get(DAILY_COUNTS_KEY).await? {
            None => Ok(None),
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        }
    }

    /// Persists the daily counters record as given.
    ///
    /// # Errors
    /// Returns backend or serialization failures; no eviction on this path.
    pub async fn save_counts(&self, counts: &DailyCounts) -> Result<(), StoreError> {
        let blob = serde_json::to_string(counts)?;
        self.active().await.set(DAILY_COUNTS_KEY, &blob).await
    }

    /// Reads the configured daily limits, defaults when never written.
    ///
    /// # Errors
    /// Returns backend or parse failures.
    pub async fn load_limits(&self) -> Result<DailyLimits, StoreError> {
        match self.active().await.get(DAILY_LIMITS_KEY).await? {
            None => Ok(DailyLimits::default()),
            Some(raw) => Ok(serde_json::from_str(&raw)?),
        }
    }

    /// Persists the daily limits record.
    ///
    /// # Errors
    /// Returns backend or serialization failures.
    pub async fn save_limits(&self, limits: &DailyLimits) -> Result<(), StoreError> {
        let blob = serde_json::to_string(limits)?;
        self.active().await.set(DAILY_LIMITS_KEY, &blob).await
    }

    /// Raw read under a logical key, for diagnostics and tests.
    ///
    /// # Errors
    /// Returns backend failures.
    pub async fn raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.active().await.get(key).await
    }
}
