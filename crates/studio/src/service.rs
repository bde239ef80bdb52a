//! The studio service: generation actions wired to persistence.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::StudioError;
use crate::prompt::{motion_prompt, panel_prompt};
use storyforge_backend::{GenerationBackend, Retrier, RetryPolicy};
use storyforge_core::constants::{MAX_STORYBOARD_PANELS, SAVED_ITEM_TTL_DAYS};
use storyforge_core::{
    AudioClip, DailyCounts, DailyLimits, GenerationKind, SavedItem, Storyboard, StoryboardPanel,
    VideoAsset,
};
use storyforge_store::StudioStore;

const fn kind_label(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Image => "image",
        GenerationKind::Video => "video",
    }
}

/// Orchestrates generation actions: one logical action is live at a time,
/// each action's backend calls run through the retry wrapper, and results
/// are folded into the persistent store.
pub struct StudioService<B: GenerationBackend> {
    backend: Arc<B>,
    store: Arc<StudioStore>,
    policy: RetryPolicy,
    status: Option<Arc<dyn Fn(String) + Send + Sync>>,
    /// Cancellation signal of the in-flight action, if any.
    /// Last-writer-wins: starting a new action cancels this one.
    action: Mutex<Option<CancellationToken>>,
}

impl<B: GenerationBackend> std::fmt::Debug for StudioService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioService").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl<B: GenerationBackend> StudioService<B> {
    #[must_use]
    pub fn new(backend: Arc<B>, store: Arc<StudioStore>) -> Self {
        Self {
            backend,
            store,
            policy: RetryPolicy::default(),
            status: None,
            action: Mutex::new(None),
        }
    }

    /// Overrides the retry policy (tests compress the delays).
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets a sink receiving human-readable progress lines (retry notices).
    #[must_use]
    pub fn with_status_sink(mut self, sink: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.status = Some(Arc::new(sink));
        self
    }

    // ── Action lifecycle ─────────────────────────────────────────────

    /// Starts a new logical action, cancelling any in-flight one.
    pub fn begin_action(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut slot = self.action.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancels the in-flight action, if any.
    pub fn cancel_current(&self) {
        let mut slot = self.action.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }

    fn finish_action(&self) {
        self.action.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    fn retrier(&self, cancel: &CancellationToken) -> Retrier {
        let retrier = Retrier::new(cancel.clone()).with_policy(self.policy);
        match &self.status {
            Some(sink) => {
                let sink = Arc::clone(sink);
                retrier.on_status(move |line| sink(line))
            },
            None => retrier,
        }
    }

    // ── Generation actions ───────────────────────────────────────────

    /// Generates a storyboard: one image per panel, sequentially.
    ///
    /// # Errors
    /// `InvalidInput` for an empty idea or a bad panel count,
    /// `DailyLimitReached` before any backend call when the image budget
    /// cannot cover the request, otherwise whatever the retried backend
    /// calls surface (including `Cancelled`).
    pub async fn generate_storyboard(
        &self,
        idea: &str,
        n_panels: usize,
    ) -> Result<Storyboard, StudioError> {
        if idea.trim().is_empty() {
            return Err(StudioError::InvalidInput("story idea must not be empty".into()));
        }
        if n_panels == 0 || n_panels > MAX_STORYBOARD_PANELS {
            return Err(StudioError::InvalidInput(format!(
                "panel count must be between 1 and {MAX_STORYBOARD_PANELS}"
            )));
        }

        let cancel = self.begin_action();
        let today = Utc::now().date_naive();
        self.ensure_within_limit(GenerationKind::Image, n_panels as u32, today).await?;

        let result = self.generate_panels(idea, n_panels, &cancel, today).await;
        self.finish_action();
        result
    }

    async fn generate_panels(
        &self,
        idea: &str,
        n_panels: usize,
        cancel: &CancellationToken,
        today: NaiveDate,
    ) -> Result<Storyboard, StudioError> {
        let mut panels = Vec::with_capacity(n_panels);
        for index in 0..n_panels {
            let scene_prompt = panel_prompt(idea, index, n_panels);
            let image =
                self.retrier(cancel).run(|| self.backend.generate_image(&scene_prompt)).await?;
            if let Err(e) = self.record_generation_at(GenerationKind::Image, 1, today).await {
                tracing::warn!(error = %e, "failed to record image generation");
            }
            panels.push(StoryboardPanel { scene_prompt, image });
        }
        Ok(Storyboard::new(idea, panels))
    }

    /// Animates one storyboard panel into a clip.
    ///
    /// # Errors
    /// `DailyLimitReached` when the video budget is spent; otherwise
    /// backend/store failures (including `Cancelled`).
    pub async fn animate_panel(
        &self,
        panel: &StoryboardPanel,
        motion: &str,
    ) -> Result<VideoAsset, StudioError> {
        let cancel = self.begin_action();
        let today = Utc::now().date_naive();
        self.ensure_within_limit(GenerationKind::Video, 1, today).await?;

        let prompt = motion_prompt(&panel.scene_prompt, motion);
        let result = self
            .retrier(&cancel)
            .run(|| self.backend.animate_image(&prompt, &panel.image, &cancel))
            .await;
        if result.is_ok() {
            if let Err(e) = self.record_generation_at(GenerationKind::Video, 1, today).await {
                tracing::warn!(error = %e, "failed to record video generation");
            }
        }
        self.finish_action();
        Ok(result?)
    }

    /// Synthesizes narration for a piece of text. Not counted against the
    /// daily quotas.
    ///
    /// # Errors
    /// `InvalidInput` for empty text, otherwise backend failures.
    pub async fn narrate(&self, text: &str) -> Result<AudioClip, StudioError> {
        if text.trim().is_empty() {
            return Err(StudioError::InvalidInput("narration text must not be empty".into()));
        }
        let cancel = self.begin_action();
        let result =
            self.retrier(&cancel).run(|| self.backend.synthesize_narration(text)).await;
        self.finish_action();
        Ok(result?)
    }

    // ── Saved items ──────────────────────────────────────────────────

    /// Saves (or replaces) an item, prepending it as the newest entry.
    ///
    /// # Errors
    /// `InvalidInput` for an empty id, store failures otherwise.
    pub async fn save_item(
        &self,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<SavedItem, StudioError> {
        if id.trim().is_empty() {
            return Err(StudioError::InvalidInput("saved item id must not be empty".into()));
        }
        let item = SavedItem::new(id, payload, Utc::now(), SAVED_ITEM_TTL_DAYS);
        let mut items = self.store.load_saved_items().await;
        items.retain(|existing| existing.id != item.id);
        items.insert(0, item.clone());
        self.store.save_saved_items(&items).await?;
        Ok(item)
    }

    /// Removes a saved item. Returns whether anything was removed.
    ///
    /// # Errors
    /// Store failures.
    pub async fn unsave_item(&self, id: &str) -> Result<bool, StudioError> {
        let mut items = self.store.load_saved_items().await;
        let before = items.len();
        items.retain(|existing| existing.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.store.save_saved_items(&items).await?;
        Ok(true)
    }

    /// Current saved items, newest first, expired entries swept.
    pub async fn saved_items(&self) -> Vec<SavedItem> {
        self.store.load_saved_items().await
    }

    // ── Usage counters and limits ────────────────────────────────────

    /// Today's counters; a stale or missing record reads as zeroes.
    pub async fn usage_today(&self) -> DailyCounts {
        let today = Utc::now().date_naive();
        match self.load_counts_lenient().await {
            Some(counts) if counts.last_reset == today => counts,
            _ => DailyCounts::for_day(today),
        }
    }

    /// Effective limits (defaults when never configured).
    pub async fn limits(&self) -> DailyLimits {
        self.store.load_limits().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load limits, using defaults");
            DailyLimits::default()
        })
    }

    /// Persists new limits.
    ///
    /// # Errors
    /// Store failures.
    pub async fn set_limits(&self, limits: &DailyLimits) -> Result<(), StudioError> {
        Ok(self.store.save_limits(limits).await?)
    }

    /// Remaining budget for one kind today; `None` when limits are
    /// disabled (unlimited).
    pub async fn remaining(&self, kind: GenerationKind) -> Option<u32> {
        let limits = self.limits().await;
        if !limits.is_enabled {
            return None;
        }
        let today = Utc::now().date_naive();
        let used = self
            .load_counts_lenient()
            .await
            .map_or(0, |counts| counts.count_today(kind, today));
        Some(limits.cap(kind).saturating_sub(used))
    }

    /// Folds one completed generation into the persisted counters for
    /// `today`. A stale record rolls over seeded with `amount` itself, so
    /// the day's first event is never lost to a reset-then-increment race.
    ///
    /// # Errors
    /// Store failures writing the updated record.
    pub async fn record_generation_at(
        &self,
        kind: GenerationKind,
        amount: u32,
        today: NaiveDate,
    ) -> Result<(), StudioError> {
        let mut counts =
            self.load_counts_lenient().await.unwrap_or_else(|| DailyCounts::for_day(today));
        counts.apply(kind, amount, today);
        Ok(self.store.save_counts(&counts).await?)
    }

    async fn load_counts_lenient(&self) -> Option<DailyCounts> {
        match self.store.load_counts().await {
            Ok(counts) => counts,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load counters, treating as fresh");
                None
            },
        }
    }

    async fn ensure_within_limit(
        &self,
        kind: GenerationKind,
        amount: u32,
        today: NaiveDate,
    ) -> Result<(), StudioError> {
        let limits = self.limits().await;
        if !limits.is_enabled {
            return Ok(());
        }
        let used = self
            .load_counts_lenient()
            .await
            .map_or(0, |counts| counts.count_today(kind, today));
        if used.saturating_add(amount) > limits.cap(kind) {
            return Err(StudioError::DailyLimitReached(kind_label(kind)));
        }
        Ok(())
    }
}
