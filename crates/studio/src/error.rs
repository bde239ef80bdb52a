//! Typed error enum for the service layer.
//!
//! Unifies backend and store failures into a single error type, enabling
//! callers to match on specific failure modes instead of stringly-typed
//! comparisons.

use thiserror::Error;

use storyforge_backend::BackendError;
use storyforge_store::StoreError;

/// Service-layer error unifying backend and persistence failures.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Generation backend call failed (after retries, or fatally).
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    /// Persistence operation failed.
    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// The per-day cap for this generation kind is already spent.
    #[error("daily {0} limit reached")]
    DailyLimitReached(&'static str),

    /// Caller provided invalid input (empty idea, zero panels).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StudioError {
    /// Whether this is the user-stop condition, which callers surface as a
    /// neutral "stopped" state, never as a failure banner.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Cancelled))
    }

    /// Short human-readable message for the user-facing layer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            Self::Store(e) if e.is_quota() => {
                "Storage is full; the oldest saved items were removed.".to_owned()
            },
            Self::Store(_) => "Could not persist your data.".to_owned(),
            Self::DailyLimitReached(kind) => {
                format!("Daily {kind} limit reached. Come back tomorrow!")
            },
            Self::InvalidInput(message) => message.clone(),
        }
    }
}
