//! Typed error enum for the persistence layer.

use thiserror::Error;

/// Persistence-layer error with variants covering every expected failure
/// mode.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused the write for lack of capacity.
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Local filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure talking to the synchronized store.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Synchronized store answered with a non-success status.
    #[error("remote status {code}: {body}")]
    RemoteStatus { code: u16, body: String },

    /// Stored blob could not be (de)serialized.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this failure means "out of capacity" and eviction may help.
    ///
    /// The exact shape is backend-dependent, so besides the typed variant
    /// this matches the io kinds and HTTP statuses capacity failures arrive
    /// as, plus a case-insensitive "quota" substring as the last resort.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        match self {
            Self::QuotaExceeded(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::QuotaExceeded | std::io::ErrorKind::StorageFull
            ),
            Self::RemoteStatus { code: 507 | 413, .. } => true,
            _ => self.to_string().to_lowercase().contains("quota"),
        }
    }
}
