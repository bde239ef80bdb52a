//! Saved items: user-pinned records that survive across sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A record the user explicitly saved.
///
/// Immutable once stored: the persisted collection is only ever replaced
/// wholesale, never patched in place. Collections are ordered newest-first,
/// so the tail holds the oldest items and is the eviction end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    /// Caller-assigned unique id.
    pub id: String,
    /// Opaque JSON payload (storyboard, clip reference, character sheet).
    pub payload: serde_json::Value,
    /// Absolute UTC timestamp after which the item is passively expired.
    pub expires_at: DateTime<Utc>,
}

impl SavedItem {
    /// Creates an item expiring `ttl_days` from `now`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
        ttl_days: i64,
    ) -> Self {
        Self { id: id.into(), payload, expires_at: now + Duration::days(ttl_days) }
    }

    /// Whether this item has passed its expiry timestamp.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let item =
            SavedItem { id: "a".into(), payload: serde_json::json!({}), expires_at: now };
        assert!(item.is_expired(now));
        assert!(!item.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn new_sets_expiry_from_ttl() {
        let now = Utc::now();
        let item = SavedItem::new("a", serde_json::json!({"kind": "clip"}), now, 30);
        assert_eq!(item.expires_at, now + Duration::days(30));
        assert!(!item.is_expired(now));
    }
}
