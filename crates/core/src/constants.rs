//! Shared constants for storyforge.
//!
//! Centralizes the persisted key namespace and default quotas so they are
//! defined in exactly one place.

/// Logical key for the saved-items collection (newest-first, tail-evicted).
pub const SAVED_ITEMS_KEY: &str = "saved-items";

/// Logical key for the per-day generation counters.
pub const DAILY_COUNTS_KEY: &str = "daily-counts";

/// Logical key for the configured daily limits.
pub const DAILY_LIMITS_KEY: &str = "daily-limits";

/// Default maximum storyboard images per calendar day.
pub const DEFAULT_MAX_IMAGES_PER_DAY: u32 = 10;

/// Default maximum animated clips per calendar day.
pub const DEFAULT_MAX_VIDEOS_PER_DAY: u32 = 3;

/// Default lifetime of a saved item before passive expiry, in days.
pub const SAVED_ITEM_TTL_DAYS: i64 = 30;

/// Maximum panels a single storyboard request may produce.
pub const MAX_STORYBOARD_PANELS: usize = 8;
