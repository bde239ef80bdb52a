//! Daily generation usage: per-day counters and configurable limits.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_IMAGES_PER_DAY, DEFAULT_MAX_VIDEOS_PER_DAY};

/// Which kind of generation an operation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Image,
    Video,
}

/// Generation counters valid only for the calendar day in `last_reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    pub images: u32,
    pub videos: u32,
    /// Calendar day (UTC) these counters belong to.
    pub last_reset: NaiveDate,
}

impl DailyCounts {
    /// Fresh zeroed counters for `day`.
    #[must_use]
    pub const fn for_day(day: NaiveDate) -> Self {
        Self { images: 0, videos: 0, last_reset: day }
    }

    /// Folds one completed generation into the counters.
    ///
    /// On a day rollover the counters are re-seeded with `amount` itself,
    /// not reset to zero and then incremented: resetting first would lose
    /// the day's first event if a stale record was loaded concurrently
    /// with the increment.
    pub fn apply(&mut self, kind: GenerationKind, amount: u32, today: NaiveDate) {
        if self.last_reset != today {
            *self = Self::for_day(today);
        }
        match kind {
            GenerationKind::Image => self.images = self.images.saturating_add(amount),
            GenerationKind::Video => self.videos = self.videos.saturating_add(amount),
        }
    }

    /// Count for one kind, treating a stale record as zero.
    #[must_use]
    pub fn count_today(&self, kind: GenerationKind, today: NaiveDate) -> u32 {
        if self.last_reset != today {
            return 0;
        }
        match kind {
            GenerationKind::Image => self.images,
            GenerationKind::Video => self.videos,
        }
    }
}

/// Configurable per-day generation caps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimits {
    pub max_images: u32,
    pub max_videos: u32,
    /// When false, no cap is enforced.
    pub is_enabled: bool,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            max_images: DEFAULT_MAX_IMAGES_PER_DAY,
            max_videos: DEFAULT_MAX_VIDEOS_PER_DAY,
            is_enabled: true,
        }
    }
}

impl DailyLimits {
    /// Cap for one generation kind.
    #[must_use]
    pub const fn cap(&self, kind: GenerationKind) -> u32 {
        match kind {
            GenerationKind::Image => self.max_images,
            GenerationKind::Video => self.max_videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn same_day_apply_increments() {
        let today = day("2026-08-28");
        let mut counts = DailyCounts { images: 2, videos: 1, last_reset: today };
        counts.apply(GenerationKind::Image, 1, today);
        assert_eq!(counts, DailyCounts { images: 3, videos: 1, last_reset: today });
    }

    #[test]
    fn rollover_seeds_with_operation_amount() {
        let yesterday = day("2026-08-27");
        let today = day("2026-08-28");
        let mut counts = DailyCounts { images: 9, videos: 4, last_reset: yesterday };
        counts.apply(GenerationKind::Image, 1, today);
        // Not zeroed-then-incremented: the first event of the day is kept.
        assert_eq!(counts, DailyCounts { images: 1, videos: 0, last_reset: today });
    }

    #[test]
    fn stale_record_counts_as_zero() {
        let counts =
            DailyCounts { images: 9, videos: 4, last_reset: day("2026-08-27") };
        assert_eq!(counts.count_today(GenerationKind::Image, day("2026-08-28")), 0);
        assert_eq!(counts.count_today(GenerationKind::Image, day("2026-08-27")), 9);
    }
}
