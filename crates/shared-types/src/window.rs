//! Half-open creation-time windows used by the windowed aggregate queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// `[from, to)` over block `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// The `hours` immediately preceding `now`.
    ///
    /// A period reaching past the earliest representable instant starts at
    /// `DateTime::<Utc>::MIN_UTC`, so the window covers all history.
    pub fn trailing_hours(now: DateTime<Utc>, hours: u32) -> Self {
        let from = now
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { from, to: now }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at < self.to
    }
}
