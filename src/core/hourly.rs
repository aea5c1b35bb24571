//! Per-hour aggregation of idle time.
//!
//! Every tick lands in the bucket for the current wall-clock hour. When the
//! clock crosses into a later hour the bucket is sealed into an immutable
//! [`HourlyRow`] and a fresh bucket starts, whether or not the row is ever
//! delivered anywhere.

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Hourly productivity status stored with each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HourlyStatus {
    Off,
    Low,
    Active,
    HighProduction,
}

impl HourlyStatus {
    /// Status for an hour's activity percentage.
    pub fn from_activity(activity_pct: f64, samples: u64) -> Self {
        if samples == 0 || activity_pct == 0.0 {
            HourlyStatus::Off
        } else if activity_pct < 50.0 {
            HourlyStatus::Low
        } else if activity_pct < 60.0 {
            HourlyStatus::Active
        } else {
            HourlyStatus::HighProduction
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HourlyStatus::Off => "OFF",
            HourlyStatus::Low => "LOW",
            HourlyStatus::Active => "ACTIVE",
            HourlyStatus::HighProduction => "HIGH_PRODUCTION",
        }
    }
}

impl fmt::Display for HourlyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(1 - clamp(idle / 3600, 0, 1)) * 100`, or 0 for an hour without samples.
pub fn activity_pct(idle_seconds: f64, samples: u64) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    let idle_ratio = (idle_seconds / SECONDS_PER_HOUR).clamp(0.0, 1.0);
    (1.0 - idle_ratio) * 100.0
}

/// Start of the UTC hour containing `t`.
pub fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}

/// Accumulator for the hour in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyBucket {
    pub hour_start: DateTime<Utc>,
    pub idle_seconds: f64,
    pub sample_count: u64,
}

impl HourlyBucket {
    /// Empty bucket for the hour containing `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            hour_start: truncate_to_hour(now),
            idle_seconds: 0.0,
            sample_count: 0,
        }
    }

    /// Freeze the bucket into a row.
    pub fn seal(self, created_at: DateTime<Utc>) -> HourlyRow {
        let activity_pct = activity_pct(self.idle_seconds, self.sample_count);
        HourlyRow {
            hour_start: self.hour_start,
            activity_pct,
            idle_seconds: self.idle_seconds,
            samples: self.sample_count,
            status: HourlyStatus::from_activity(activity_pct, self.sample_count),
            created_at,
        }
    }
}

/// A sealed hour, ready for the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRow {
    pub hour_start: DateTime<Utc>,
    pub activity_pct: f64,
    pub idle_seconds: f64,
    pub samples: u64,
    pub status: HourlyStatus,
    pub created_at: DateTime<Utc>,
}

impl HourlyRow {
    /// `YYYY-MM-DDTHH:00:00Z`, the row's key in the store.
    pub fn hour_label(&self) -> String {
        self.hour_start.format("%Y-%m-%dT%H:00:00Z").to_string()
    }
}

/// Rolls hourly buckets forward as ticks arrive.
#[derive(Debug, Clone)]
pub struct HourlyAggregator {
    bucket: HourlyBucket,
    active_idle_threshold: std::time::Duration,
    tick_seconds: f64,
}

impl HourlyAggregator {
    /// Start aggregating at the hour containing `now`.
    ///
    /// Each tick whose idle time is at or above `active_idle_threshold` adds
    /// one `tick_interval` worth of idle seconds to the bucket.
    pub fn new(
        now: DateTime<Utc>,
        active_idle_threshold: std::time::Duration,
        tick_interval: std::time::Duration,
    ) -> Self {
        Self {
            bucket: HourlyBucket::starting_at(now),
            active_idle_threshold,
            tick_seconds: tick_interval.as_secs_f64(),
        }
    }

    /// Seal the current bucket if `now` is in a later hour.
    ///
    /// Returns the sealed row; the replacement bucket is already empty when
    /// this returns.
    pub fn roll(&mut self, now: DateTime<Utc>) -> Option<HourlyRow> {
        let current_hour = truncate_to_hour(now);
        if current_hour <= self.bucket.hour_start {
            return None;
        }
        let sealed = std::mem::replace(&mut self.bucket, HourlyBucket::starting_at(now));
        Some(sealed.seal(now))
    }

    /// Count one successful idle reading.
    pub fn record(&mut self, idle: std::time::Duration) {
        self.bucket.sample_count += 1;
        if idle >= self.active_idle_threshold {
            self.bucket.idle_seconds += self.tick_seconds;
        }
    }

    /// The bucket currently being filled.
    pub fn current(&self) -> &HourlyBucket {
        &self.bucket
    }
}
