//! Sliding activity window.
//!
//! Samples are kept for a fixed wall-clock span rather than a fixed count, so
//! the ratio stays correct when ticks arrive late, coalesce, or skip.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// One activity observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub is_active: bool,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, is_active: bool) -> Self {
        Self {
            timestamp,
            is_active,
        }
    }
}

/// Time-bounded sample history with an incrementally maintained active count.
///
/// Invariants after every `push`:
/// - timestamps are non-decreasing from front to back
/// - every sample satisfies `timestamp >= newest - window_size`
/// - `active_count` equals the number of active samples held
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window_size: Duration,
    samples: VecDeque<Sample>,
    active_count: usize,
}

impl SlidingWindow {
    /// Create an empty window spanning `window_size`.
    pub fn new(window_size: std::time::Duration) -> Self {
        Self {
            window_size: Duration::from_std(window_size).unwrap_or(Duration::MAX),
            samples: VecDeque::new(),
            active_count: 0,
        }
    }

    /// Append the newest sample and evict everything older than the window.
    ///
    /// A sample stamped earlier than the current newest (wall clock stepped
    /// backwards) is recorded at the newest timestamp instead.
    pub fn push(&mut self, mut sample: Sample) {
        if let Some(newest) = self.samples.back() {
            if sample.timestamp < newest.timestamp {
                sample.timestamp = newest.timestamp;
            }
        }

        if sample.is_active {
            self.active_count += 1;
        }
        self.samples.push_back(sample);

        self.evict_before(sample.timestamp);
    }

    fn evict_before(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.window_size) else {
            return;
        };
        while let Some(front) = self.samples.front() {
            if front.timestamp >= cutoff {
                break;
            }
            if front.is_active {
                self.active_count -= 1;
            }
            self.samples.pop_front();
        }
    }

    /// Fraction of held samples that are active, 0 when empty.
    pub fn active_ratio(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.active_count as f64 / self.samples.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Oldest sample still inside the window.
    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }
}
