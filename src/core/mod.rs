//! Core functionality for the activity monitor.
//!
//! This module contains:
//! - The sliding activity window and its ratio
//! - Mode classification from idle time and ratio
//! - Hourly aggregation of idle time
//! - The monitor loop tying sampling, logging and upload together

pub mod hourly;
pub mod mode;
pub mod monitor;
pub mod window;

// Re-export commonly used types
pub use hourly::{HourlyAggregator, HourlyBucket, HourlyRow, HourlyStatus};
pub use mode::{Mode, ModeThresholds};
pub use monitor::{HourlySink, Monitor, MonitorError, MonitorSettings};
pub use window::{Sample, SlidingWindow};
