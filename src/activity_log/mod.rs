//! Human-auditable activity log.
//!
//! Everything the monitor observes ends up here as one timestamped line in a
//! per-day file. [`ActivityLog`] owns the file handle and its rotation;
//! [`LogEvent`] owns the exact text of each line.

pub mod event;
pub mod writer;

// Re-export commonly used types
pub use event::{format_duration, LogEvent};
pub use writer::{ActivityLog, LogError, SharedActivityLog};
