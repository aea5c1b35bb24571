//! Activity Monitor - workstation input-activity monitor.
//!
//! Samples how long the user has been idle and where the cursor is, keeps a
//! sliding window of active/inactive samples, and classifies the workstation
//! into a productivity mode. Everything observed is written to a
//! human-readable log rotated per local calendar day. Optionally, idle time
//! is aggregated per UTC hour and each finished hour is upserted into an
//! rqlite node.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Activity Monitor                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Source    │──▶│   Window    │──▶│    Mode     │        │
//! │  │ (idle, pos) │   │  (ratio)    │   │ (classify)  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐        │
//! │  │   Hourly    │                     │  Activity   │        │
//! │  │ Aggregator  │──▶ upload worker ──▶│    Log      │        │
//! │  └─────────────┘     (rqlite)        └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use activity_monitor::{core, source, ActivityLog};
//!
//! let log = ActivityLog::open_shared("/tmp/activity", "activity").unwrap();
//! let settings = core::MonitorSettings::default();
//! let monitor = core::Monitor::new(
//!     settings,
//!     source::platform_source(),
//!     log,
//!     core::HourlySink::LocalOnly,
//! )
//! .expect("cursor position unavailable");
//!
//! let (_stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
//! monitor.run(&stop_rx);
//! ```

pub mod activity_log;
pub mod config;
pub mod core;
pub mod remote;
pub mod source;

// Re-export key types at crate root for convenience
pub use activity_log::{ActivityLog, LogError, LogEvent, SharedActivityLog};
pub use config::{Config, ConfigError, RemoteConfig};
pub use core::{
    HourlyAggregator, HourlyRow, HourlySink, HourlyStatus, Mode, ModeThresholds, Monitor,
    MonitorError, MonitorSettings, SlidingWindow,
};
pub use remote::{HourlyStore, RemoteError, UploadWorker};
pub use source::{ActivitySource, CursorPos, ScriptedSource, SourceError};

#[cfg(feature = "remote")]
pub use remote::{BlockingRemoteStoreClient, RemoteStoreClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
