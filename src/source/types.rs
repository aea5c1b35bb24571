//! Value types shared by every activity source backend.

use serde::{Deserialize, Serialize};

/// Span of the 32-bit millisecond tick counter used for last-input stamps.
const TICK_SPAN: u64 = 1 << 32;

/// Cursor position in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorPos {
    pub x: i32,
    pub y: i32,
}

impl CursorPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Movement from `previous` to `self`.
    pub fn delta_from(&self, previous: CursorPos) -> (i32, i32) {
        (
            self.x.wrapping_sub(previous.x),
            self.y.wrapping_sub(previous.y),
        )
    }
}

/// Milliseconds elapsed between a 32-bit last-input tick and the current
/// 64-bit tick count.
///
/// Only the low 32 bits of `now_tick` are comparable with `last_input_tick`.
/// When they are numerically smaller the counter has wrapped since the last
/// input.
pub fn idle_millis_since(now_tick: u64, last_input_tick: u32) -> u64 {
    let now32 = now_tick & (TICK_SPAN - 1);
    let last = u64::from(last_input_tick);
    if now32 >= last {
        now32 - last
    } else {
        (TICK_SPAN - last) + now32
    }
}

/// Errors that can occur while querying input activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The underlying OS call failed.
    OsQuery { call: &'static str, message: String },
    /// No backend exists for this platform.
    Unsupported,
}

impl SourceError {
    pub fn os(call: &'static str, message: impl Into<String>) -> Self {
        SourceError::OsQuery {
            call,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::OsQuery { call, message } => write!(f, "{call} failed: {message}"),
            SourceError::Unsupported => {
                write!(f, "Input activity queries are not supported on this platform")
            }
        }
    }
}

impl std::error::Error for SourceError {}
