//! Fallback activity source for platforms without a backend.
//!
//! This exists so the crate (and binary) can compile on targets other than
//! Windows and macOS. Every query fails, which makes `start` stop at the
//! initial cursor read instead of logging fabricated activity.

use crate::source::types::{CursorPos, SourceError};
use crate::source::ActivitySource;
use std::time::Duration;

/// A source that never answers.
#[derive(Debug, Default)]
pub struct UnsupportedSource {
    _private: (),
}

impl UnsupportedSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySource for UnsupportedSource {
    fn idle_duration(&mut self) -> Result<Duration, SourceError> {
        Err(SourceError::Unsupported)
    }

    fn cursor_position(&mut self) -> Result<CursorPos, SourceError> {
        Err(SourceError::Unsupported)
    }
}
