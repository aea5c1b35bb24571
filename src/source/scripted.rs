//! Deterministic activity source that replays scripted readings.
//!
//! Each query pops the next scripted reading; once a script runs dry the last
//! reading is repeated, so a short script describes a steady state.

use crate::source::types::{CursorPos, SourceError};
use crate::source::ActivitySource;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Script<T> {
    pending: VecDeque<Result<T, SourceError>>,
    last: Option<Result<T, SourceError>>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            last: None,
        }
    }

    fn push(&mut self, reading: Result<T, SourceError>) {
        self.pending.push_back(reading);
    }

    fn next(&mut self, call: &'static str) -> Result<T, SourceError> {
        if let Some(reading) = self.pending.pop_front() {
            self.last = Some(reading.clone());
            return reading;
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(SourceError::os(call, "script is empty")))
    }
}

/// Scripted replacement for an OS backend.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    idle: Script<Duration>,
    cursor: Script<CursorPos>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            idle: Script::new(),
            cursor: Script::new(),
        }
    }

    /// Append idle readings.
    pub fn with_idle<I: IntoIterator<Item = Duration>>(mut self, readings: I) -> Self {
        for reading in readings {
            self.idle.push(Ok(reading));
        }
        self
    }

    /// Append cursor readings.
    pub fn with_cursor<I: IntoIterator<Item = CursorPos>>(mut self, readings: I) -> Self {
        for reading in readings {
            self.cursor.push(Ok(reading));
        }
        self
    }

    /// Append a failing idle query.
    pub fn with_idle_error(mut self, message: &str) -> Self {
        self.idle.push(Err(SourceError::os("scripted idle", message)));
        self
    }

    /// Append a failing cursor query.
    pub fn with_cursor_error(mut self, message: &str) -> Self {
        self.cursor.push(Err(SourceError::os("scripted cursor", message)));
        self
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivitySource for ScriptedSource {
    fn idle_duration(&mut self) -> Result<Duration, SourceError> {
        self.idle.next("scripted idle")
    }

    fn cursor_position(&mut self) -> Result<CursorPos, SourceError> {
        self.cursor.next("scripted cursor")
    }
}
