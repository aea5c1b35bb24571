//! Productivity mode classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Discretized productivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    HighProductive,
    SimpleProductive,
    Idle,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::HighProductive => "HIGH_PRODUCTIVE",
            Mode::SimpleProductive => "SIMPLE_PRODUCTIVE",
            Mode::Idle => "IDLE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for [`ModeThresholds::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeThresholds {
    pub continuous_idle: Duration,
    pub high_productive_ratio: f64,
    pub simple_productive_ratio: f64,
}

impl ModeThresholds {
    /// Map the current idle time and window ratio to a mode.
    ///
    /// Rules are checked in order and the first match wins. Every comparison
    /// is inclusive on the qualifying side.
    pub fn classify(&self, idle_now: Duration, active_ratio: f64) -> Mode {
        if idle_now >= self.continuous_idle {
            Mode::Idle
        } else if active_ratio >= self.high_productive_ratio {
            Mode::HighProductive
        } else if active_ratio >= self.simple_productive_ratio {
            Mode::SimpleProductive
        } else {
            Mode::Idle
        }
    }
}

impl Default for ModeThresholds {
    fn default() -> Self {
        Self {
            continuous_idle: Duration::from_secs(30 * 60),
            high_productive_ratio: 0.60,
            simple_productive_ratio: 0.30,
        }
    }
}
