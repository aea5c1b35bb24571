//! macOS implementation of the activity source.
//!
//! Idle time is read from the combined-session event source, which reports
//! seconds since the last input of any kind. The cursor position is the
//! location of a freshly created (never posted) event.

use crate::source::types::{CursorPos, SourceError};
use crate::source::ActivitySource;
use core_graphics::event::CGEvent;
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use std::time::Duration;

/// `kCGAnyInputEventType`
const ANY_INPUT_EVENT_TYPE: u32 = !0;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventSourceSecondsSinceLastEventType(
        state_id: CGEventSourceStateID,
        event_type: u32,
    ) -> f64;
}

/// Activity source backed by CoreGraphics event sources.
#[derive(Debug, Default)]
pub struct MacOSSource {
    _private: (),
}

impl MacOSSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySource for MacOSSource {
    fn idle_duration(&mut self) -> Result<Duration, SourceError> {
        let secs = unsafe {
            CGEventSourceSecondsSinceLastEventType(
                CGEventSourceStateID::CombinedSessionState,
                ANY_INPUT_EVENT_TYPE,
            )
        };
        if !secs.is_finite() || secs < 0.0 {
            return Err(SourceError::os(
                "CGEventSourceSecondsSinceLastEventType",
                format!("unexpected value {secs}"),
            ));
        }
        Ok(Duration::from_secs_f64(secs))
    }

    fn cursor_position(&mut self) -> Result<CursorPos, SourceError> {
        let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)
            .map_err(|_| SourceError::os("CGEventSourceCreate", "returned null"))?;
        let event = CGEvent::new(source)
            .map_err(|_| SourceError::os("CGEventCreate", "returned null"))?;
        let location = event.location();
        Ok(CursorPos::new(location.x.round() as i32, location.y.round() as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_creation() {
        let mut source = MacOSSource::new();
        if let Ok(idle) = source.idle_duration() {
            assert!(idle.as_secs_f64() >= 0.0);
        }
    }
}
