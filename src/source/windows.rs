//! Windows implementation of the activity source.
//!
//! Idle time comes from `GetLastInputInfo`, whose timestamp is a 32-bit
//! millisecond tick that wraps roughly every 49.7 days, compared against
//! `GetTickCount64`. Cursor position comes from `GetCursorPos`.

use crate::source::types::{idle_millis_since, CursorPos, SourceError};
use crate::source::ActivitySource;
use std::time::Duration;
use windows::Win32::Foundation::POINT;
use windows::Win32::System::SystemInformation::GetTickCount64;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO};
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

/// Activity source backed by the Win32 input APIs.
#[derive(Debug, Default)]
pub struct WindowsSource {
    _private: (),
}

impl WindowsSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySource for WindowsSource {
    fn idle_duration(&mut self) -> Result<Duration, SourceError> {
        let mut info = LASTINPUTINFO {
            cbSize: std::mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };

        let ok = unsafe { GetLastInputInfo(&mut info) };
        if !ok.as_bool() {
            let err = windows::core::Error::from_win32();
            return Err(SourceError::os("GetLastInputInfo", err.message()));
        }

        let now = unsafe { GetTickCount64() };
        Ok(Duration::from_millis(idle_millis_since(now, info.dwTime)))
    }

    fn cursor_position(&mut self) -> Result<CursorPos, SourceError> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| SourceError::os("GetCursorPos", e.message()))?;
        Ok(CursorPos::new(point.x, point.y))
    }
}
