//! Input-activity sources for the activity monitor.
//!
//! A source answers two questions: how long since the last keyboard/mouse
//! input, and where the cursor is. Platform backends are selected at compile
//! time; the monitor only ever sees the [`ActivitySource`] trait, so a
//! [`ScriptedSource`] can stand in for the OS in tests.

pub mod scripted;
pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub mod unsupported;

use std::time::Duration;

// Re-export commonly used types
pub use scripted::ScriptedSource;
pub use types::{idle_millis_since, CursorPos, SourceError};

/// Capability set the monitor samples on every tick.
pub trait ActivitySource {
    /// Time elapsed since the last keyboard or mouse input.
    fn idle_duration(&mut self) -> Result<Duration, SourceError>;

    /// Current cursor position in screen coordinates.
    fn cursor_position(&mut self) -> Result<CursorPos, SourceError>;
}

impl<T: ActivitySource + ?Sized> ActivitySource for Box<T> {
    fn idle_duration(&mut self) -> Result<Duration, SourceError> {
        (**self).idle_duration()
    }

    fn cursor_position(&mut self) -> Result<CursorPos, SourceError> {
        (**self).cursor_position()
    }
}

#[cfg(target_os = "macos")]
pub use macos::MacOSSource;

/// Platform-agnostic source type alias
#[cfg(target_os = "macos")]
pub type PlatformSource = MacOSSource;

#[cfg(target_os = "windows")]
pub use windows::WindowsSource;

/// Platform-agnostic source type alias
#[cfg(target_os = "windows")]
pub type PlatformSource = WindowsSource;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub use unsupported::UnsupportedSource;

/// Platform-agnostic source type alias
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub type PlatformSource = UnsupportedSource;

/// Construct the backend for the current platform.
pub fn platform_source() -> PlatformSource {
    PlatformSource::new()
}
