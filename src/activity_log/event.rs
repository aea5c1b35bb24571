//! Text of every line the monitor writes to the activity log.
//!
//! Each line is `[<RFC3339 timestamp>] <body>`. The bodies are parsed by
//! people and by grep, so their spacing is fixed.

use crate::core::hourly::HourlyRow;
use crate::core::mode::Mode;
use crate::source::{CursorPos, SourceError};
use chrono::{DateTime, Local, SecondsFormat};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// One loggable occurrence.
#[derive(Debug, Clone)]
pub enum LogEvent<'a> {
    Start {
        dir: &'a Path,
        base: &'a str,
    },
    RemoteSink {
        host: &'a str,
        user: &'a str,
        endpoint: &'a str,
    },
    MouseMove {
        pos: CursorPos,
        delta: (i32, i32),
    },
    ModeChange {
        mode: Mode,
        idle: Duration,
        active_ratio: f64,
        samples: usize,
    },
    Status {
        mode: Mode,
        idle: Duration,
        active_ratio: f64,
        samples: usize,
    },
    CursorError(&'a SourceError),
    IdleError(&'a SourceError),
    UpsertOk(&'a HourlyRow),
    UpsertError {
        row: &'a HourlyRow,
        error: &'a dyn std::error::Error,
    },
    UpsertDropped(&'a HourlyRow),
    Stop,
}

impl LogEvent<'_> {
    /// Render the full line, timestamp prefix included.
    pub fn render(&self, at: DateTime<Local>) -> String {
        format!(
            "[{}] {}",
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self
        )
    }
}

impl fmt::Display for LogEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::Start { dir, base } => write!(
                f,
                "START (logs in {} as {base}-YYYY-MM-DD.log)",
                dir.display()
            ),
            LogEvent::RemoteSink {
                host,
                user,
                endpoint,
            } => write!(f, "REMOTE SINK: host={host} user={user} endpoint={endpoint}"),
            LogEvent::MouseMove { pos, delta } => write!(
                f,
                "MOUSE MOVE: ({},{}) delta=({},{})",
                pos.x, pos.y, delta.0, delta.1
            ),
            LogEvent::ModeChange {
                mode,
                idle,
                active_ratio,
                samples,
            } => write!(
                f,
                "MODE CHANGE: {mode}  idleNow={}  activeRatio={:.0}%  samples={samples}",
                format_duration(*idle),
                active_ratio * 100.0
            ),
            LogEvent::Status {
                mode,
                idle,
                active_ratio,
                samples,
            } => write!(
                f,
                "STATUS: mode={mode}  idleNow={}  activeRatio={:.0}%  samples={samples}",
                format_duration(*idle),
                active_ratio * 100.0
            ),
            LogEvent::CursorError(e) => write!(f, "CURSOR ERROR: {e}"),
            LogEvent::IdleError(e) => write!(f, "IDLE ERROR: {e}"),
            LogEvent::UpsertOk(row) => write!(
                f,
                "UPSERT OK: hour={} activity={:.0}% idleSeconds={:.0} samples={} status={}",
                row.hour_label(),
                row.activity_pct,
                row.idle_seconds,
                row.samples,
                row.status
            ),
            LogEvent::UpsertError { row, error } => {
                write!(f, "UPSERT ERROR: hour={} {error}", row.hour_label())
            }
            LogEvent::UpsertDropped(row) => write!(
                f,
                "UPSERT DROPPED: hour={} (upload queue full)",
                row.hour_label()
            ),
            LogEvent::Stop => write!(f, "STOP"),
        }
    }
}

/// Compact duration text: `0s`, `800ns`, `1.5µs`, `250ms`, `1.5s`, `1m30s`,
/// `2h0m5s`.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_micros(1) {
        return format!("{}ns", d.as_nanos());
    }
    let total_ms = d.as_millis();
    if total_ms == 0 {
        let nanos = d.subsec_nanos();
        return format!("{}µs", with_fraction(u128::from(nanos / 1000), nanos % 1000));
    }
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&with_fraction(secs, millis as u32));
    out.push('s');
    out
}

/// `whole` followed by a three-digit fraction with trailing zeros trimmed.
fn with_fraction(whole: u128, thousandths: u32) -> String {
    if thousandths == 0 {
        return whole.to_string();
    }
    let frac = format!("{thousandths:03}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hourly::HourlyStatus;
    use crate::remote::RemoteError;
    use chrono::{TimeZone, Utc};

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 2, 7, 9, 15, 30).unwrap()
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.234s");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(7205)), "2h0m5s");
    }

    #[test]
    fn test_sub_millisecond_durations() {
        assert_eq!(format_duration(Duration::from_nanos(800)), "800ns");
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_micros(3)), "3µs");
        assert_eq!(format_duration(Duration::from_nanos(999_999)), "999.999µs");
    }

    #[test]
    fn test_timestamp_prefix() {
        let line = LogEvent::Stop.render(at());
        assert!(line.starts_with("[2026-02-07T09:15:30"));
        assert!(line.ends_with("] STOP"));
    }

    #[test]
    fn test_start_line() {
        let dir = Path::new("/var/log/am");
        let event = LogEvent::Start {
            dir,
            base: "activity",
        };
        assert_eq!(
            event.to_string(),
            "START (logs in /var/log/am as activity-YYYY-MM-DD.log)"
        );
    }

    #[test]
    fn test_mouse_move_line() {
        let event = LogEvent::MouseMove {
            pos: CursorPos::new(640, 480),
            delta: (-12, 3),
        };
        assert_eq!(event.to_string(), "MOUSE MOVE: (640,480) delta=(-12,3)");
    }

    #[test]
    fn test_mode_and_status_lines() {
        let change = LogEvent::ModeChange {
            mode: Mode::HighProductive,
            idle: Duration::from_secs(3),
            active_ratio: 0.75,
            samples: 120,
        };
        assert_eq!(
            change.to_string(),
            "MODE CHANGE: HIGH_PRODUCTIVE  idleNow=3s  activeRatio=75%  samples=120"
        );

        let status = LogEvent::Status {
            mode: Mode::Idle,
            idle: Duration::from_secs(95),
            active_ratio: 0.1,
            samples: 10,
        };
        assert_eq!(
            status.to_string(),
            "STATUS: mode=IDLE  idleNow=1m35s  activeRatio=10%  samples=10"
        );
    }

    #[test]
    fn test_upsert_lines() {
        let row = HourlyRow {
            hour_start: Utc.with_ymd_and_hms(2026, 2, 7, 8, 0, 0).unwrap(),
            activity_pct: 44.44,
            idle_seconds: 2000.0,
            samples: 3600,
            status: HourlyStatus::Low,
            created_at: Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 1).unwrap(),
        };
        assert_eq!(
            LogEvent::UpsertOk(&row).to_string(),
            "UPSERT OK: hour=2026-02-07T08:00:00Z activity=44% idleSeconds=2000 samples=3600 status=LOW"
        );

        let error = RemoteError::Server {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(
            LogEvent::UpsertError {
                row: &row,
                error: &error
            }
            .to_string(),
            "UPSERT ERROR: hour=2026-02-07T08:00:00Z Remote store returned HTTP 503: unavailable"
        );
    }
}
