//! The monitor loop.
//!
//! One thread owns the window, the previous mode and the hourly bucket. It
//! waits on three channels (sample ticks, flush ticks, shutdown) and does
//! all of its work between those waits. Only the activity log is shared,
//! with the upload worker.

use crate::activity_log::{LogEvent, SharedActivityLog};
use crate::config::Config;
use crate::core::hourly::{HourlyAggregator, HourlyBucket};
use crate::core::mode::{Mode, ModeThresholds};
use crate::core::window::{Sample, SlidingWindow};
use crate::remote::UploadWorker;
use crate::source::{ActivitySource, CursorPos, SourceError};
use chrono::{DateTime, Local, Utc};
use crossbeam_channel::{select, tick, Receiver};
use std::time::Duration;

/// Timing and threshold settings for [`Monitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub sample_interval: Duration,
    pub window_size: Duration,
    pub active_idle_threshold: Duration,
    pub thresholds: ModeThresholds,
    pub status_interval: Duration,
    pub mouse_move_interval: Duration,
    pub flush_interval: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sample_interval: config.sample_interval,
            window_size: config.window_size,
            active_idle_threshold: config.active_idle_threshold,
            thresholds: ModeThresholds {
                continuous_idle: config.continuous_idle_threshold,
                high_productive_ratio: config.high_productive_ratio,
                simple_productive_ratio: config.simple_productive_ratio,
            },
            status_interval: config.status_interval,
            mouse_move_interval: config.mouse_move_interval,
            flush_interval: config.flush_interval,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where sealed hours go.
pub enum HourlySink {
    /// Daily log only; no hourly aggregation.
    LocalOnly,
    /// Daily log plus hourly rows shipped through an upload worker.
    Remote {
        aggregator: HourlyAggregator,
        uploader: UploadWorker,
        endpoint: String,
    },
}

impl HourlySink {
    /// Remote sink whose first bucket is the hour containing `now`.
    pub fn remote(
        now: DateTime<Utc>,
        settings: &MonitorSettings,
        uploader: UploadWorker,
        endpoint: impl Into<String>,
    ) -> Self {
        HourlySink::Remote {
            aggregator: HourlyAggregator::new(
                now,
                settings.active_idle_threshold,
                settings.sample_interval,
            ),
            uploader,
            endpoint: endpoint.into(),
        }
    }
}

/// Errors that stop the monitor from starting.
#[derive(Debug)]
pub enum MonitorError {
    /// Without a first cursor reading there is no baseline to detect motion.
    InitialCursor(SourceError),
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::InitialCursor(e) => {
                write!(f, "Cannot read initial cursor position: {e}")
            }
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::InitialCursor(e) => Some(e),
        }
    }
}

/// Samples an [`ActivitySource`] and records what it sees.
pub struct Monitor<S> {
    settings: MonitorSettings,
    source: S,
    log: SharedActivityLog,
    window: SlidingWindow,
    sink: HourlySink,
    last_mode: Option<Mode>,
    last_status_at: Option<DateTime<Local>>,
    last_cursor: CursorPos,
    last_mouse_log_at: Option<DateTime<Local>>,
}

impl<S: ActivitySource> Monitor<S> {
    /// Create a monitor, taking the baseline cursor reading.
    pub fn new(
        settings: MonitorSettings,
        mut source: S,
        log: SharedActivityLog,
        sink: HourlySink,
    ) -> Result<Self, MonitorError> {
        let last_cursor = match source.cursor_position() {
            Ok(pos) => pos,
            Err(e) => {
                let now = Local::now();
                let line = LogEvent::CursorError(&e).render(now);
                if let Err(log_err) = log.append_at(now, &line) {
                    tracing::warn!(error = %log_err, "failed to write activity log line");
                }
                return Err(MonitorError::InitialCursor(e));
            }
        };

        Ok(Self {
            window: SlidingWindow::new(settings.window_size),
            settings,
            source,
            log,
            sink,
            last_mode: None,
            last_status_at: None,
            last_cursor,
            last_mouse_log_at: None,
        })
    }

    /// Run until `shutdown` fires (or its sender is dropped).
    pub fn run(mut self, shutdown: &Receiver<()>) {
        let sample_ticker = tick(self.settings.sample_interval);
        let flush_ticker = tick(self.settings.flush_interval);

        self.start(Local::now());
        tracing::info!(
            sample_interval = ?self.settings.sample_interval,
            window_size = ?self.settings.window_size,
            "monitor started"
        );

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(flush_ticker) -> _ => self.flush(),
                recv(sample_ticker) -> _ => {
                    self.tick(Local::now());
                }
            }
        }

        self.stop(Local::now());
        tracing::info!("monitor stopped");
    }

    /// Write the START line (and the remote sink line, if any).
    pub fn start(&self, now: DateTime<Local>) {
        self.write(
            now,
            &LogEvent::Start {
                dir: self.log.dir(),
                base: self.log.base_name(),
            },
        );

        if let HourlySink::Remote { endpoint, .. } = &self.sink {
            let host = hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            let user = std::env::var("USERNAME")
                .or_else(|_| std::env::var("USER"))
                .unwrap_or_else(|_| "unknown".to_string());
            self.write(
                now,
                &LogEvent::RemoteSink {
                    host: &host,
                    user: &user,
                    endpoint,
                },
            );
        }
    }

    /// Process one sample tick. Returns the classified mode, or `None` when
    /// the idle query failed and the tick was skipped.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<Mode> {
        let now_utc = now.with_timezone(&Utc);

        if let HourlySink::Remote {
            aggregator,
            uploader,
            ..
        } = &mut self.sink
        {
            if let Some(row) = aggregator.roll(now_utc) {
                tracing::debug!(hour = %row.hour_label(), samples = row.samples, "hour sealed");
                uploader.submit(row);
            }
        }

        self.observe_cursor(now);

        let idle = match self.source.idle_duration() {
            Ok(idle) => idle,
            Err(e) => {
                self.write(now, &LogEvent::IdleError(&e));
                return None;
            }
        };

        if let HourlySink::Remote { aggregator, .. } = &mut self.sink {
            aggregator.record(idle);
        }

        let is_active = idle < self.settings.active_idle_threshold;
        self.window.push(Sample::new(now_utc, is_active));

        let active_ratio = self.window.active_ratio();
        let samples = self.window.len();
        let mode = self.settings.thresholds.classify(idle, active_ratio);

        if self.last_mode != Some(mode) {
            self.write(
                now,
                &LogEvent::ModeChange {
                    mode,
                    idle,
                    active_ratio,
                    samples,
                },
            );
            self.last_mode = Some(mode);
            self.last_status_at = Some(now);
        } else if interval_elapsed(self.last_status_at, now, self.settings.status_interval) {
            self.write(
                now,
                &LogEvent::Status {
                    mode,
                    idle,
                    active_ratio,
                    samples,
                },
            );
            self.last_status_at = Some(now);
        }

        Some(mode)
    }

    fn observe_cursor(&mut self, now: DateTime<Local>) {
        let pos = match self.source.cursor_position() {
            Ok(pos) => pos,
            Err(e) => {
                self.write(now, &LogEvent::CursorError(&e));
                return;
            }
        };

        if pos == self.last_cursor {
            return;
        }

        if interval_elapsed(
            self.last_mouse_log_at,
            now,
            self.settings.mouse_move_interval,
        ) {
            self.write(
                now,
                &LogEvent::MouseMove {
                    pos,
                    delta: pos.delta_from(self.last_cursor),
                },
            );
            self.last_mouse_log_at = Some(now);
        }
        self.last_cursor = pos;
    }

    /// Sync the activity log to disk.
    pub fn flush(&self) {
        tracing::debug!("syncing activity log");
        if let Err(e) = self.log.flush() {
            tracing::warn!(error = %e, "activity log flush failed");
        }
    }

    /// Drain pending uploads, write STOP, then sync and close the log.
    pub fn stop(self, now: DateTime<Local>) {
        let Monitor { sink, log, .. } = self;

        if let HourlySink::Remote { uploader, .. } = sink {
            uploader.shutdown();
        }

        let line = LogEvent::Stop.render(now);
        if let Err(e) = log.append_at(now, &line) {
            tracing::warn!(error = %e, "failed to write STOP line");
        }
        if let Err(e) = log.close() {
            tracing::warn!(error = %e, "activity log close failed");
        }
    }

    /// The sliding window as of the last tick.
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// Most recently logged mode.
    pub fn last_mode(&self) -> Option<Mode> {
        self.last_mode
    }

    /// The hour being aggregated, when the remote sink is enabled.
    pub fn hourly_bucket(&self) -> Option<&HourlyBucket> {
        match &self.sink {
            HourlySink::Remote { aggregator, .. } => Some(aggregator.current()),
            HourlySink::LocalOnly => None,
        }
    }

    fn write(&self, now: DateTime<Local>, event: &LogEvent<'_>) {
        if let Err(e) = self.log.append_at(now, &event.render(now)) {
            tracing::warn!(error = %e, "failed to write activity log line");
        }
    }
}

/// Whether `interval` has passed since `last`. A clock that stepped
/// backwards counts as elapsed.
fn interval_elapsed(
    last: Option<DateTime<Local>>,
    now: DateTime<Local>,
    interval: Duration,
) -> bool {
    match last {
        None => true,
        Some(last) => (now - last)
            .to_std()
            .map_or(true, |elapsed| elapsed >= interval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::ActivityLog;
    use crate::source::ScriptedSource;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t(secs: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            sample_interval: Duration::from_secs(1),
            window_size: Duration::from_secs(10),
            active_idle_threshold: Duration::from_secs(2),
            thresholds: ModeThresholds {
                continuous_idle: Duration::from_secs(60),
                high_productive_ratio: 0.60,
                simple_productive_ratio: 0.30,
            },
            status_interval: Duration::from_secs(5),
            mouse_move_interval: Duration::ZERO,
            flush_interval: Duration::from_secs(5),
        }
    }

    fn open_log(dir: &std::path::Path) -> SharedActivityLog {
        Arc::new(ActivityLog::open_at(dir, "activity", t(0)).unwrap())
    }

    fn lines(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("activity-2026-06-01.log"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn body(line: &str) -> &str {
        line.split_once("] ").map(|(_, b)| b).unwrap_or(line)
    }

    #[test]
    fn test_initial_cursor_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new().with_cursor_error("no desktop");
        let log = open_log(dir.path());
        let result = Monitor::new(settings(), source, log.clone(), HourlySink::LocalOnly);
        assert!(matches!(result, Err(MonitorError::InitialCursor(_))));

        let text = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
            .collect::<String>();
        assert!(text.contains("CURSOR ERROR: scripted cursor failed: no desktop"));
    }

    #[test]
    fn test_mode_change_then_periodic_status() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .with_cursor([CursorPos::new(0, 0)])
            .with_idle([Duration::ZERO]);
        let mut monitor =
            Monitor::new(settings(), source, open_log(dir.path()), HourlySink::LocalOnly).unwrap();

        for i in 1..=11 {
            monitor.tick(t(i));
        }

        let bodies: Vec<String> = lines(dir.path()).iter().map(|l| body(l).to_string()).collect();
        assert_eq!(
            bodies[0],
            "MODE CHANGE: HIGH_PRODUCTIVE  idleNow=0s  activeRatio=100%  samples=1"
        );
        assert_eq!(
            bodies[1],
            "STATUS: mode=HIGH_PRODUCTIVE  idleNow=0s  activeRatio=100%  samples=6"
        );
        // A sample exactly one window old is still held.
        assert_eq!(
            bodies[2],
            "STATUS: mode=HIGH_PRODUCTIVE  idleNow=0s  activeRatio=100%  samples=11"
        );
        assert_eq!(bodies.len(), 3);
    }

    #[test]
    fn test_idle_error_skips_sample() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .with_cursor([CursorPos::new(0, 0)])
            .with_idle([Duration::ZERO])
            .with_idle_error("GetLastInputInfo failed")
            .with_idle([Duration::ZERO]);
        let mut monitor =
            Monitor::new(settings(), source, open_log(dir.path()), HourlySink::LocalOnly).unwrap();

        assert_eq!(monitor.tick(t(1)), Some(Mode::HighProductive));
        assert_eq!(monitor.tick(t(2)), None);
        assert_eq!(monitor.window().len(), 1);
        assert_eq!(monitor.tick(t(3)), Some(Mode::HighProductive));
        assert_eq!(monitor.window().len(), 2);

        let text = lines(dir.path()).join("\n");
        assert!(text.contains("IDLE ERROR: scripted idle failed: GetLastInputInfo failed"));
    }

    #[test]
    fn test_mouse_moves_are_logged_with_delta() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .with_cursor([
                CursorPos::new(100, 100),
                CursorPos::new(100, 100),
                CursorPos::new(110, 95),
            ])
            .with_cursor_error("GetCursorPos failed")
            .with_cursor([CursorPos::new(110, 95)])
            .with_idle([Duration::ZERO]);
        let mut monitor =
            Monitor::new(settings(), source, open_log(dir.path()), HourlySink::LocalOnly).unwrap();

        for i in 1..=4 {
            monitor.tick(t(i));
        }

        let moves: Vec<String> = lines(dir.path())
            .iter()
            .map(|l| body(l).to_string())
            .filter(|b| b.starts_with("MOUSE MOVE") || b.starts_with("CURSOR ERROR"))
            .collect();
        assert_eq!(
            moves,
            vec![
                "MOUSE MOVE: (110,95) delta=(10,-5)".to_string(),
                "CURSOR ERROR: scripted cursor failed: GetCursorPos failed".to_string(),
            ]
        );
    }

    #[test]
    fn test_mouse_move_throttle() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings();
        s.mouse_move_interval = Duration::from_secs(10);
        let source = ScriptedSource::new()
            .with_cursor([
                CursorPos::new(0, 0),
                CursorPos::new(1, 0),
                CursorPos::new(2, 0),
                CursorPos::new(3, 0),
            ])
            .with_idle([Duration::ZERO]);
        let mut monitor =
            Monitor::new(s, source, open_log(dir.path()), HourlySink::LocalOnly).unwrap();

        monitor.tick(t(1));
        monitor.tick(t(2));
        monitor.tick(t(12));

        let moves: Vec<String> = lines(dir.path())
            .iter()
            .map(|l| body(l).to_string())
            .filter(|b| b.starts_with("MOUSE MOVE"))
            .collect();
        // The suppressed move still advances the baseline.
        assert_eq!(
            moves,
            vec![
                "MOUSE MOVE: (1,0) delta=(1,0)".to_string(),
                "MOUSE MOVE: (3,0) delta=(1,0)".to_string(),
            ]
        );
    }

    #[test]
    fn test_local_only_has_no_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .with_cursor([CursorPos::new(0, 0)])
            .with_idle([Duration::ZERO]);
        let monitor =
            Monitor::new(settings(), source, open_log(dir.path()), HourlySink::LocalOnly).unwrap();
        assert!(monitor.hourly_bucket().is_none());
    }

    #[test]
    fn test_stop_writes_terminal_line() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new()
            .with_cursor([CursorPos::new(0, 0)])
            .with_idle([Duration::ZERO]);
        let log = open_log(dir.path());
        let monitor =
            Monitor::new(settings(), source, log.clone(), HourlySink::LocalOnly).unwrap();

        monitor.start(t(0));
        monitor.stop(t(1));

        let all = lines(dir.path());
        assert!(body(&all[0]).starts_with("START (logs in "));
        assert_eq!(body(all.last().unwrap()), "STOP");
        assert_eq!(log.current_date(), None);
    }

    fn fast_settings() -> MonitorSettings {
        MonitorSettings {
            sample_interval: Duration::from_millis(20),
            flush_interval: Duration::from_millis(30),
            ..settings()
        }
    }

    fn all_bodies(dir: &std::path::Path) -> Vec<String> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        paths.sort();
        paths
            .iter()
            .flat_map(|p| {
                std::fs::read_to_string(p)
                    .unwrap()
                    .lines()
                    .map(|l| body(l).to_string())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn spawn_run(dir: &std::path::Path, shutdown: Receiver<()>) -> std::thread::JoinHandle<()> {
        let source = ScriptedSource::new()
            .with_cursor([CursorPos::new(0, 0)])
            .with_idle([Duration::ZERO]);
        let log = ActivityLog::open_shared(dir, "activity").unwrap();
        let monitor = Monitor::new(fast_settings(), source, log, HourlySink::LocalOnly).unwrap();
        std::thread::spawn(move || monitor.run(&shutdown))
    }

    #[test]
    fn test_run_samples_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = spawn_run(dir.path(), stop_rx);

        std::thread::sleep(Duration::from_millis(150));
        // Lines are on disk while the loop is still running.
        assert!(all_bodies(dir.path())
            .iter()
            .any(|b| b.starts_with("MODE CHANGE: HIGH_PRODUCTIVE")));

        stop_tx.send(()).unwrap();
        handle.join().unwrap();

        let all = all_bodies(dir.path());
        assert!(all[0].starts_with("START (logs in "));
        assert_eq!(all.last().map(String::as_str), Some("STOP"));
        assert_eq!(all.iter().filter(|b| b.as_str() == "STOP").count(), 1);
    }

    #[test]
    fn test_run_stops_when_shutdown_sender_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = spawn_run(dir.path(), stop_rx);

        std::thread::sleep(Duration::from_millis(50));
        drop(stop_tx);
        handle.join().unwrap();

        let all = all_bodies(dir.path());
        assert!(all[0].starts_with("START (logs in "));
        assert_eq!(all.last().map(String::as_str), Some("STOP"));
    }

    #[test]
    fn test_interval_elapsed() {
        assert!(interval_elapsed(None, t(0), Duration::from_secs(30)));
        assert!(!interval_elapsed(Some(t(0)), t(29), Duration::from_secs(30)));
        assert!(interval_elapsed(Some(t(0)), t(30), Duration::from_secs(30)));
        assert!(interval_elapsed(Some(t(10)), t(0), Duration::from_secs(30)));
    }
}
