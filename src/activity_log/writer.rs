//! Date-partitioned append log.
//!
//! One file per local calendar date, named `<base>-YYYY-MM-DD.log`. The
//! writer holds at most one open handle; crossing midnight syncs and closes
//! the old file before the new one is opened. Files are always opened in
//! append mode so a restart on the same day continues the existing file.

use chrono::{DateTime, Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Errors raised by the activity log.
#[derive(Debug)]
pub enum LogError {
    /// The log directory could not be created.
    CreateDir { path: PathBuf, source: std::io::Error },
    /// A day file could not be opened.
    Open { path: PathBuf, source: std::io::Error },
    /// Writing or syncing the open file failed.
    Io(std::io::Error),
    /// No file is open (a previous rotation failed or the log was closed).
    Closed,
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::CreateDir { path, source } => {
                write!(f, "Cannot create log directory {}: {source}", path.display())
            }
            LogError::Open { path, source } => {
                write!(f, "Cannot open log file {}: {source}", path.display())
            }
            LogError::Io(e) => write!(f, "Log IO error: {e}"),
            LogError::Closed => write!(f, "Log file is not open"),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::CreateDir { source, .. } | LogError::Open { source, .. } => Some(source),
            LogError::Io(e) => Some(e),
            LogError::Closed => None,
        }
    }
}

#[derive(Debug)]
enum LogState {
    Closed,
    Open { date: NaiveDate, file: File },
}

/// Rotating, internally serialized activity log.
#[derive(Debug)]
pub struct ActivityLog {
    dir: PathBuf,
    base: String,
    state: Mutex<LogState>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

impl ActivityLog {
    /// Create the log directory and open today's file.
    pub fn open(dir: impl Into<PathBuf>, base: impl Into<String>) -> Result<Self, LogError> {
        Self::open_at(dir, base, Local::now())
    }

    /// Like [`ActivityLog::open`], with an explicit clock reading.
    pub fn open_at(
        dir: impl Into<PathBuf>,
        base: impl Into<String>,
        now: DateTime<Local>,
    ) -> Result<Self, LogError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| LogError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let log = Self {
            dir,
            base: base.into(),
            state: Mutex::new(LogState::Closed),
        };
        {
            let mut state = log.lock();
            log.rotate_if_needed(&mut state, now.date_naive())?;
        }
        Ok(log)
    }

    /// Open a shared log.
    pub fn open_shared(
        dir: impl Into<PathBuf>,
        base: impl Into<String>,
    ) -> Result<SharedActivityLog, LogError> {
        Self::open(dir, base).map(Arc::new)
    }

    /// Directory holding the day files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name prefix.
    pub fn base_name(&self) -> &str {
        &self.base
    }

    /// Path of the file for a given date.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        day_file_path(&self.dir, &self.base, date)
    }

    /// Date of the currently open file, if any.
    pub fn current_date(&self) -> Option<NaiveDate> {
        match &*self.lock() {
            LogState::Open { date, .. } => Some(*date),
            LogState::Closed => None,
        }
    }

    /// Append one line, rotating first if the local date changed.
    pub fn append(&self, line: &str) -> Result<(), LogError> {
        self.append_at(Local::now(), line)
    }

    /// Append one line as of `now`.
    pub fn append_at(&self, now: DateTime<Local>, line: &str) -> Result<(), LogError> {
        let mut state = self.lock();
        self.rotate_if_needed(&mut state, now.date_naive())?;

        match &mut *state {
            LogState::Open { file, .. } => {
                let mut buf = Vec::with_capacity(line.len() + 1);
                buf.extend_from_slice(line.as_bytes());
                buf.push(b'\n');
                file.write_all(&buf).map_err(LogError::Io)
            }
            LogState::Closed => Err(LogError::Closed),
        }
    }

    /// Force written lines to durable storage.
    pub fn flush(&self) -> Result<(), LogError> {
        match &*self.lock() {
            LogState::Open { file, .. } => file.sync_data().map_err(LogError::Io),
            LogState::Closed => Ok(()),
        }
    }

    /// Sync and release the current file. A later append reopens.
    pub fn close(&self) -> Result<(), LogError> {
        let mut state = self.lock();
        let previous = std::mem::replace(&mut *state, LogState::Closed);
        if let LogState::Open { file, .. } = previous {
            file.sync_all().map_err(LogError::Io)?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        // A panic mid-write leaves at worst a partial line; keep logging.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn rotate_if_needed(&self, state: &mut LogState, date: NaiveDate) -> Result<(), LogError> {
        if let LogState::Open { date: open_date, .. } = state {
            if *open_date == date {
                return Ok(());
            }
        }

        if let LogState::Open { file, date: old } = std::mem::replace(state, LogState::Closed) {
            if let Err(e) = file.sync_all() {
                tracing::warn!(date = %old, error = %e, "sync before rotation failed");
            }
            drop(file);
        }

        let path = self.path_for(date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "opened activity log");
        *state = LogState::Open { date, file };
        Ok(())
    }
}

/// `<dir>/<base>-YYYY-MM-DD.log`
pub fn day_file_path(dir: &Path, base: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{base}-{}.log", date.format("%Y-%m-%d")))
}
