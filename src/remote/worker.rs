//! Background thread that delivers sealed hourly rows.

use crate::activity_log::{LogEvent, SharedActivityLog};
use crate::core::hourly::HourlyRow;
use crate::remote::HourlyStore;
use chrono::Local;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::thread::{self, JoinHandle};

/// Rows waiting for delivery beyond the one in flight.
pub const UPLOAD_QUEUE_CAPACITY: usize = 4;

/// Hands rows to an [`HourlyStore`] off the sampling thread.
///
/// The queue is bounded; when it is full the row is dropped and the drop is
/// logged. Failed uploads are logged and never retried.
pub struct UploadWorker {
    sender: Option<Sender<HourlyRow>>,
    handle: Option<JoinHandle<()>>,
    log: SharedActivityLog,
}

impl UploadWorker {
    /// Start the worker thread.
    pub fn spawn(store: Box<dyn HourlyStore>, log: SharedActivityLog) -> std::io::Result<Self> {
        let (sender, receiver) = bounded::<HourlyRow>(UPLOAD_QUEUE_CAPACITY);
        let worker_log = log.clone();

        let handle = thread::Builder::new()
            .name("hourly-upload".to_string())
            .spawn(move || {
                tracing::debug!("upload worker started");
                for row in receiver {
                    deliver(store.as_ref(), &worker_log, &row);
                }
                tracing::debug!("upload worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            log,
        })
    }

    /// Queue a row for delivery. Returns false if it was dropped.
    pub fn submit(&self, row: HourlyRow) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };

        match sender.try_send(row) {
            Ok(()) => true,
            Err(TrySendError::Full(row)) => {
                tracing::warn!(hour = %row.hour_label(), "upload queue full, dropping hourly row");
                write(&self.log, &LogEvent::UpsertDropped(&row));
                false
            }
            Err(TrySendError::Disconnected(row)) => {
                tracing::warn!(hour = %row.hour_label(), "upload worker gone, dropping hourly row");
                write(&self.log, &LogEvent::UpsertDropped(&row));
                false
            }
        }
    }

    /// Stop accepting rows and wait for queued ones to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("upload worker panicked");
            }
        }
    }
}

impl Drop for UploadWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn deliver(store: &dyn HourlyStore, log: &SharedActivityLog, row: &HourlyRow) {
    match store.upsert(row) {
        Ok(()) => {
            tracing::info!(hour = %row.hour_label(), status = %row.status, "hourly row stored");
            write(log, &LogEvent::UpsertOk(row));
        }
        Err(e) => {
            tracing::warn!(hour = %row.hour_label(), error = %e, "hourly upsert failed");
            write(log, &LogEvent::UpsertError { row, error: &e });
        }
    }
}

fn write(log: &SharedActivityLog, event: &LogEvent<'_>) {
    if let Err(e) = log.append(&event.render(Local::now())) {
        tracing::warn!(error = %e, "failed to write activity log line");
    }
}
