//! Remote store for sealed hourly rows.
//!
//! Rows are upserted into an rqlite node's `activity_hourly` table, keyed by
//! the hour start. Delivery is best effort: one attempt per hour, no retry
//! queue. Uploads run on an [`UploadWorker`] thread so a slow node never
//! delays sampling.

pub mod sql;
pub mod worker;

#[cfg(feature = "remote")]
pub mod client;

use crate::core::hourly::HourlyRow;

// Re-export commonly used types
pub use sql::{check_execute_response, escape_sql_string, upsert_statement, ExecuteResponse};
pub use worker::UploadWorker;

#[cfg(feature = "remote")]
pub use client::{BlockingRemoteStoreClient, RemoteStoreClient};

/// Destination for sealed hourly rows.
pub trait HourlyStore: Send {
    /// Insert or replace the row for `row.hour_start`.
    fn upsert(&self, row: &HourlyRow) -> Result<(), RemoteError>;
}

impl<T: HourlyStore + Sync + ?Sized> HourlyStore for std::sync::Arc<T> {
    fn upsert(&self, row: &HourlyRow) -> Result<(), RemoteError> {
        (**self).upsert(row)
    }
}

/// Remote store error types.
#[derive(Debug)]
pub enum RemoteError {
    /// Configuration error
    Config(String),
    /// Network/HTTP transport error
    Network(String),
    /// Non-2xx response
    Server { status: u16, message: String },
    /// Response body was not the expected JSON
    Serialization(String),
    /// Top-level `error` field in the response
    Rejected(String),
    /// Per-statement `error` field in the response
    Statement { index: usize, message: String },
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Config(msg) => write!(f, "Remote config error: {msg}"),
            RemoteError::Network(msg) => write!(f, "Remote network error: {msg}"),
            RemoteError::Server { status, message } => {
                write!(f, "Remote store returned HTTP {status}: {message}")
            }
            RemoteError::Serialization(msg) => write!(f, "Cannot parse remote response: {msg}"),
            RemoteError::Rejected(msg) => write!(f, "Remote execute error: {msg}"),
            RemoteError::Statement { index, message } => {
                write!(f, "Remote SQL error (stmt {index}): {message}")
            }
        }
    }
}

impl std::error::Error for RemoteError {}
