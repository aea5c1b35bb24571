//! HTTP client for an rqlite node.

use crate::config::RemoteConfig;
use crate::core::hourly::HourlyRow;
use crate::remote::sql::{check_execute_response, upsert_statement};
use crate::remote::{HourlyStore, RemoteError};

/// Async client for rqlite's execute endpoint.
pub struct RemoteStoreClient {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
}

impl RemoteStoreClient {
    /// Create a new client.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| RemoteError::Config("base_url is empty".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone(),
            client,
        })
    }

    /// Base URL of the node.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the execute endpoint URL.
    pub fn execute_url(&self) -> String {
        format!("{}/db/execute", self.base_url)
    }

    /// Run write statements in one request.
    pub async fn execute(&self, statements: &[String]) -> Result<(), RemoteError> {
        let mut request = self
            .client
            .post(self.execute_url())
            .header("Content-Type", "application/json")
            .json(statements);

        if let Some(ref user) = self.username {
            request = request.basic_auth(user, self.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("Failed to read response body: {e}")))?;

        check_execute_response(status, &body).map(|_| ())
    }

    /// Insert or replace one hourly row.
    pub async fn upsert_hourly(&self, row: &HourlyRow) -> Result<(), RemoteError> {
        self.execute(&[upsert_statement(row)]).await
    }
}

/// Blocking client for use in synchronous contexts.
pub struct BlockingRemoteStoreClient {
    inner: RemoteStoreClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingRemoteStoreClient {
    /// Create a new blocking client.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RemoteError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: RemoteStoreClient::new(config)?,
            runtime,
        })
    }

    /// Base URL of the node.
    pub fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    /// Insert or replace one hourly row.
    pub fn upsert_hourly(&self, row: &HourlyRow) -> Result<(), RemoteError> {
        self.runtime.block_on(self.inner.upsert_hourly(row))
    }
}

impl HourlyStore for BlockingRemoteStoreClient {
    fn upsert(&self, row: &HourlyRow) -> Result<(), RemoteError> {
        self.upsert_hourly(row)
    }
}
