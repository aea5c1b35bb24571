//! Configuration for the activity monitor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval between activity samples
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,

    /// Span of the sliding activity window
    #[serde(with = "duration_serde")]
    pub window_size: Duration,

    /// A sample is active when idle time is strictly below this
    #[serde(with = "duration_serde")]
    pub active_idle_threshold: Duration,

    /// Active ratio at or above which the mode is HIGH_PRODUCTIVE
    pub high_productive_ratio: f64,

    /// Active ratio at or above which the mode is SIMPLE_PRODUCTIVE
    pub simple_productive_ratio: f64,

    /// Idle time at or above which the mode is IDLE regardless of ratio
    #[serde(with = "duration_serde")]
    pub continuous_idle_threshold: Duration,

    /// Minimum spacing between STATUS lines
    #[serde(with = "duration_serde")]
    pub status_interval: Duration,

    /// Minimum spacing between MOUSE MOVE lines (0 logs every move)
    #[serde(with = "duration_serde")]
    pub mouse_move_interval: Duration,

    /// Directory holding the daily log files
    pub log_dir: PathBuf,

    /// File name prefix, e.g. "activity" => activity-YYYY-MM-DD.log
    pub log_base_name: String,

    /// Interval between durable log syncs
    #[serde(with = "duration_serde")]
    pub flush_interval: Duration,

    /// Remote store for hourly aggregates
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-monitor");

        Self {
            sample_interval: Duration::from_secs(1),
            window_size: Duration::from_secs(30 * 60),
            active_idle_threshold: Duration::from_secs(30),
            high_productive_ratio: 0.60,
            simple_productive_ratio: 0.30,
            continuous_idle_threshold: Duration::from_secs(30 * 60),
            status_interval: Duration::from_secs(30),
            mouse_move_interval: Duration::ZERO,
            log_dir: data_dir.join("logs"),
            log_base_name: "activity".to_string(),
            flush_interval: Duration::from_secs(5),
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activity-monitor")
            .join("config.json")
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.is_zero() {
            return Err(ConfigError::Invalid("sample_interval must be non-zero".into()));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid("flush_interval must be non-zero".into()));
        }
        if self.window_size.is_zero() {
            return Err(ConfigError::Invalid("window_size must be non-zero".into()));
        }
        for (name, ratio) in [
            ("high_productive_ratio", self.high_productive_ratio),
            ("simple_productive_ratio", self.simple_productive_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {ratio}"
                )));
            }
        }
        if self.simple_productive_ratio > self.high_productive_ratio {
            return Err(ConfigError::Invalid(
                "simple_productive_ratio must not exceed high_productive_ratio".into(),
            ));
        }
        if self.log_base_name.trim().is_empty() {
            return Err(ConfigError::Invalid("log_base_name must not be empty".into()));
        }
        Ok(())
    }
}

/// Connection settings for the rqlite node receiving hourly rows.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL, e.g. "http://192.168.1.6:4001". `None` disables the sink.
    pub base_url: Option<String>,
    /// Optional basic auth username
    pub username: Option<String>,
    /// Optional basic auth password
    pub password: Option<String>,
    /// Upper bound on one upsert request
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            timeout: Duration::from_secs(8),
        }
    }
}

impl RemoteConfig {
    /// Whether hourly rows should be shipped anywhere.
    pub fn is_enabled(&self) -> bool {
        self.base_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
