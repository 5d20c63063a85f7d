//! Client configuration
//!
//! Loaded from an optional JSON file, then overridden field by field by the
//! command line (or the matching `CLI_*` environment variables), then
//! validated. Immutable after startup.
//!
//! ```json
//! {
//!   "agency_id": "1",
//!   "server_address": "server:12345",
//!   "batch_byte_size": 8192,
//!   "poll_interval_ms": 100,
//!   "dataset_dir": "/dataset",
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::wager::{RecordBatchReader, MAX_WINDOW};

/// Configuration failure
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        "CLIENT_CONFIG_ERROR"
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration consumed by the submission and polling loops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Agency on whose behalf records are sent and winners queried
    #[serde(default)]
    pub agency_id: String,

    /// Service address, `host:port`
    #[serde(default)]
    pub server_address: String,

    /// Input window per batch, in bytes
    #[serde(default = "default_batch_byte_size")]
    pub batch_byte_size: u64,

    /// Delay between winner queries answered with "pending"
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory holding `agency-<id>.csv`
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,

    /// Minimum severity written to the log
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_batch_byte_size() -> u64 {
    8192
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_dataset_dir() -> PathBuf {
    PathBuf::from("/dataset")
}
fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            agency_id: String::new(),
            server_address: String::new(),
            batch_byte_size: default_batch_byte_size(),
            poll_interval_ms: default_poll_interval_ms(),
            dataset_dir: default_dataset_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Field-level overrides, typically from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub agency_id: Option<String>,
    pub server_address: Option<String>,
    pub batch_byte_size: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub dataset_dir: Option<PathBuf>,
    pub log_level: Option<Severity>,
}

impl ClientConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::resolve(Some(path), &ConfigOverrides::default())
    }

    /// Read the file if given, apply overrides, validate.
    ///
    /// Without a file, the overrides must supply every required field.
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Invalid config JSON: {}", e)))
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(agency_id) = &overrides.agency_id {
            self.agency_id = agency_id.clone();
        }
        if let Some(server_address) = &overrides.server_address {
            self.server_address = server_address.clone();
        }
        if let Some(batch_byte_size) = overrides.batch_byte_size {
            self.batch_byte_size = batch_byte_size;
        }
        if let Some(poll_interval_ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
        if let Some(dataset_dir) = &overrides.dataset_dir {
            self.dataset_dir = dataset_dir.clone();
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.agency_id.trim().is_empty() {
            return Err(ConfigError::new("agency_id is required"));
        }
        if self.agency_id.contains(['|', ';', ',', '/', '\\']) {
            return Err(ConfigError::new(format!(
                "agency_id '{}' contains a reserved character",
                self.agency_id
            )));
        }
        if self.server_address.trim().is_empty() {
            return Err(ConfigError::new("server_address is required"));
        }
        if !self.server_address.contains(':') {
            return Err(ConfigError::new(format!(
                "server_address '{}' must be host:port",
                self.server_address
            )));
        }
        if self.batch_byte_size == 0 {
            return Err(ConfigError::new("batch_byte_size must be > 0"));
        }
        if self.batch_byte_size > MAX_WINDOW as u64 {
            return Err(ConfigError::new(format!(
                "batch_byte_size must be <= {}",
                MAX_WINDOW
            )));
        }
        Ok(())
    }

    /// Batch window as a buffer length
    pub fn batch_window(&self) -> usize {
        self.batch_byte_size as usize
    }

    /// Delay between winner queries
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Path of this agency's input file
    pub fn input_path(&self) -> PathBuf {
        RecordBatchReader::agency_file(&self.dataset_dir, &self.agency_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = temp_dir.path().join("client.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({ "agency_id": "3", "server_address": "server:12345" }),
        );

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.batch_byte_size, 8192);
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.dataset_dir, PathBuf::from("/dataset"));
        assert_eq!(config.log_level, Severity::Info);
        assert_eq!(config.input_path(), PathBuf::from("/dataset/agency-3.csv"));
    }

    #[test]
    fn test_config_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({
                "agency_id": "5",
                "server_address": "127.0.0.1:9000",
                "batch_byte_size": 512,
                "poll_interval_ms": 250,
                "dataset_dir": "/data",
                "log_level": "warn"
            }),
        );

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.batch_window(), 512);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.log_level, Severity::Warn);
    }

    #[test]
    fn test_missing_agency_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({ "server_address": "server:12345" }));

        let err = ClientConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "CLIENT_CONFIG_ERROR");
        assert!(err.message().contains("agency_id"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({ "agency_id": "1", "server_address": "server:12345", "batch_byte_size": 0 }),
        );
        assert!(ClientConfig::load(&path).is_err());
    }

    #[test]
    fn test_oversized_batch_size_rejected() {
        for batch_byte_size in [u64::MAX, MAX_WINDOW as u64 + 1] {
            let overrides = ConfigOverrides {
                agency_id: Some("1".into()),
                server_address: Some("server:12345".into()),
                batch_byte_size: Some(batch_byte_size),
                ..Default::default()
            };
            let err = ClientConfig::resolve(None, &overrides).unwrap_err();
            assert_eq!(err.code(), "CLIENT_CONFIG_ERROR");
            assert!(err.message().contains("batch_byte_size"));
        }

        let overrides = ConfigOverrides {
            agency_id: Some("1".into()),
            server_address: Some("server:12345".into()),
            batch_byte_size: Some(MAX_WINDOW as u64),
            ..Default::default()
        };
        assert_eq!(
            ClientConfig::resolve(None, &overrides).unwrap().batch_window(),
            MAX_WINDOW
        );
    }

    #[test]
    fn test_address_without_port_rejected() {
        let overrides = ConfigOverrides {
            agency_id: Some("1".into()),
            server_address: Some("server".into()),
            ..Default::default()
        };
        assert!(ClientConfig::resolve(None, &overrides).is_err());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("client.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(err.message().contains("Invalid config JSON"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({ "agency_id": "1", "server_address": "server:12345", "poll_interval_ms": 10 }),
        );
        let overrides = ConfigOverrides {
            agency_id: Some("2".into()),
            poll_interval_ms: Some(500),
            ..Default::default()
        };

        let config = ClientConfig::resolve(Some(&path), &overrides).unwrap();
        assert_eq!(config.agency_id, "2");
        assert_eq!(config.server_address, "server:12345");
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn test_overrides_without_file() {
        let overrides = ConfigOverrides {
            agency_id: Some("4".into()),
            server_address: Some("localhost:1".into()),
            ..Default::default()
        };
        let config = ClientConfig::resolve(None, &overrides).unwrap();
        assert_eq!(config.agency_id, "4");
        assert_eq!(config.batch_byte_size, 8192);
    }
}
