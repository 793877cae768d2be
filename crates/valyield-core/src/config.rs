//! Run configuration and its on-disk JSON form.
//!
//! Every field has a default so a partial (or missing) config file is valid.
//! Command-line flags are applied on top of the loaded values by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reward::AnnualizationFactor;
use crate::types::Network;

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value that parses but cannot drive a run.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// Other configuration error.
    #[error("{0}")]
    Other(String),
}

/// Parameters for one yield analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub network: Network,
    /// Custom RPC endpoint; the network's default list is used when unset.
    pub endpoint: Option<String>,
    pub max_connect_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub connect_timeout_secs: u64,
    pub batch_size: usize,
    pub top_n: Option<usize>,
    pub annualization: AnnualizationFactor,
    /// Maximum number of eras to walk back looking for rewards.
    pub max_lookback: Option<u32>,
    /// Extra attempts per validator before it is skipped.
    pub fetch_retries: u32,
    pub fetch_timeout_secs: u64,
    /// Capacity of the progress channel between retriever and consumer.
    pub progress_buffer: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            network: Network::Polkadot,
            endpoint: None,
            max_connect_attempts: 5,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 30_000,
            connect_timeout_secs: 10,
            batch_size: 16,
            top_n: Some(16),
            annualization: AnnualizationFactor::default(),
            max_lookback: Some(84),
            fetch_retries: 1,
            fetch_timeout_secs: 30,
            progress_buffer: 4,
        }
    }
}

impl RunConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.max_connect_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_connect_attempts must be at least 1".into(),
            ));
        }
        if self.annualization.denominator == 0 {
            return Err(ConfigError::Invalid(
                "annualization denominator must not be zero".into(),
            ));
        }
        if self.progress_buffer == 0 {
            return Err(ConfigError::Invalid("progress_buffer must be at least 1".into()));
        }
        if let Some(endpoint) = &self.endpoint
            && !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://"))
        {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be a ws:// or wss:// URL, got {}",
                endpoint
            )));
        }
        Ok(())
    }
}

/// Get the config file path.
#[cfg(feature = "config-dirs")]
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("xyz", "valyield", "valyield")
        .map(|dirs| dirs.config_dir().join("config.json"))
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))
}

/// Load configuration from the platform config directory.
#[cfg(feature = "config-dirs")]
pub fn load_config() -> Result<RunConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from a file, returning defaults if it does not exist.
pub fn load_config_from(path: &Path) -> Result<RunConfig, ConfigError> {
    if !path.exists() {
        return Ok(RunConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: RunConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to a file, creating parent directories.
pub fn save_config_to(config: &RunConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("valyield-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_connect_attempts, 5);
        assert_eq!(config.annualization, AnnualizationFactor::whole(365));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"network": "kusama", "batch_size": 20}"#).unwrap();
        assert_eq!(config.network, Network::Kusama);
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.backoff_cap_ms, 30_000);
        assert_eq!(config.top_n, Some(16));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let config = RunConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = RunConfig {
            max_connect_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_http_endpoint() {
        let config = RunConfig {
            endpoint: Some("https://rpc.polkadot.io".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config_from(&temp_path("absent.json")).unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("saved.json");
        let config = RunConfig {
            network: Network::Westend,
            endpoint: Some("wss://westend-rpc.polkadot.io".into()),
            annualization: AnnualizationFactor::new(36_524_219, 100_000),
            top_n: None,
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = temp_path("invalid.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"batch_size": 0}"#).unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Invalid(_))));
        let _ = fs::remove_file(&path);
    }
}
