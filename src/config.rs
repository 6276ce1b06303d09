use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{Result, TransferStatsError};
use crate::transfer::TransferOptions;

/// Prefix for environment variable overrides
const ENV_PREFIX: &str = "TRANSFER_STATS";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Options for the tracked transfer
    pub transfer: TransferOptions,

    /// Settings for the simulated transfer run by the binary
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Bytes reported per update
    pub chunk_bytes: u64,

    /// Delay between updates in milliseconds
    pub interval_ms: u64,

    /// Upper bound on updates, the only stop condition for unbounded transfers
    pub max_updates: u32,

    /// Pause once this many updates have been sent
    pub pause_after_updates: Option<u32>,

    /// Length of that pause in milliseconds
    pub pause_ms: u64,

    /// Updates that report no new bytes, sent halfway through
    pub stall_updates: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chunk_bytes: 64 * 1024,
            interval_ms: 100,
            max_updates: 50,
            pause_after_updates: None,
            pause_ms: 1000,
            stall_updates: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file with environment variable overrides.
    ///
    /// Nested keys use `__`, e.g. `TRANSFER_STATS_TRANSFER__BYTES_TOTAL=10000`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.transfer.window_capacity == 0 {
            return Err(TransferStatsError::InvalidConfigValue(
                "Window capacity cannot be 0".to_string(),
            ));
        }

        if let Some(total) = self.transfer.bytes_total {
            if self.transfer.bytes_completed > total {
                return Err(TransferStatsError::InvalidConfigValue(format!(
                    "Bytes completed ({}) cannot exceed bytes total ({})",
                    self.transfer.bytes_completed, total
                )));
            }
        }

        if self.simulation.chunk_bytes == 0 {
            return Err(TransferStatsError::InvalidConfigValue(
                "Chunk size cannot be 0".to_string(),
            ));
        }

        if self.simulation.interval_ms == 0 {
            return Err(TransferStatsError::InvalidConfigValue(
                "Update interval cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = match self.transfer.bytes_total {
            Some(total) => total.to_string(),
            None => "unknown".to_string(),
        };
        write!(
            f,
            "Transfer Config - Total: {}, Completed: {}, Window: {}, Chunk: {} B, Interval: {} ms",
            total,
            self.transfer.bytes_completed,
            self.transfer.window_capacity,
            self.simulation.chunk_bytes,
            self.simulation.interval_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transfer.window_capacity, 5);
        assert_eq!(config.transfer.bytes_total, None);
    }

    #[test]
    fn test_from_toml_str() {
        let config = AppConfig::from_toml_str(
            r#"
            [transfer]
            bytes_total = 10000
            bytes_completed = 500
            window_capacity = 8

            [simulation]
            chunk_bytes = 1000
            pause_after_updates = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.transfer.bytes_total, Some(10_000));
        assert_eq!(config.transfer.bytes_completed, 500);
        assert_eq!(config.transfer.window_capacity, 8);
        assert_eq!(config.simulation.chunk_bytes, 1000);
        assert_eq!(config.simulation.pause_after_updates, Some(3));
        assert_eq!(config.simulation.interval_ms, 100);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = AppConfig::from_toml_str("[transfer]\nwindow_capacity = 0\n").unwrap_err();
        assert!(matches!(err, TransferStatsError::InvalidConfigValue(_)));
    }

    #[test]
    fn test_rejects_completed_beyond_total() {
        let err = AppConfig::from_toml_str("[transfer]\nbytes_total = 10\nbytes_completed = 11\n")
            .unwrap_err();
        assert!(matches!(err, TransferStatsError::InvalidConfigValue(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = AppConfig::from_toml_str("[transfer\n").unwrap_err();
        assert!(matches!(err, TransferStatsError::Config(_)));
    }

    #[test]
    fn test_display() {
        let config = AppConfig::default();
        assert_eq!(
            config.to_string(),
            "Transfer Config - Total: unknown, Completed: 0, Window: 5, Chunk: 65536 B, Interval: 100 ms"
        );
    }
}
