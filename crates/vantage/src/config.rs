//! Application configuration loaded from a TOML file, with CLI overrides
//! applied on top. A missing file is not an error: the default
//! configuration is written back so operators have something to edit.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use vantage_workload::{BackFront, EngineConfig, NUM_TRACKED_REGIONS};

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize default config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Simulation driver settings.
    pub simulation: SimulationSettings,
    /// Region extents and regulation settings.
    pub regions: RegionSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Number of simulated proxies.
    pub proxies: usize,
    /// Frame rate of the processing loop, Hz.
    pub tick_rate_hz: u32,
    /// Number of concurrent producer tasks.
    pub producers: usize,
    /// Number of ticks to run before exiting; 0 runs until interrupted.
    pub ticks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSettings {
    /// Seed `[back, front]` extents per tracked region.
    pub back_fronts: [BackFront; NUM_TRACKED_REGIONS],
    /// Minimum extents the regulator may shrink to.
    pub min_ranges: [BackFront; NUM_TRACKED_REGIONS],
    /// Maximum extents the regulator may grow to.
    pub max_ranges: [BackFront; NUM_TRACKED_REGIONS],
    /// Per-region processing budgets, microseconds.
    pub budgets_us: [u64; NUM_TRACKED_REGIONS],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter.
    pub level: String,
    /// JSON formatting.
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings {
                proxies: 500,
                tick_rate_hz: 30,
                producers: 4,
                ticks: 0,
            },
            regions: RegionSettings {
                back_fronts: [[2.0, 10.0], [4.0, 30.0], [6.0, 100.0]],
                min_ranges: [[1.0, 5.0], [2.0, 10.0], [3.0, 20.0]],
                max_ranges: [[10.0, 50.0], [20.0, 150.0], [30.0, 400.0]],
                budgets_us: [2_000, 4_000, 6_000],
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing the defaults back if the
    /// file does not exist yet.
    pub async fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Sanity checks beyond what the engine itself validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.proxies == 0 {
            return Err(ConfigError::Invalid("proxies must be non-zero".into()));
        }
        if self.simulation.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("tick_rate_hz must be non-zero".into()));
        }
        if self.simulation.producers == 0 {
            return Err(ConfigError::Invalid("producers must be non-zero".into()));
        }
        Ok(())
    }

    /// The engine-facing slice of this configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            budgets: std::array::from_fn(|i| Duration::from_micros(self.regions.budgets_us[i])),
            min_ranges: self.regions.min_ranges,
            max_ranges: self.regions.max_ranges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.simulation.proxies, 500);

        // Second load reads the file it just wrote.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.regions.budgets_us, config.regions.budgets_us);
    }

    #[tokio::test]
    async fn test_malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "simulation = 12").await.unwrap();

        assert!(matches!(
            AppConfig::load_from_file(&path).await,
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_proxies_invalid() {
        let mut config = AppConfig::default();
        config.simulation.proxies = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = AppConfig::default();
        let engine = config.to_engine_config();
        assert_eq!(engine.budgets[0], Duration::from_millis(2));
        assert_eq!(engine.max_ranges[2], [30.0, 400.0]);
    }
}
