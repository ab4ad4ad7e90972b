//! Configuration file support for Liftlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftlog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub athlete: AthleteConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Athlete parameters used by the metrics aggregator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AthleteConfig {
    /// Body weight in kilograms, the base for bodyweight load estimation
    #[serde(default = "default_body_weight_kg")]
    pub body_weight_kg: f64,

    /// Weekly volume goal used by the quality score
    #[serde(default = "default_weekly_volume_target")]
    pub weekly_volume_target: f64,
}

impl Default for AthleteConfig {
    fn default() -> Self {
        Self {
            body_weight_kg: default_body_weight_kg(),
            weekly_volume_target: default_weekly_volume_target(),
        }
    }
}

/// Session behavior parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Rest prefill for new sets, in seconds
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    /// Estimated work time per completed set when true duration is unknown
    #[serde(default = "default_work_seconds_per_set")]
    pub work_seconds_per_set: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            work_seconds_per_set: default_work_seconds_per_set(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("liftlog")
}

fn default_body_weight_kg() -> f64 {
    75.0
}

fn default_weekly_volume_target() -> f64 {
    10000.0
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_work_seconds_per_set() -> u32 {
    45
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("liftlog").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.athlete.body_weight_kg <= 0.0 || !self.athlete.body_weight_kg.is_finite() {
            return Err(Error::Config(format!(
                "body_weight_kg must be a positive number, got {}",
                self.athlete.body_weight_kg
            )));
        }
        if self.athlete.weekly_volume_target < 0.0 {
            return Err(Error::Config(
                "weekly_volume_target must not be negative".into(),
            ));
        }
        Ok(())
    }
}
