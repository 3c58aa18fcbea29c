use crate::telemetry::logging::LogConfig;
use crate::world::time::TickRate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Knobs for the stuck-relocation scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelocationSettings {
    /// Wait between submission and the search.
    pub delay_secs: u64,
    /// Largest ring the search will walk, in tiles.
    pub search_radius: i64,
    /// How far (in blocks) the actor may wander while waiting.
    pub max_displacement: f64,
    /// Search candidates examined per request per tick.
    pub tiles_per_tick: u32,
    pub tick_millis: u64,
    /// Charge handed to the submission gate.
    pub cost: u64,
}

impl Default for RelocationSettings {
    fn default() -> Self {
        Self {
            delay_secs: 30,
            search_radius: 20,
            max_displacement: 10.0,
            tiles_per_tick: 64,
            tick_millis: 50,
            cost: 0,
        }
    }
}

impl RelocationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_radius < 0 {
            return Err(ConfigError::Invalid {
                field: "search_radius",
                reason: format!("must not be negative, got {}", self.search_radius),
            });
        }
        if u32::try_from(self.search_radius).is_err() {
            return Err(ConfigError::Invalid {
                field: "search_radius",
                reason: format!("too large, got {}", self.search_radius),
            });
        }
        if !self.max_displacement.is_finite() || self.max_displacement < 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_displacement",
                reason: format!(
                    "must be a finite non-negative distance, got {}",
                    self.max_displacement
                ),
            });
        }
        if self.tiles_per_tick == 0 {
            return Err(ConfigError::Invalid {
                field: "tiles_per_tick",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.tick_millis == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_millis",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn tick_rate(&self) -> TickRate {
        TickRate::from_millis(self.tick_millis)
    }
}

/// Leveled upgrade attributes read through the ownership board.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpgradeSettings {
    /// Spawn-rate multiplier per upgrade level.
    pub spawner_rates: BTreeMap<u32, f64>,
    pub cache_capacity: usize,
}

impl Default for UpgradeSettings {
    fn default() -> Self {
        Self {
            spawner_rates: BTreeMap::from([(0, 1.0)]),
            cache_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub relocation: RelocationSettings,
    pub upgrades: UpgradeSettings,
    pub log: LogConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub config_path: Option<PathBuf>,
    pub settings: FileConfig,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() > 2 {
            return Err("usage: territory [config.yaml]".to_string());
        }

        let config_path = args.get(1).map(PathBuf::from);
        let mut settings = match config_path.as_deref() {
            Some(path) => FileConfig::load(path).map_err(|err| err.to_string())?,
            None => FileConfig::default(),
        };

        if let Some(dir) = env_value("TERRITORY_LOG_DIR") {
            settings.log.dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = env_value("TERRITORY_LOG") {
            settings.log.level = level;
        }

        Ok(Self {
            config_path,
            settings,
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
