//! Animator configuration
//!
//! Read from a YAML file shaped like:
//!
//! ```yaml
//! animation:
//!   tick-interval: 10
//! debug: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::error::ConfigError;
use super::types::MILLIS_PER_TICK;

/// Ticks between two animator runs unless configured otherwise (half a second)
pub const DEFAULT_TICK_INTERVAL: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignalConfig {
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Log every light update
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnimationConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u32,
}

fn default_tick_interval() -> u32 {
    DEFAULT_TICK_INTERVAL
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl SignalConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.animation.tick_interval == 0 {
            return Err(ConfigError::Invalid(
                "animation.tick-interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Real time between two animator runs
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.animation.tick_interval) * MILLIS_PER_TICK)
    }
}
