//! Core configuration, stored as JSON5 next to the host binary.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::ConfigError;

/// The config written on first run.
pub const DEFAULT_CONFIG: &str = include_str!("../../package-content/ember_config.json5");

/// Default file name of the config.
pub const CONFIG_FILE: &str = "ember_config.json5";

/// Settings for the scheduler, lifecycle and host tick loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Host ticks per second.
    pub tick_rate: f32,
    /// The longest delay, in ticks, a callback may be scheduled with.
    pub max_delay_ticks: u32,
    /// How many callbacks may be pending at once.
    pub max_pending_tasks: usize,
    /// Whether pending callbacks are dropped when a session stops.
    pub discard_on_stop: bool,
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl CoreConfig {
    /// Loads the config at `path`, writing the default config there first if it
    /// does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let config = if path.exists() {
            let config_str = fs::read_to_string(path).map_err(io_err)?;
            Self::from_json5(&config_str)?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            fs::write(path, DEFAULT_CONFIG).map_err(io_err)?;
            log::info!("Wrote default config to {}", path.display());
            Self::default()
        };

        Ok(config)
    }

    /// Parses and validates a config from JSON5 text.
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1.0..=1000.0).contains(&self.tick_rate) {
            return Err(ConfigError::Invalid("Tick rate must be in range 1..1000"));
        }
        if self.max_delay_ticks == 0 {
            return Err(ConfigError::Invalid("Max delay ticks must be greater than 0"));
        }
        if self.max_pending_tasks == 0 {
            return Err(ConfigError::Invalid("Max pending tasks must be greater than 0"));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("Log level must not be empty"));
        }
        Ok(())
    }

    /// The duration of one tick in milliseconds.
    #[must_use]
    pub fn tick_millis(&self) -> f32 {
        1000.0 / self.tick_rate
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            // One hour at 20 TPS
            max_delay_ticks: 72_000,
            max_pending_tasks: 65_536,
            discard_on_stop: false,
            log_level: "info".to_string(),
        }
    }
}
