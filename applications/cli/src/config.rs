/// CLI configuration
use crate::error::{CliError, Result};
use encore_playback::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "encore.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub engine: SimulatedEngineSettings,
}

/// Timing of the simulated media engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatedEngineSettings {
    /// Time from `load` until the asset reports ready or failed
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Interval between position ticks while playing
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Reported length for catalog entries without a duration
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: f64,
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `encore.toml` is read when
    /// present. `ENCORE_`-prefixed variables override both, with `__` between
    /// sections (`ENCORE_SESSION__LOAD_TIMEOUT_MS=5000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let session = &self.session;

        if !(session.restart_threshold_secs.is_finite() && session.restart_threshold_secs > 0.0) {
            return Err(CliError::Config(format!(
                "session.restart_threshold_secs must be positive (got {})",
                session.restart_threshold_secs
            )));
        }

        if session.load_timeout_ms == 0 {
            return Err(CliError::Config(
                "session.load_timeout_ms must be positive".to_string(),
            ));
        }

        if session.event_capacity == 0 {
            return Err(CliError::Config(
                "session.event_capacity must be at least 1".to_string(),
            ));
        }

        if self.engine.tick_interval_ms == 0 {
            return Err(CliError::Config(
                "engine.tick_interval_ms must be positive".to_string(),
            ));
        }

        if !(self.engine.fallback_duration_secs.is_finite()
            && self.engine.fallback_duration_secs > 0.0)
        {
            return Err(CliError::Config(
                "engine.fallback_duration_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_load_delay_ms() -> u64 {
    250
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_fallback_duration_secs() -> f64 {
    180.0
}

impl Default for SimulatedEngineSettings {
    fn default() -> Self {
        Self {
            load_delay_ms: default_load_delay_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            fallback_duration_secs: default_fallback_duration_secs(),
        }
    }
}
