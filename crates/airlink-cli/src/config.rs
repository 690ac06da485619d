//! CLI configuration: TOML file plus `AIRLINK_*` environment overrides.
//!
//! Layering (later wins): built-in defaults, then
//! `$XDG_CONFIG_HOME/airlink/config.toml`, then environment variables.
//! The file is optional; a missing file just means defaults.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use airlink_core::SessionConfig;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub sim: SimDefaults,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request submission timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

/// Tuning for the simulator backend.
#[derive(Debug, Deserialize, Serialize)]
pub struct SimDefaults {
    /// Simulated daemon latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for SimDefaults {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_latency_ms() -> u64 {
    50
}

/// Location of the optional config file.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("net", "airlink", "airlink")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration with the standard layering.
pub fn load() -> Result<Config, CliError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(path) = config_path() {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed("AIRLINK_").split("__"))
        .extract()
        .map_err(|e| CliError::Config(e.to_string()))
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            request_timeout: Duration::from_secs(self.defaults.timeout),
            ..SessionConfig::default()
        }
    }

    pub fn sim_latency(&self) -> Duration {
        Duration::from_millis(self.sim.latency_ms)
    }
}
