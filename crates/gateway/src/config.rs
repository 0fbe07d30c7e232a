//! Gateway configuration.
//!
//! Loaded from a YAML file at startup; every field has a default so the
//! service also starts with no file at all (useful in development, where
//! the registry is then seeded through `register_livestock` directly).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use telemetry::evaluator::Thresholds;
use telemetry::store::LivestockRecord;
use tracing::{info, warn};

/// Environment variable overriding the config file location.
const ENV_CONFIG_PATH: &str = "HERDPULSE_CONFIG_PATH";

/// Default config file location.
const DEFAULT_CONFIG_PATH: &str = "herdpulse.yaml";

/// Top-level gateway settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,

    /// SQLite database file for the reading log and registry.
    pub database_path: String,

    /// Monitor loop interval in seconds.
    pub tick_interval_secs: u64,

    /// Safety bounds for livestock vitals.
    pub thresholds: Thresholds,

    /// Registry seed: animals provisioned at startup (upserted, so the
    /// file can be re-applied on every boot).
    pub livestock: Vec<LivestockRecord>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_path: "herdpulse.db".to_string(),
            tick_interval_secs: 5,
            thresholds: Thresholds::default(),
            livestock: vec![],
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the default or `HERDPULSE_CONFIG_PATH`
    /// location, falling back to defaults when no file is present.
    #[must_use]
    pub fn load() -> Self {
        let override_path = std::env::var(ENV_CONFIG_PATH).ok();
        let config_path = override_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        if !Path::new(config_path).exists() {
            warn!(
                path = config_path,
                "no configuration file found, using defaults"
            );
            return Self::default();
        }

        match Self::from_file(config_path) {
            Ok(config) => {
                info!(path = config_path, "loaded gateway configuration");
                config
            }
            Err(err) => {
                warn!(
                    path = config_path,
                    error = %err,
                    "failed to load configuration, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a config file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Monitor loop interval, clamped to at least one second.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}
