//! Process configuration, loaded from a JSON file at startup in the
//! same `serde_json`-plus-file-read shape the teacher uses for its own
//! config (`lobby::reload_config`), but validated and closed over its
//! keys rather than hot-reloadable — this framework's config shapes
//! the tick engine and module registry at process start, not a set of
//! per-room limits that can sensibly change underneath a running room.

use serde::Deserialize;
use thiserror::Error;

/// Process-wide configuration. Unknown keys are rejected rather than
/// silently ignored, so a typo in a config file fails loudly at
/// startup instead of silently falling back to a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Tick cadence, in milliseconds. Must be positive.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// The registered game-logic module id to load.
    pub game_module: String,
    /// Connection string handed to the persistence backend.
    pub database_url: String,
    /// Address the push-channel listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Soft cap on concurrent connections. `0` means unlimited.
    #[serde(default)]
    pub max_connections: usize,
    /// Bearer token gating the administrative surface. `None` disables
    /// admin routes entirely rather than leaving them unauthenticated.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// A configuration load or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.game_module.is_empty() {
            return Err(ConfigError::Invalid(
                "game_module must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Loads and validates configuration from a JSON file at `path`.
pub async fn load(path: &str) -> Result<Config, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_tick_interval() {
        let config = Config {
            tick_interval_ms: 0,
            game_module: "echo".to_string(),
            database_url: "sqlite::memory:".to_string(),
            bind_addr: default_bind_addr(),
            max_connections: 0,
            admin_token: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{"tick_interval_ms": 1000, "game_module": "echo", "database_url": "x", "typo_field": 1}"#;
        let result: Result<Config, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
