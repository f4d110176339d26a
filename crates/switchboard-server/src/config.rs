//! Relay configuration.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`RelayConfig::default()`]
//! 2. **JSON file** — optional, passed on the command line
//! 3. **Environment variables** — `SWITCHBOARD_*` overrides (highest)

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections; upgrades past the cap are
    /// rejected with 503.
    pub max_connections: usize,
    /// Per-connection outbound queue capacity. A full queue drops the
    /// message for that recipient instead of stalling the room.
    pub send_queue_capacity: usize,
    /// Interval between server-initiated Ping frames, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Disconnect a client whose pongs stop for this many seconds.
    pub heartbeat_timeout_secs: u64,
    /// Max inbound WebSocket frame size in bytes.
    pub max_frame_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 256,
            send_queue_capacity: 256,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_frame_bytes: 64 * 1024, // 64 KiB — signaling frames are small
        }
    }
}

/// Failure to load configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for [`RelayConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    /// An environment override carries an unparsable value.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// The offending variable name.
        var: &'static str,
        /// The raw value found in the environment.
        value: String,
    },
}

impl RelayConfig {
    /// Load configuration: defaults, then the optional JSON file, then
    /// `SWITCHBOARD_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `SWITCHBOARD_*` overrides from the given lookup function.
    fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("SWITCHBOARD_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SWITCHBOARD_PORT") {
            self.port = parse_env("SWITCHBOARD_PORT", &port)?;
        }
        if let Some(max) = lookup("SWITCHBOARD_MAX_CONNECTIONS") {
            self.max_connections = parse_env("SWITCHBOARD_MAX_CONNECTIONS", &max)?;
        }
        if let Some(cap) = lookup("SWITCHBOARD_SEND_QUEUE_CAPACITY") {
            self.send_queue_capacity = parse_env("SWITCHBOARD_SEND_QUEUE_CAPACITY", &cap)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_owned(),
    })
}
