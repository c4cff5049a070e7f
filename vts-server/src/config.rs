//! Server configuration
//!
//! Defaults work out of the box. Set `VTS_CONFIG` to a YAML file to
//! override any subset of fields.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the YAML config file
pub const CONFIG_ENV: &str = "VTS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    pub bind_addr: SocketAddr,

    /// Simulator step + gauge refresh cadence
    pub step_interval_ms: u64,

    /// Secondary readout (coolant, battery, fuel) cadence
    pub secondary_interval_ms: u64,

    /// Diagnostics cadence
    pub inference_interval_ms: u64,

    /// Events buffered per SSE subscriber before it starts lagging
    pub event_buffer: usize,

    /// Fixed seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9200)),
            step_interval_ms: 100,
            secondary_interval_ms: 1000,
            inference_interval_ms: 2000,
            event_buffer: 256,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Load from the file named by `VTS_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_interval_ms == 0 {
            bail!("step_interval_ms must be greater than zero");
        }
        if self.secondary_interval_ms == 0 {
            bail!("secondary_interval_ms must be greater than zero");
        }
        if self.inference_interval_ms == 0 {
            bail!("inference_interval_ms must be greater than zero");
        }
        if self.event_buffer == 0 {
            bail!("event_buffer must be greater than zero");
        }
        Ok(())
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn secondary_interval(&self) -> Duration {
        Duration::from_millis(self.secondary_interval_ms)
    }

    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.step_interval(), Duration::from_millis(100));
        assert_eq!(config.bind_addr.port(), 9200);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml("step_interval_ms: 50\nseed: 42\n").unwrap();
        assert_eq!(config.step_interval_ms, 50);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.inference_interval_ms, 2000);
    }

    #[test]
    fn test_bind_addr_from_yaml() {
        let config = ServerConfig::from_yaml("bind_addr: \"127.0.0.1:8088\"\n").unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8088".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ServerConfig::from_yaml("inference_interval_ms: 0\n").unwrap_err();
        assert!(err.to_string().contains("inference_interval_ms"));
    }

    #[test]
    fn test_unparseable_yaml_rejected() {
        assert!(ServerConfig::from_yaml("step_interval_ms: fast\n").is_err());
    }
}
