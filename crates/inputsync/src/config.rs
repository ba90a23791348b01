//! Client configuration

use inputsync_network::transport::{DEFAULT_HOST, DEFAULT_PORT};
use inputsync_network::TransportConfig;
use std::time::Duration;
use thiserror::Error;

pub const HOST_VAR: &str = "INPUTSYNC_HOST";
pub const PORT_VAR: &str = "INPUTSYNC_PORT";
pub const RETRY_MS_VAR: &str = "INPUTSYNC_RETRY_MS";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub host: String,
    pub port: u16,
    pub retry_interval: Duration,
    pub connect_timeout: Duration,
    /// Initial state of the sync toggle
    pub start_enabled: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            retry_interval: transport.retry_interval,
            connect_timeout: transport.connect_timeout,
            start_enabled: true,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `INPUTSYNC_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_VAR) {
            config.port = parse(PORT_VAR, &port)?;
        }
        if let Some(retry) = lookup(RETRY_MS_VAR) {
            config.retry_interval = Duration::from_millis(parse(RETRY_MS_VAR, &retry)?);
        }
        Ok(config)
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            host: self.host.clone(),
            port: self.port,
            connect_timeout: self.connect_timeout,
            retry_interval: self.retry_interval,
        }
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}
