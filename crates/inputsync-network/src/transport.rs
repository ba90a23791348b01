//! TCP transport to the relay

use crate::NetworkError;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 25590;

/// Configuration for the relay connection
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single connect attempt
    pub connect_timeout: Duration,
    /// Pause between reconnect attempts
    pub retry_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_millis(1500),
            retry_interval: Duration::from_secs(1),
        }
    }
}

impl TransportConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One bounded connect attempt with Nagle disabled
pub async fn connect(config: &TransportConfig) -> Result<TcpStream, NetworkError> {
    let address = config.address();
    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address))
        .await
        .map_err(|_| NetworkError::Timeout)?
        .map_err(|e| NetworkError::ConnectionFailed(format!("{address}: {e}")))?;

    stream.set_nodelay(true)?;
    debug!("Connected to {}", address);
    Ok(stream)
}
