//! Network layer for InputSync
//!
//! Newline-delimited text protocol over a single TCP stream to the relay,
//! with a background reconnect loop, role/session state, echo suppression
//! and outbound rate limiting.

pub mod connection;
pub mod protocol;
pub mod session;
pub mod throttle;
pub mod transport;

pub use connection::{ConnectionManager, LineHandler, Outbound};
pub use protocol::{LineCodec, Message, MessageStats, OpenKind, UiEvent};
pub use session::{Role, Session, SuppressGuard};
pub use throttle::SendThrottle;
pub use transport::TransportConfig;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
