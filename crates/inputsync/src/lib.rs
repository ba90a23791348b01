//! InputSync client and relay
//!
//! The client half embeds into a host process: it captures the leader's
//! input, and on followers replays received commands against the host's
//! opaque object graph. The relay elects a leader and fans lines out.

pub mod capture;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod host;
pub mod input;
pub mod relay;
pub mod replica;
pub mod tick;

pub use client::SyncClient;
pub use config::SyncConfig;
pub use dispatcher::ProtocolDispatcher;
pub use executor::{ApplyScope, MainThreadQueue};
pub use host::{Host, HostError};
pub use input::InputListener;
pub use replica::{ApplyError, Replica};
pub use tick::TickDriver;
