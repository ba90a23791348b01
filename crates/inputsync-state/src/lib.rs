//! Leader state for InputSync
//!
//! The movement/input snapshot and its line codec, the follower's single
//! pending-snapshot slot, and send-on-change tracking for the chat buffer.

pub mod chat;
pub mod pending;
pub mod snapshot;

pub use chat::{decode_buffer, encode_buffer, ChatSync};
pub use pending::PendingSnapshot;
pub use snapshot::{Snapshot, MOVE_PREFIX};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
