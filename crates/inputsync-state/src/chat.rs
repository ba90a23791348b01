//! Chat buffer transport and send-on-change tracking

use crate::StateError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Base64 (standard alphabet, padded) over the UTF-8 bytes
pub fn encode_buffer(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode_buffer(payload: &str) -> Result<String, StateError> {
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Tracks the last buffer sent for the currently open text-entry context
#[derive(Debug, Default)]
pub struct ChatSync {
    last_sent: Option<String>,
}

impl ChatSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current buffer (`None` when no text entry is open). Returns
    /// the encoded payload when it differs from what was last sent.
    pub fn observe(&mut self, buffer: Option<&str>) -> Option<String> {
        let Some(buffer) = buffer else {
            self.reset();
            return None;
        };
        if self.last_sent.as_deref() == Some(buffer) {
            return None;
        }
        self.last_sent = Some(buffer.to_string());
        Some(encode_buffer(buffer))
    }

    /// Forget the last value so the next observation is always sent
    pub fn reset(&mut self) {
        self.last_sent = None;
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_matches_wire_example() {
        assert_eq!(encode_buffer("Hello"), "SGVsbG8=");
        assert_eq!(decode_buffer("SGVsbG8=").unwrap(), "Hello");
    }

    #[test]
    fn separators_survive_transport() {
        let text = "a_b\nc / d ü";
        let encoded = encode_buffer(text);
        assert!(!encoded.contains('_'));
        assert!(!encoded.contains('\n'));
        assert_eq!(decode_buffer(&encoded).unwrap(), text);
    }

    #[test]
    fn invalid_payload_is_an_error() {
        assert!(decode_buffer("not base64!").is_err());
        assert!(decode_buffer(&STANDARD.encode([0xff, 0xfe])).is_err());
    }
}
