//! Protocol message definitions and line framing
//!
//! Every message is one UTF-8 line, dispatched on its prefix. Numeric fields
//! are separated by `_`; free text travels base64-encoded.

use crate::session::Role;
use crate::NetworkError;
use bytes::{BufMut, BytesMut};
use inputsync_state::{decode_buffer, encode_buffer, Snapshot, MOVE_PREFIX};
use std::fmt;
use std::str::FromStr;

/// Lines longer than this are treated as a broken stream
pub const MAX_LINE_LEN: usize = 1 << 20;

/// Screen variants a follower can be asked to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenKind {
    Inventory,
    Chat,
    Command,
    Menu,
}

impl OpenKind {
    fn tag(self) -> &'static str {
        match self {
            OpenKind::Inventory => "INV",
            OpenKind::Chat => "CHAT",
            OpenKind::Command => "CMD",
            OpenKind::Menu => "MENU",
        }
    }
}

/// Raw UI events mirrored for diagnostics only
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Move {
        x: f64,
        y: f64,
    },
    Click {
        button: i32,
        x: f64,
        y: f64,
        mods: i32,
    },
    Release {
        button: i32,
        x: f64,
        y: f64,
        mods: i32,
    },
    Scroll {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
    Char {
        codepoint: u32,
        mods: i32,
    },
    /// Any other `UI_` line, kept verbatim
    Unknown(String),
}

impl UiEvent {
    /// Label used in replay-failure log lines
    pub fn kind(&self) -> &'static str {
        match self {
            UiEvent::Move { .. } => "UI_MOVE",
            UiEvent::Click { .. } => "UI_CLICK",
            UiEvent::Release { .. } => "UI_RELEASE",
            UiEvent::Scroll { .. } => "UI_SCROLL",
            UiEvent::Char { .. } => "UI_CHAR",
            UiEvent::Unknown(raw) if raw.starts_with("UI_KEYDOWN_") => "UI_KEYDOWN",
            UiEvent::Unknown(raw) if raw.starts_with("UI_KEYUP_") => "UI_KEYUP",
            UiEvent::Unknown(_) => "UI",
        }
    }

    /// Events that warrant a dump of the screen's input entry points
    pub fn wants_candidate_dump(&self) -> bool {
        match self {
            UiEvent::Click { .. } | UiEvent::Char { .. } => true,
            UiEvent::Unknown(raw) => raw.starts_with("UI_KEY"),
            _ => false,
        }
    }

    fn parse(line: &str) -> UiEvent {
        Self::parse_known(line).unwrap_or_else(|| UiEvent::Unknown(line.to_string()))
    }

    fn parse_known(line: &str) -> Option<UiEvent> {
        if let Some(rest) = line.strip_prefix("UI_MOVE_") {
            let [x, y] = fields::<2>(rest)?;
            return Some(UiEvent::Move {
                x: num(x)?,
                y: num(y)?,
            });
        }
        if let Some(rest) = line.strip_prefix("UI_CLICK_") {
            let [button, x, y, mods] = fields::<4>(rest)?;
            return Some(UiEvent::Click {
                button: num(button)?,
                x: num(x)?,
                y: num(y)?,
                mods: num(mods)?,
            });
        }
        if let Some(rest) = line.strip_prefix("UI_RELEASE_") {
            let [button, x, y, mods] = fields::<4>(rest)?;
            return Some(UiEvent::Release {
                button: num(button)?,
                x: num(x)?,
                y: num(y)?,
                mods: num(mods)?,
            });
        }
        if let Some(rest) = line.strip_prefix("UI_SCROLL_") {
            let [x, y, dx, dy] = fields::<4>(rest)?;
            return Some(UiEvent::Scroll {
                x: num(x)?,
                y: num(y)?,
                dx: num(dx)?,
                dy: num(dy)?,
            });
        }
        if let Some(rest) = line.strip_prefix("UI_CHAR_") {
            let [codepoint, mods] = fields::<2>(rest)?;
            return Some(UiEvent::Char {
                codepoint: num(codepoint)?,
                mods: num(mods)?,
            });
        }
        None
    }
}

impl fmt::Display for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiEvent::Move { x, y } => write!(f, "UI_MOVE_{x}_{y}"),
            UiEvent::Click { button, x, y, mods } => write!(f, "UI_CLICK_{button}_{x}_{y}_{mods}"),
            UiEvent::Release { button, x, y, mods } => {
                write!(f, "UI_RELEASE_{button}_{x}_{y}_{mods}")
            }
            UiEvent::Scroll { x, y, dx, dy } => write!(f, "UI_SCROLL_{x}_{y}_{dx}_{dy}"),
            UiEvent::Char { codepoint, mods } => write!(f, "UI_CHAR_{codepoint}_{mods}"),
            UiEvent::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Messages exchanged with the relay
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Role assignment from the relay
    Role(Role),
    Pause,
    Resume,
    ToggleSync,
    /// Periodic leader input snapshot
    Move(Snapshot),
    CloseScreen,
    OpenScreen(OpenKind),
    HotbarSelect(i32),
    InventoryClick {
        sync_id: i32,
        slot_id: i32,
        button: i32,
        action: i32,
    },
    /// Full text-entry buffer (decoded)
    ChatSetBuffer(String),
    ChatSend,
    UiDebug(UiEvent),
    /// Window focus report, consumed by the relay
    Focus(bool),
}

impl Message {
    /// Parse one received line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Result<Message, NetworkError> {
        let line = line.trim();
        let message = match line {
            "" => return Err(protocol_error("empty line")),
            "ROLE_LEADER" => Message::Role(Role::Leader),
            "ROLE_FOLLOWER" => Message::Role(Role::Follower),
            "PAUSE" => Message::Pause,
            "RESUME" => Message::Resume,
            "TOGGLE_SYNC" => Message::ToggleSync,
            "CLOSE_SCREEN" => Message::CloseScreen,
            "OPEN_INV" => Message::OpenScreen(OpenKind::Inventory),
            "OPEN_CHAT" => Message::OpenScreen(OpenKind::Chat),
            "OPEN_CMD" => Message::OpenScreen(OpenKind::Command),
            "OPEN_MENU" => Message::OpenScreen(OpenKind::Menu),
            "CHAT_SEND" => Message::ChatSend,
            "FOCUS_1" => Message::Focus(true),
            "FOCUS_0" => Message::Focus(false),
            _ => return Self::parse_prefixed(line),
        };
        Ok(message)
    }

    fn parse_prefixed(line: &str) -> Result<Message, NetworkError> {
        if line.starts_with(MOVE_PREFIX) {
            return Snapshot::decode(line)
                .map(Message::Move)
                .ok_or_else(|| protocol_error(format!("malformed snapshot: {line}")));
        }
        if let Some(rest) = line.strip_prefix("HBAR_") {
            return num(rest)
                .map(Message::HotbarSelect)
                .ok_or_else(|| protocol_error(format!("malformed hotbar index: {line}")));
        }
        if let Some(rest) = line.strip_prefix("INV_") {
            let parsed = fields::<4>(rest).and_then(|[sync_id, slot_id, button, action]| {
                Some(Message::InventoryClick {
                    sync_id: num(sync_id)?,
                    slot_id: num(slot_id)?,
                    button: num(button)?,
                    action: num(action)?,
                })
            });
            return parsed.ok_or_else(|| protocol_error(format!("malformed slot click: {line}")));
        }
        if let Some(payload) = line.strip_prefix("CHAT_SET_") {
            return decode_buffer(payload)
                .map(Message::ChatSetBuffer)
                .map_err(|e| protocol_error(format!("bad chat payload: {e}")));
        }
        if line.starts_with("UI_") {
            return Ok(Message::UiDebug(UiEvent::parse(line)));
        }
        Err(protocol_error(format!("unknown message: {line}")))
    }

    /// Render as a protocol line without the trailing newline
    pub fn encode(&self) -> String {
        match self {
            Message::Role(Role::Leader) => "ROLE_LEADER".to_string(),
            Message::Role(Role::Follower) => "ROLE_FOLLOWER".to_string(),
            Message::Pause => "PAUSE".to_string(),
            Message::Resume => "RESUME".to_string(),
            Message::ToggleSync => "TOGGLE_SYNC".to_string(),
            Message::Move(snapshot) => snapshot.encode(),
            Message::CloseScreen => "CLOSE_SCREEN".to_string(),
            Message::OpenScreen(kind) => format!("OPEN_{}", kind.tag()),
            Message::HotbarSelect(index) => format!("HBAR_{index}"),
            Message::InventoryClick {
                sync_id,
                slot_id,
                button,
                action,
            } => format!("INV_{sync_id}_{slot_id}_{button}_{action}"),
            Message::ChatSetBuffer(text) => format!("CHAT_SET_{}", encode_buffer(text)),
            Message::ChatSend => "CHAT_SEND".to_string(),
            Message::UiDebug(event) => event.to_string(),
            Message::Focus(focused) => format!("FOCUS_{}", u8::from(*focused)),
        }
    }

    /// Messages every peer honors regardless of role or pause state
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Message::Role(_) | Message::Pause | Message::Resume | Message::ToggleSync
        )
    }
}

fn protocol_error(detail: impl Into<String>) -> NetworkError {
    NetworkError::ProtocolError(detail.into())
}

fn fields<const N: usize>(rest: &str) -> Option<[&str; N]> {
    let parts: Vec<&str> = rest.split('_').collect();
    parts.try_into().ok()
}

fn num<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// Newline framing over a byte buffer
pub struct LineCodec;

impl LineCodec {
    pub fn encode(line: &str, buf: &mut BytesMut) {
        buf.reserve(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.put_u8(b'\n');
    }

    /// Take the next complete line out of `buf`, without its terminator.
    /// Returns `None` until a newline arrives. Invalid UTF-8 is replaced.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<String>, NetworkError> {
        let Some(end) = buf.iter().position(|b| *b == b'\n') else {
            if buf.len() > MAX_LINE_LEN {
                return Err(protocol_error("line too long"));
            }
            return Ok(None);
        };

        let frame = buf.split_to(end + 1);
        let text = String::from_utf8_lossy(&frame[..end]);
        Ok(Some(text.trim_end_matches('\r').to_string()))
    }
}

/// Line counters for debugging/monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageStats {
    pub lines_sent: u64,
    pub lines_received: u64,
    /// Lines refused because the stream was down or a queue was full
    pub lines_dropped: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl MessageStats {
    pub fn record_sent(&mut self, line: &str) {
        self.lines_sent += 1;
        self.bytes_sent += line.len() as u64 + 1;
    }

    pub fn record_received(&mut self, line: &str) {
        self.lines_received += 1;
        self.bytes_received += line.len() as u64 + 1;
    }

    pub fn record_dropped(&mut self) {
        self.lines_dropped += 1;
    }
}
