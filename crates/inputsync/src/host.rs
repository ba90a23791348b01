//! Boundary to the embedding host process
//!
//! Everything the client needs from the host is expressed here: key and
//! mouse state, the player, the active screen, and the few engine calls
//! that have no structural equivalent. Screen, inventory and widget internals
//! are reached only as [`OpaqueObject`]s and resolved structurally.

use inputsync_introspect::{ClassId, OpaqueObject};
use inputsync_network::OpenKind;
use thiserror::Error;

/// Shift modifier bit in `mods` arguments
pub const MOD_SHIFT: i32 = 0x0001;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("No player present")]
    NoPlayer,

    #[error("Cannot open {0:?} screen: {1}")]
    ScreenUnavailable(OpenKind, String),

    #[error("Host call failed: {0}")]
    CallFailed(String),
}

/// Movement and action bindings the client reads and drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sneak,
    Sprint,
    Attack,
    Use,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(i32),
}

impl MouseButton {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MouseButton::Left,
            1 => MouseButton::Right,
            2 => MouseButton::Middle,
            other => MouseButton::Other(other),
        }
    }

    /// Windowing-system button number, as carried in `UI_CLICK`
    pub fn code(self) -> i32 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Other(code) => code,
        }
    }
}

/// Keys the leader-side capture reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    KeypadEnter,
    Escape,
    E,
    T,
    Slash,
    /// Number row key `1..=9`
    Digit(u8),
    Other(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

/// Coarse classification of the active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    /// Text-entry (chat or command) screen
    Chat,
    /// Container screen with a slot-click session
    Handled,
    /// Pause / game menu
    Menu,
    Other,
}

/// Slot click action, by protocol ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    Pickup,
    QuickMove,
    Swap,
    Clone,
    Throw,
    QuickCraft,
    PickupAll,
}

impl SlotAction {
    const ALL: [SlotAction; 7] = [
        SlotAction::Pickup,
        SlotAction::QuickMove,
        SlotAction::Swap,
        SlotAction::Clone,
        SlotAction::Throw,
        SlotAction::QuickCraft,
        SlotAction::PickupAll,
    ];

    /// Out-of-range ordinals clamp to the nearest valid action
    pub fn from_ordinal(ordinal: i32) -> Self {
        let index = ordinal.clamp(0, Self::ALL.len() as i32 - 1);
        Self::ALL[index as usize]
    }

    pub fn ordinal(self) -> i32 {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0) as i32
    }
}

/// Position of one slot in gui coordinates relative to the screen origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRect {
    pub id: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockHit {
    pub pos: (i32, i32, i32),
    pub face: u8,
}

/// What the crosshair is on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimTarget {
    Block(BlockHit),
    Entity(u64),
    Miss,
}

/// Host-side operations. Called only on the host's main thread.
pub trait Host {
    fn has_player(&self) -> bool;

    /// (yaw, pitch) in degrees
    fn orientation(&self) -> (f32, f32);
    fn set_orientation(&mut self, yaw: f32, pitch: f32);

    fn is_pressed(&self, control: Control) -> bool;
    fn set_pressed(&mut self, control: Control, pressed: bool);

    fn is_sprinting(&self) -> bool;
    fn set_sprinting(&mut self, sprinting: bool);

    /// Raw physical mouse button state
    fn mouse_held(&self, button: MouseButton) -> bool;

    fn is_focused(&self) -> bool;

    /// Framebuffer pixels per gui unit
    fn gui_scale(&self) -> f64;

    fn active_screen(&self) -> Option<ScreenKind>;
    fn screen_object(&mut self) -> Option<&mut dyn OpaqueObject>;
    fn inventory_object(&mut self) -> Option<&mut dyn OpaqueObject>;

    /// Class of slot objects, used to find a screen's hovered slot field
    fn slot_type(&self) -> ClassId;

    fn open_screen(&mut self, kind: OpenKind) -> Result<(), HostError>;
    fn close_screen(&mut self);

    /// Sync id of the open container session, if a handled screen is open
    fn handled_session_id(&self) -> Option<i32>;
    fn slot_rects(&self) -> Vec<SlotRect>;
    fn click_slot(
        &mut self,
        sync_id: i32,
        slot_id: i32,
        button: i32,
        action: SlotAction,
    ) -> Result<(), HostError>;

    fn send_chat(&mut self, text: &str) -> Result<(), HostError>;
    fn send_command(&mut self, command: &str) -> Result<(), HostError>;

    fn aim_target(&self) -> AimTarget;
    fn update_block_breaking(&mut self, hit: &BlockHit) -> Result<(), HostError>;
    fn cancel_block_breaking(&mut self);
    fn interact_block(&mut self, hit: &BlockHit) -> Result<(), HostError>;
    fn interact_entity(&mut self, entity: u64) -> Result<(), HostError>;
    fn interact_item(&mut self) -> Result<(), HostError>;
    fn attack_entity(&mut self, entity: u64) -> Result<(), HostError>;
    fn swing_hand(&mut self);
}
