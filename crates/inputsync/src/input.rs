//! Leader-side input capture
//!
//! Discrete key and mouse events on the leader become protocol commands:
//! screen open/close, hotbar selection, chat submission, slot clicks, and the
//! raw `UI_` debug stream.

use crate::host::{Host, Key, KeyAction, MouseButton, ScreenKind, SlotAction, MOD_SHIFT};
use inputsync_introspect::{Capability, StructuralResolver};
use inputsync_network::{Message, OpenKind, Outbound, UiEvent};
use tracing::trace;

/// Slot id sent when the pointer is over no slot
pub const NO_SLOT: i32 = -999;

/// Slots are square, this many gui units wide
pub const SLOT_SIZE: f64 = 16.0;

/// Plausible range for a screen's gui origin coordinates
const ORIGIN_RANGE: std::ops::RangeInclusive<i32> = 0..=5000;

/// Host input callbacks. Every method defaults to doing nothing, so a
/// previously installed listener need only implement what it handles.
pub trait InputListener {
    fn on_cursor_pos(&mut self, _host: &mut dyn Host, _x: f64, _y: f64) {}

    fn on_mouse_button(
        &mut self,
        _host: &mut dyn Host,
        _button: MouseButton,
        _action: KeyAction,
        _mods: i32,
    ) {
    }

    fn on_scroll(&mut self, _host: &mut dyn Host, _dx: f64, _dy: f64) {}

    fn on_key(
        &mut self,
        _host: &mut dyn Host,
        _key: Key,
        _scancode: i32,
        _action: KeyAction,
        _mods: i32,
    ) {
    }

    fn on_char(&mut self, _host: &mut dyn Host, _codepoint: u32, _mods: i32) {}
}

/// Pointer position in gui units plus the last seen modifiers
#[derive(Debug, Default)]
pub struct InputCapture {
    ui_x: f64,
    ui_y: f64,
}

impl InputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> (f64, f64) {
        (self.ui_x, self.ui_y)
    }

    pub fn cursor_moved(&mut self, host: &dyn Host, out: &dyn Outbound, x: f64, y: f64) {
        let scale = match host.gui_scale() {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        self.ui_x = x / scale;
        self.ui_y = y / scale;
        if out.is_active() {
            send(out, Message::UiDebug(UiEvent::Move {
                x: self.ui_x,
                y: self.ui_y,
            }));
        }
    }

    pub fn mouse_button(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        out: &dyn Outbound,
        button: MouseButton,
        action: KeyAction,
        mods: i32,
    ) {
        if !out.is_active() {
            return;
        }

        if action == KeyAction::Press && host.active_screen() == Some(ScreenKind::Handled) {
            if let Some(sync_id) = host.handled_session_id() {
                let slot_id = self.slot_at_pointer(host, resolver);
                let action = if mods & MOD_SHIFT != 0 {
                    SlotAction::QuickMove
                } else {
                    SlotAction::Pickup
                };
                send(out, Message::InventoryClick {
                    sync_id,
                    slot_id,
                    button: i32::from(button == MouseButton::Right),
                    action: action.ordinal(),
                });
                return;
            }
        }

        let (x, y, button) = (self.ui_x, self.ui_y, button.code());
        let event = match action {
            KeyAction::Press => UiEvent::Click { button, x, y, mods },
            KeyAction::Release => UiEvent::Release { button, x, y, mods },
            KeyAction::Repeat => return,
        };
        send(out, Message::UiDebug(event));
    }

    pub fn scrolled(&mut self, out: &dyn Outbound, dx: f64, dy: f64) {
        if out.is_active() {
            send(out, Message::UiDebug(UiEvent::Scroll {
                x: self.ui_x,
                y: self.ui_y,
                dx,
                dy,
            }));
        }
    }

    pub fn char_typed(&mut self, out: &dyn Outbound, codepoint: u32, mods: i32) {
        if out.is_active() {
            send(out, Message::UiDebug(UiEvent::Char { codepoint, mods }));
        }
    }

    /// Handle a key press. `screen_before` is the screen that was open before
    /// the host processed the key.
    pub fn key_pressed(
        &mut self,
        host: &dyn Host,
        out: &dyn Outbound,
        key: Key,
        action: KeyAction,
        screen_before: Option<ScreenKind>,
    ) {
        if action != KeyAction::Press || !out.is_active() {
            return;
        }

        if screen_before == Some(ScreenKind::Chat) {
            match key {
                Key::Enter | Key::KeypadEnter => send(out, Message::ChatSend),
                Key::Escape => send(out, Message::CloseScreen),
                _ => {}
            }
            return;
        }

        match key {
            Key::Escape if screen_before.is_none() => {
                send(out, Message::OpenScreen(OpenKind::Menu))
            }
            Key::Escape => send(out, Message::CloseScreen),
            Key::E if screen_before.is_none() => {
                send(out, Message::OpenScreen(OpenKind::Inventory))
            }
            Key::E => send(out, Message::CloseScreen),
            Key::T if screen_before.is_none() => send(out, Message::OpenScreen(OpenKind::Chat)),
            Key::Slash if screen_before.is_none() => {
                send(out, Message::OpenScreen(OpenKind::Command))
            }
            Key::Digit(digit @ 1..=9) if host.has_player() => {
                send(out, Message::HotbarSelect(i32::from(digit) - 1))
            }
            _ => {}
        }
    }

    /// Id of the slot under the pointer: the screen's hovered-slot field when
    /// discoverable, else a hit test over slot rectangles
    pub fn slot_at_pointer(&self, host: &mut dyn Host, resolver: &mut StructuralResolver) -> i32 {
        if let Some(id) = hovered_slot(host, resolver) {
            return id;
        }

        let origin = host
            .screen_object()
            .and_then(|screen| resolver.int_pair(&*screen, &Capability::int_pair(ORIGIN_RANGE)))
            .unwrap_or((0, 0));
        let rx = self.ui_x - f64::from(origin.0);
        let ry = self.ui_y - f64::from(origin.1);

        host.slot_rects()
            .into_iter()
            .find(|slot| {
                let (sx, sy) = (f64::from(slot.x), f64::from(slot.y));
                rx >= sx && rx < sx + SLOT_SIZE && ry >= sy && ry < sy + SLOT_SIZE
            })
            .map_or(NO_SLOT, |slot| slot.id)
    }
}

/// Slot id of the screen's hovered-slot field. An empty field counts as a
/// miss so the caller falls back to the hit test.
fn hovered_slot(host: &mut dyn Host, resolver: &mut StructuralResolver) -> Option<i32> {
    let slot_type = host.slot_type();
    let screen = host.screen_object()?;
    let field = resolver.typed_field(&*screen, slot_type.as_str())?;
    let slot = screen.child_mut(&field)?;
    resolver
        .read_int(&*slot, &slot_id_capability())
        .filter(|id| *id != NO_SLOT)
}

fn slot_id_capability() -> Capability {
    Capability::bounded_int("id", 0..=i32::MAX)
}

fn send(out: &dyn Outbound, message: Message) {
    let line = message.encode();
    if !out.send(&line) {
        trace!("Not sent: {}", line);
    }
}
