//! Follower-side application of received commands
//!
//! [`Replica`] turns protocol messages into host calls. It owns the small
//! amount of state replay needs across ticks: the previous attack/use
//! buttons for edge detection, whether block breaking is in progress, and
//! which diagnostics were already dumped.

use crate::capture::hotbar_capability;
use crate::host::{AimTarget, Control, Host, HostError, ScreenKind, SlotAction};
use inputsync_introspect::diagnostics::{describe_candidates, describe_packed};
use inputsync_introspect::{ClassId, IntrospectError, OpaqueObject, StructuralResolver};
use inputsync_network::{Message, OpenKind, UiEvent};
use inputsync_state::Snapshot;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("No player present")]
    NoPlayer,

    #[error("Expected a {expected:?} screen")]
    WrongScreen { expected: ScreenKind },

    #[error("Slot click for session {received}, open session is {open:?}")]
    StaleSession { received: i32, open: Option<i32> },

    #[error("{0} not found")]
    Missing(&'static str),

    #[error("Introspection failed: {0}")]
    Introspect(#[from] IntrospectError),

    #[error("Host call failed: {0}")]
    Host(#[from] HostError),
}

impl ApplyError {
    /// Outcomes that just mean the follower is in a different state than the
    /// leader was. These are dropped quietly.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            ApplyError::NoPlayer
                | ApplyError::WrongScreen { .. }
                | ApplyError::StaleSession { .. }
                | ApplyError::Host(HostError::NoPlayer)
                | ApplyError::Introspect(IntrospectError::Unsupported { .. })
        )
    }
}

#[derive(Debug, Default)]
pub struct Replica {
    last_attack_held: bool,
    last_use_held: bool,
    was_breaking: bool,
    candidates_dumped: bool,
    packed_dumped_for: Option<ClassId>,
}

impl Replica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_breaking(&self) -> bool {
        self.was_breaking
    }

    /// Forget edge state so the first snapshot after a reconnect does not
    /// compare against the previous session
    pub fn reset_edges(&mut self) {
        self.last_attack_held = false;
        self.last_use_held = false;
        self.was_breaking = false;
    }

    pub fn apply(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        message: Message,
    ) -> Result<(), ApplyError> {
        match message {
            Message::Move(snapshot) => self.apply_snapshot(host, resolver, &snapshot),
            Message::CloseScreen => {
                host.close_screen();
                Ok(())
            }
            Message::OpenScreen(kind) => self.open_screen(host, kind),
            Message::HotbarSelect(index) => self.set_hotbar(host, resolver, index),
            Message::InventoryClick {
                sync_id,
                slot_id,
                button,
                action,
            } => self.inventory_click(host, sync_id, slot_id, button, action),
            Message::ChatSetBuffer(text) => self.chat_set(host, resolver, &text),
            Message::ChatSend => self.chat_send(host, resolver),
            Message::UiDebug(event) => {
                self.ui_debug(host, resolver, &event);
                Ok(())
            }
            Message::Role(_)
            | Message::Pause
            | Message::Resume
            | Message::ToggleSync
            | Message::Focus(_) => Ok(()),
        }
    }

    /// Drive the local player from a leader snapshot
    pub fn apply_snapshot(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        snapshot: &Snapshot,
    ) -> Result<(), ApplyError> {
        if !host.has_player() {
            return Err(ApplyError::NoPlayer);
        }

        host.set_orientation(snapshot.yaw, snapshot.pitch);
        if let Err(e) = self.set_hotbar(host, resolver, i32::from(snapshot.hotbar)) {
            debug!("Hotbar not applied: {}", e);
        }

        host.set_pressed(Control::Forward, snapshot.forward > 0.0);
        host.set_pressed(Control::Back, snapshot.forward < 0.0);
        host.set_pressed(Control::Right, snapshot.strafe > 0.0);
        host.set_pressed(Control::Left, snapshot.strafe < 0.0);
        host.set_pressed(Control::Jump, snapshot.jump);
        host.set_pressed(Control::Sneak, snapshot.sneak);
        host.set_pressed(Control::Sprint, snapshot.sprint);
        host.set_sprinting(snapshot.sprint && snapshot.forward.abs() > 0.0 && !snapshot.sneak);

        // Attack and use run through explicit calls below, never the bindings
        host.set_pressed(Control::Use, false);
        host.set_pressed(Control::Attack, false);

        let mut outcome = Ok(());
        if host.active_screen().is_none() {
            if snapshot.attack_held {
                outcome = self.advance_breaking(host);
            } else {
                self.stop_breaking(host);
            }
            if snapshot.use_held && !self.last_use_held {
                outcome = outcome.and(self.use_pulse(host));
            }
            if snapshot.attack_held && !self.last_attack_held {
                outcome = outcome.and(self.attack_pulse(host));
            }
        } else {
            self.stop_breaking(host);
        }

        self.last_attack_held = snapshot.attack_held;
        self.last_use_held = snapshot.use_held;
        outcome
    }

    pub fn set_hotbar(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        index: i32,
    ) -> Result<(), ApplyError> {
        let inventory = host.inventory_object().ok_or(ApplyError::NoPlayer)?;
        let written = resolver.write_int(inventory, &hotbar_capability(), index)?;
        if written != index {
            debug!("Hotbar index {} clamped to {}", index, written);
        }
        Ok(())
    }

    /// Inventory, chat and command screens open only over the world view;
    /// the menu always opens
    pub fn open_screen(&mut self, host: &mut dyn Host, kind: OpenKind) -> Result<(), ApplyError> {
        if kind != OpenKind::Menu {
            if !host.has_player() {
                return Err(ApplyError::NoPlayer);
            }
            if let Some(current) = host.active_screen() {
                debug!("Not opening {:?} over {:?} screen", kind, current);
                return Ok(());
            }
        }
        host.open_screen(kind)?;
        Ok(())
    }

    pub fn inventory_click(
        &mut self,
        host: &mut dyn Host,
        sync_id: i32,
        slot_id: i32,
        button: i32,
        action: i32,
    ) -> Result<(), ApplyError> {
        if !host.has_player() {
            return Err(ApplyError::NoPlayer);
        }
        if host.active_screen() != Some(ScreenKind::Handled) {
            return Err(ApplyError::WrongScreen {
                expected: ScreenKind::Handled,
            });
        }
        let open = host.handled_session_id();
        if open != Some(sync_id) {
            return Err(ApplyError::StaleSession {
                received: sync_id,
                open,
            });
        }
        host.click_slot(sync_id, slot_id, button, SlotAction::from_ordinal(action))?;
        Ok(())
    }

    /// Replace the open text-entry buffer and put the caret at its end.
    /// Caret positions count UTF-16 code units, as the host's widgets do.
    pub fn chat_set(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        text: &str,
    ) -> Result<(), ApplyError> {
        let cursor = i32::try_from(text.encode_utf16().count()).unwrap_or(i32::MAX);
        with_chat_widget(host, resolver, |resolver, widget| {
            let how = resolver.write_text(widget, text)?;
            let moved = resolver.place_cursor(widget, cursor)?;
            debug!("Chat buffer set via {:?}, {} cursor mutators", how, moved);
            Ok(())
        })
    }

    /// Submit the open buffer: blank closes, `/` runs a command, anything
    /// else is chat. The screen is closed afterwards either way.
    pub fn chat_send(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
    ) -> Result<(), ApplyError> {
        if host.active_screen() != Some(ScreenKind::Chat) {
            return Err(ApplyError::WrongScreen {
                expected: ScreenKind::Chat,
            });
        }
        let text = read_chat_buffer(host, resolver).unwrap_or_default();

        let sent = if text.trim().is_empty() {
            Ok(())
        } else if let Some(command) = text.strip_prefix('/') {
            host.send_command(command)
        } else {
            host.send_chat(&text)
        };
        host.close_screen();
        sent.map_err(ApplyError::from)
    }

    /// Raw UI events are not replayed. They only trigger one-time dumps of
    /// the screen's input entry points.
    pub fn ui_debug(
        &mut self,
        host: &mut dyn Host,
        resolver: &mut StructuralResolver,
        event: &UiEvent,
    ) {
        let Some(screen) = host.screen_object() else {
            return;
        };
        let class = screen.class();

        if !self.candidates_dumped && event.wants_candidate_dump() {
            self.candidates_dumped = true;
            info!("=== UI CANDIDATE METHODS ({}) ===", class.id);
            for line in describe_candidates(&class) {
                info!("  {}", line);
            }
        }

        if self.packed_dumped_for.as_ref() != Some(&class.id) {
            self.packed_dumped_for = Some(class.id.clone());
            if let Some(handler) = resolver.packed_handler(&*screen) {
                for line in describe_packed(&class, &handler) {
                    info!("{}", line);
                }
            }
        }

        if !matches!(event, UiEvent::Move { .. }) {
            debug!("{} replay failed (no matching signature)", event.kind());
        }
    }

    fn advance_breaking(&mut self, host: &mut dyn Host) -> Result<(), ApplyError> {
        match host.aim_target() {
            AimTarget::Block(hit) => {
                // A failed update may still have left progress behind
                self.was_breaking = true;
                host.update_block_breaking(&hit)?;
            }
            AimTarget::Entity(_) | AimTarget::Miss => self.stop_breaking(host),
        }
        Ok(())
    }

    fn stop_breaking(&mut self, host: &mut dyn Host) {
        if self.was_breaking {
            self.was_breaking = false;
            host.cancel_block_breaking();
        }
    }

    fn use_pulse(&mut self, host: &mut dyn Host) -> Result<(), ApplyError> {
        match host.aim_target() {
            AimTarget::Block(hit) => host.interact_block(&hit)?,
            AimTarget::Entity(entity) => host.interact_entity(entity)?,
            AimTarget::Miss => host.interact_item()?,
        }
        host.swing_hand();
        Ok(())
    }

    fn attack_pulse(&mut self, host: &mut dyn Host) -> Result<(), ApplyError> {
        if let AimTarget::Entity(entity) = host.aim_target() {
            host.attack_entity(entity)?;
        }
        host.swing_hand();
        Ok(())
    }
}

/// Run `f` against the open chat screen's text-entry widget
pub(crate) fn with_chat_widget<R>(
    host: &mut dyn Host,
    resolver: &mut StructuralResolver,
    f: impl FnOnce(&mut StructuralResolver, &mut dyn OpaqueObject) -> Result<R, IntrospectError>,
) -> Result<R, ApplyError> {
    if host.active_screen() != Some(ScreenKind::Chat) {
        return Err(ApplyError::WrongScreen {
            expected: ScreenKind::Chat,
        });
    }
    let screen = host.screen_object().ok_or(ApplyError::WrongScreen {
        expected: ScreenKind::Chat,
    })?;
    let field = resolver
        .text_widget(&*screen)
        .ok_or(ApplyError::Missing("text-entry widget"))?;
    let widget = screen
        .child_mut(&field)
        .ok_or(ApplyError::Missing("text-entry widget"))?;
    Ok(f(resolver, widget)?)
}

/// Current text-entry buffer, or `None` when no chat screen is open.
/// An unreadable buffer reads as empty.
pub(crate) fn read_chat_buffer(
    host: &mut dyn Host,
    resolver: &mut StructuralResolver,
) -> Option<String> {
    if host.active_screen() != Some(ScreenKind::Chat) {
        return None;
    }
    match with_chat_widget(host, resolver, |resolver, widget| resolver.read_text(widget)) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("Chat buffer unreadable: {}", e);
            Some(String::new())
        }
    }
}
