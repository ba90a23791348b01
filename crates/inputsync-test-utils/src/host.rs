//! In-memory host recording every engine call

use crate::fixtures;
use inputsync::host::{
    AimTarget, BlockHit, Control, Host, HostError, MouseButton, ScreenKind, SlotAction, SlotRect,
};
use inputsync_introspect::{ClassId, DynObject, OpaqueObject};
use inputsync_network::OpenKind;
use std::collections::HashSet;

/// Engine calls that have a visible effect
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    OpenScreen(OpenKind),
    CloseScreen,
    ClickSlot {
        sync_id: i32,
        slot_id: i32,
        button: i32,
        action: SlotAction,
    },
    Chat(String),
    Command(String),
    UpdateBreaking(BlockHit),
    CancelBreaking,
    InteractBlock(BlockHit),
    InteractEntity(u64),
    InteractItem,
    Attack(u64),
    Swing,
}

pub struct MockScreen {
    pub kind: ScreenKind,
    pub object: DynObject,
    pub sync_id: Option<i32>,
}

pub struct MockHost {
    pub player: bool,
    pub orientation: (f32, f32),
    pub pressed: HashSet<Control>,
    pub sprinting: bool,
    pub mouse: HashSet<MouseButton>,
    pub focused: bool,
    pub gui_scale: f64,
    pub screen: Option<MockScreen>,
    pub inventory: Option<DynObject>,
    pub aim: AimTarget,
    pub slots: Vec<SlotRect>,
    /// Sync id given to containers opened through `open_screen`
    pub next_sync_id: i32,
    /// Make `update_block_breaking` fail
    pub fail_breaking: bool,
    pub events: Vec<HostEvent>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            player: false,
            orientation: (0.0, 0.0),
            pressed: HashSet::new(),
            sprinting: false,
            mouse: HashSet::new(),
            focused: false,
            gui_scale: 2.0,
            screen: None,
            inventory: None,
            aim: AimTarget::Miss,
            slots: Vec::new(),
            next_sync_id: 1,
            fail_breaking: false,
            events: Vec::new(),
        }
    }
}

impl MockHost {
    /// Focused player in the world, no screen open, hotbar slot 0
    pub fn in_world() -> Self {
        Self {
            player: true,
            focused: true,
            inventory: Some(fixtures::inventory(0)),
            ..Self::default()
        }
    }

    pub fn with_screen(mut self, kind: ScreenKind, object: DynObject, sync_id: Option<i32>) -> Self {
        self.show(kind, object, sync_id);
        self
    }

    pub fn show(&mut self, kind: ScreenKind, object: DynObject, sync_id: Option<i32>) {
        self.screen = Some(MockScreen {
            kind,
            object,
            sync_id,
        });
    }

    pub fn press(&mut self, control: Control) {
        self.pressed.insert(control);
    }

    pub fn pressed(&self, control: Control) -> bool {
        self.pressed.contains(&control)
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, event: &HostEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn selected_hotbar(&self) -> Option<i32> {
        self.inventory.as_ref().and_then(|inv| inv.int("selectedSlot"))
    }

    fn chat_input(&self) -> Option<&DynObject> {
        self.screen
            .as_ref()
            .filter(|s| s.kind == ScreenKind::Chat)
            .and_then(|s| s.object.child("input"))
    }

    /// Text of the open chat screen's input field
    pub fn chat_text(&self) -> Option<String> {
        self.chat_input()
            .and_then(|input| input.text("text"))
            .map(str::to_string)
    }

    /// (cursor, selectionStart, selectionEnd) of the chat input
    pub fn chat_cursor(&self) -> Option<(i32, i32, i32)> {
        let input = self.chat_input()?;
        Some((
            input.int("cursor")?,
            input.int("selectionStart")?,
            input.int("selectionEnd")?,
        ))
    }
}

impl Host for MockHost {
    fn has_player(&self) -> bool {
        self.player
    }

    fn orientation(&self) -> (f32, f32) {
        self.orientation
    }

    fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.orientation = (yaw, pitch);
    }

    fn is_pressed(&self, control: Control) -> bool {
        self.pressed.contains(&control)
    }

    fn set_pressed(&mut self, control: Control, pressed: bool) {
        if pressed {
            self.pressed.insert(control);
        } else {
            self.pressed.remove(&control);
        }
    }

    fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    fn set_sprinting(&mut self, sprinting: bool) {
        self.sprinting = sprinting;
    }

    fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse.contains(&button)
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn gui_scale(&self) -> f64 {
        self.gui_scale
    }

    fn active_screen(&self) -> Option<ScreenKind> {
        self.screen.as_ref().map(|s| s.kind)
    }

    fn screen_object(&mut self) -> Option<&mut dyn OpaqueObject> {
        self.screen
            .as_mut()
            .map(|s| &mut s.object as &mut dyn OpaqueObject)
    }

    fn inventory_object(&mut self) -> Option<&mut dyn OpaqueObject> {
        if !self.player {
            return None;
        }
        self.inventory
            .as_mut()
            .map(|inv| inv as &mut dyn OpaqueObject)
    }

    fn slot_type(&self) -> ClassId {
        ClassId::new(fixtures::SLOT_CLASS)
    }

    fn open_screen(&mut self, kind: OpenKind) -> Result<(), HostError> {
        let (screen_kind, object, sync_id) = match kind {
            OpenKind::Inventory => {
                let sync_id = self.next_sync_id;
                self.next_sync_id += 1;
                (
                    ScreenKind::Handled,
                    fixtures::container_screen((0, 0), None),
                    Some(sync_id),
                )
            }
            OpenKind::Chat => (ScreenKind::Chat, fixtures::chat_screen(""), None),
            OpenKind::Command => (ScreenKind::Chat, fixtures::chat_screen("/"), None),
            OpenKind::Menu => (ScreenKind::Menu, fixtures::menu_screen(), None),
        };
        self.show(screen_kind, object, sync_id);
        self.events.push(HostEvent::OpenScreen(kind));
        Ok(())
    }

    fn close_screen(&mut self) {
        self.screen = None;
        self.events.push(HostEvent::CloseScreen);
    }

    fn handled_session_id(&self) -> Option<i32> {
        self.screen
            .as_ref()
            .filter(|s| s.kind == ScreenKind::Handled)
            .and_then(|s| s.sync_id)
    }

    fn slot_rects(&self) -> Vec<SlotRect> {
        self.slots.clone()
    }

    fn click_slot(
        &mut self,
        sync_id: i32,
        slot_id: i32,
        button: i32,
        action: SlotAction,
    ) -> Result<(), HostError> {
        self.events.push(HostEvent::ClickSlot {
            sync_id,
            slot_id,
            button,
            action,
        });
        Ok(())
    }

    fn send_chat(&mut self, text: &str) -> Result<(), HostError> {
        self.events.push(HostEvent::Chat(text.to_string()));
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<(), HostError> {
        self.events.push(HostEvent::Command(command.to_string()));
        Ok(())
    }

    fn aim_target(&self) -> AimTarget {
        self.aim
    }

    fn update_block_breaking(&mut self, hit: &BlockHit) -> Result<(), HostError> {
        if self.fail_breaking {
            return Err(HostError::CallFailed("block breaking rejected".to_string()));
        }
        self.events.push(HostEvent::UpdateBreaking(*hit));
        Ok(())
    }

    fn cancel_block_breaking(&mut self) {
        self.events.push(HostEvent::CancelBreaking);
    }

    fn interact_block(&mut self, hit: &BlockHit) -> Result<(), HostError> {
        self.events.push(HostEvent::InteractBlock(*hit));
        Ok(())
    }

    fn interact_entity(&mut self, entity: u64) -> Result<(), HostError> {
        self.events.push(HostEvent::InteractEntity(entity));
        Ok(())
    }

    fn interact_item(&mut self) -> Result<(), HostError> {
        self.events.push(HostEvent::InteractItem);
        Ok(())
    }

    fn attack_entity(&mut self, entity: u64) -> Result<(), HostError> {
        self.events.push(HostEvent::Attack(entity));
        Ok(())
    }

    fn swing_hand(&mut self) {
        self.events.push(HostEvent::Swing);
    }
}
