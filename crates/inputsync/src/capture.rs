//! Leader-side snapshot capture

use crate::host::{Control, Host, MouseButton};
use inputsync_introspect::{Capability, StructuralResolver};
use inputsync_state::snapshot::HOTBAR_MAX;
use inputsync_state::Snapshot;

/// Selected hotbar index on the player inventory
pub fn hotbar_capability() -> Capability {
    Capability::bounded_int("selectedSlot", 0..=i32::from(HOTBAR_MAX))
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Current local input, or `None` without a player
pub fn capture(host: &mut dyn Host, resolver: &mut StructuralResolver) -> Option<Snapshot> {
    if !host.has_player() {
        return None;
    }
    let (yaw, pitch) = host.orientation();

    // Mouse buttons only count as world actions with no screen open
    let in_world = host.active_screen().is_none();

    Some(Snapshot {
        yaw,
        pitch,
        forward: axis(host.is_pressed(Control::Forward), host.is_pressed(Control::Back)),
        strafe: axis(host.is_pressed(Control::Right), host.is_pressed(Control::Left)),
        jump: host.is_pressed(Control::Jump),
        sneak: host.is_pressed(Control::Sneak),
        sprint: host.is_pressed(Control::Sprint) || host.is_sprinting(),
        attack_held: in_world && host.mouse_held(MouseButton::Left),
        use_held: in_world && host.mouse_held(MouseButton::Right),
        hotbar: selected_hotbar(host, resolver),
    })
}

/// Hotbar index via structural lookup, 0 when undiscoverable
pub fn selected_hotbar(host: &mut dyn Host, resolver: &mut StructuralResolver) -> u8 {
    host.inventory_object()
        .and_then(|inventory| resolver.read_int(&*inventory, &hotbar_capability()))
        .and_then(|index| u8::try_from(index).ok())
        .unwrap_or(0)
}
