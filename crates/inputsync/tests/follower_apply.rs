use inputsync::host::{AimTarget, BlockHit, Control, ScreenKind, SlotAction};
use inputsync::SyncClient;
use inputsync_introspect::Value;
use inputsync_network::{LineHandler, OpenKind, Role};
use inputsync_test_utils::{fixtures, init_test_logging, HostEvent, MockHost, RecordingOutbound};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const HIT: BlockHit = BlockHit {
    pos: (10, 64, -3),
    face: 1,
};

fn follower() -> (SyncClient, Arc<RecordingOutbound>) {
    init_test_logging();
    let outbound = RecordingOutbound::connected(Role::Follower);
    let client = SyncClient::with_outbound(outbound.clone());
    (client, outbound)
}

fn feed(client: &SyncClient, line: &str) {
    client.dispatcher().on_line(line);
}

#[test]
fn move_snapshot_drives_player() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "MOVE_90.000000_-12.500000_1.000000_0.000000_0_0_1_0_0_2");
    client.on_tick(&mut host);

    assert_eq!(host.orientation, (90.0, -12.5));
    assert!(host.pressed(Control::Forward));
    assert!(!host.pressed(Control::Back));
    assert!(!host.pressed(Control::Left));
    assert!(host.sprinting);
    assert_eq!(host.selected_hotbar(), Some(2));
}

#[test]
fn latest_snapshot_is_reapplied_every_tick() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "MOVE_0_0_-1_1_1_0_0_0_0_0");
    client.on_tick(&mut host);
    assert!(host.pressed(Control::Back));
    assert!(host.pressed(Control::Right));
    assert!(host.pressed(Control::Jump));

    // Something local releases the keys; the next tick presses them again
    host.pressed.clear();
    client.on_tick(&mut host);
    assert!(host.pressed(Control::Back));
    assert!(host.pressed(Control::Jump));

    feed(&client, "MOVE_0_0_0_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    assert!(host.pressed.is_empty());
}

#[test]
fn sneaking_never_sprints() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "MOVE_0_0_1_0_0_1_1_0_0_0");
    client.on_tick(&mut host);
    assert!(host.pressed(Control::Sneak));
    assert!(host.pressed(Control::Sprint));
    assert!(!host.sprinting);

    // Sprint with no forward motion
    feed(&client, "MOVE_0_0_0_0_0_0_1_0_0_0");
    client.on_tick(&mut host);
    assert!(!host.sprinting);
}

#[test]
fn use_fires_once_per_press() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.aim = AimTarget::Block(HIT);

    feed(&client, "MOVE_0_0_0_0_0_0_0_0_1_0");
    for _ in 0..3 {
        client.on_tick(&mut host);
    }
    assert_eq!(host.count(&HostEvent::InteractBlock(HIT)), 1);
    assert_eq!(host.count(&HostEvent::Swing), 1);
    assert!(!host.pressed(Control::Use));

    feed(&client, "MOVE_0_0_0_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    feed(&client, "MOVE_0_0_0_0_0_0_0_0_1_0");
    client.on_tick(&mut host);
    assert_eq!(host.count(&HostEvent::InteractBlock(HIT)), 2);
}

#[test]
fn use_targets_follow_the_crosshair() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    host.aim = AimTarget::Entity(42);
    feed(&client, "MOVE_0_0_0_0_0_0_0_0_1_0");
    client.on_tick(&mut host);

    host.aim = AimTarget::Miss;
    feed(&client, "MOVE_0_0_0_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    feed(&client, "MOVE_0_0_0_0_0_0_0_0_1_0");
    client.on_tick(&mut host);

    assert_eq!(
        host.take_events(),
        vec![
            HostEvent::InteractEntity(42),
            HostEvent::Swing,
            HostEvent::InteractItem,
            HostEvent::Swing,
        ]
    );
}

#[test]
fn held_attack_keeps_breaking_until_released() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.aim = AimTarget::Block(HIT);

    feed(&client, "MOVE_0_0_0_0_0_0_0_1_0_0");
    client.on_tick(&mut host);
    client.on_tick(&mut host);
    assert_eq!(host.count(&HostEvent::UpdateBreaking(HIT)), 2);
    // The press edge swings once; there is no entity to hit
    assert_eq!(host.count(&HostEvent::Swing), 1);

    feed(&client, "MOVE_0_0_0_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    client.on_tick(&mut host);
    assert_eq!(host.count(&HostEvent::CancelBreaking), 1);
}

#[test]
fn failed_breaking_update_is_still_cancelled() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.aim = AimTarget::Block(HIT);
    host.fail_breaking = true;

    feed(&client, "MOVE_0_0_0_0_0_0_0_1_0_0");
    client.on_tick(&mut host);
    assert_eq!(host.count(&HostEvent::UpdateBreaking(HIT)), 0);

    feed(&client, "MOVE_0_0_0_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    assert_eq!(host.count(&HostEvent::CancelBreaking), 1);
}

#[test]
fn attack_edge_hits_entity() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.aim = AimTarget::Entity(7);

    feed(&client, "MOVE_0_0_0_0_0_0_0_1_0_0");
    client.on_tick(&mut host);
    client.on_tick(&mut host);

    assert_eq!(host.take_events(), vec![HostEvent::Attack(7), HostEvent::Swing]);
}

#[test]
fn opening_a_screen_stops_breaking_and_pulses() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.aim = AimTarget::Block(HIT);

    feed(&client, "MOVE_0_0_0_0_0_0_0_1_0_0");
    client.on_tick(&mut host);
    host.take_events();

    host.show(ScreenKind::Menu, fixtures::menu_screen(), None);
    feed(&client, "MOVE_0_0_0_0_0_0_0_1_1_0");
    client.on_tick(&mut host);
    assert_eq!(host.take_events(), vec![HostEvent::CancelBreaking]);
}

#[test]
fn chat_buffer_is_replaced_with_cursor_at_end() {
    let (mut client, _outbound) = follower();
    let mut host =
        MockHost::in_world().with_screen(ScreenKind::Chat, fixtures::chat_screen("old text"), None);

    for _ in 0..2 {
        feed(&client, "CHAT_SET_SGVsbG8=");
        client.on_tick(&mut host);
        assert_eq!(host.chat_text().as_deref(), Some("Hello"));
        assert_eq!(host.chat_cursor(), Some((5, 5, 5)));
    }
}

#[test]
fn chat_cursor_counts_utf16_units() {
    let (mut client, _outbound) = follower();
    let mut host =
        MockHost::in_world().with_screen(ScreenKind::Chat, fixtures::chat_screen(""), None);

    // "a" plus an emoji outside the basic plane
    feed(&client, "CHAT_SET_YfCfmIA=");
    client.on_tick(&mut host);
    assert_eq!(host.chat_text().as_deref(), Some("a\u{1F600}"));
    assert_eq!(host.chat_cursor(), Some((3, 3, 3)));
}

#[test]
fn chat_buffer_without_chat_screen_is_dropped() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "CHAT_SET_SGVsbG8=");
    client.on_tick(&mut host);
    assert!(host.screen.is_none());
    assert!(host.events.is_empty());
}

#[test]
fn chat_send_routes_commands_and_messages() {
    let (mut client, _outbound) = follower();

    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Chat,
        fixtures::chat_screen("/time set day"),
        None,
    );
    feed(&client, "CHAT_SEND");
    client.on_tick(&mut host);
    assert_eq!(
        host.take_events(),
        vec![HostEvent::Command("time set day".to_string()), HostEvent::CloseScreen]
    );
    assert!(host.screen.is_none());

    host.show(ScreenKind::Chat, fixtures::chat_screen("hi all"), None);
    feed(&client, "CHAT_SEND");
    client.on_tick(&mut host);
    assert_eq!(
        host.take_events(),
        vec![HostEvent::Chat("hi all".to_string()), HostEvent::CloseScreen]
    );

    host.show(ScreenKind::Chat, fixtures::chat_screen("   "), None);
    feed(&client, "CHAT_SEND");
    client.on_tick(&mut host);
    assert_eq!(host.take_events(), vec![HostEvent::CloseScreen]);
}

#[test]
fn slot_clicks_need_the_matching_session() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::container_screen((0, 0), None),
        Some(3),
    );

    feed(&client, "INV_4_10_0_0");
    feed(&client, "INV_3_10_1_1");
    feed(&client, "INV_3_11_0_42");
    client.on_tick(&mut host);

    assert_eq!(
        host.take_events(),
        vec![
            HostEvent::ClickSlot {
                sync_id: 3,
                slot_id: 10,
                button: 1,
                action: SlotAction::QuickMove,
            },
            HostEvent::ClickSlot {
                sync_id: 3,
                slot_id: 11,
                button: 0,
                action: SlotAction::PickupAll,
            },
        ]
    );
}

#[test]
fn screens_open_only_over_the_world_except_menu() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "OPEN_INV");
    feed(&client, "OPEN_CHAT");
    feed(&client, "OPEN_MENU");
    feed(&client, "CLOSE_SCREEN");
    feed(&client, "OPEN_CMD");
    client.on_tick(&mut host);

    assert_eq!(
        host.take_events(),
        vec![
            HostEvent::OpenScreen(OpenKind::Inventory),
            HostEvent::OpenScreen(OpenKind::Menu),
            HostEvent::CloseScreen,
            HostEvent::OpenScreen(OpenKind::Command),
        ]
    );
    assert_eq!(host.chat_text().as_deref(), Some("/"));
}

#[test]
fn hotbar_selection_is_clamped() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "HBAR_12");
    client.on_tick(&mut host);
    assert_eq!(host.selected_hotbar(), Some(8));

    feed(&client, "HBAR_-3");
    client.on_tick(&mut host);
    assert_eq!(host.selected_hotbar(), Some(0));
}

#[test]
fn hotbar_found_on_obfuscated_inventory() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.inventory = Some(fixtures::obfuscated_inventory(4));

    feed(&client, "HBAR_6");
    client.on_tick(&mut host);
    let inventory = host.inventory.as_ref().unwrap();
    assert_eq!(inventory.int("b"), Some(6));
    assert_eq!(inventory.int("a"), Some(-1));
}

#[test]
fn paused_follower_ignores_commands() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "PAUSE");
    feed(&client, "OPEN_MENU");
    feed(&client, "MOVE_0_0_1_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
    assert!(!host.pressed(Control::Forward));

    feed(&client, "TOGGLE_SYNC");
    feed(&client, "OPEN_MENU");
    client.on_tick(&mut host);
    assert_eq!(host.take_events(), vec![HostEvent::OpenScreen(OpenKind::Menu)]);
}

#[test]
fn leader_ignores_relayed_commands() {
    init_test_logging();
    let outbound = RecordingOutbound::connected(Role::Leader);
    let mut client = SyncClient::with_outbound(outbound.clone());
    let mut host = MockHost::in_world();

    feed(&client, "OPEN_MENU");
    feed(&client, "HBAR_5");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
    assert_eq!(host.selected_hotbar(), Some(0));
}

#[test]
fn role_can_change_mid_session() {
    let (mut client, outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "ROLE_LEADER");
    assert!(client.session().is_leader());
    feed(&client, "OPEN_MENU");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
    assert_eq!(outbound.sent_with_prefix("MOVE_").len(), 1);
}

#[test]
fn queued_commands_are_dropped_after_role_change() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "OPEN_MENU");
    feed(&client, "HBAR_5");
    feed(&client, "ROLE_LEADER");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
    assert_eq!(host.selected_hotbar(), Some(0));
}

#[test]
fn queued_commands_are_dropped_after_pause() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "OPEN_INV");
    feed(&client, "PAUSE");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
}

#[test]
fn follower_only_reports_focus() {
    let (mut client, outbound) = follower();
    let mut host = MockHost::in_world();

    feed(&client, "OPEN_INV");
    feed(&client, "UI_CLICK_0_10.5_20_0");
    feed(&client, "MOVE_0_0_1_0_0_0_0_0_0_0");
    client.on_tick(&mut host);
    client.on_tick(&mut host);

    assert_eq!(outbound.sent(), vec!["FOCUS_1"]);
}

#[test]
fn ui_events_are_not_replayed() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::container_screen((40, 20), Some(3)),
        Some(1),
    );

    feed(&client, "UI_CLICK_0_10.5_20_0");
    feed(&client, "UI_KEYDOWN_69_18_0");
    feed(&client, "UI_MOVE_1_2");
    client.on_tick(&mut host);
    assert!(host.events.is_empty());
}

#[test]
fn malformed_lines_change_nothing() {
    let (mut client, _outbound) = follower();
    let mut host = MockHost::in_world();
    host.orientation = (1.0, 2.0);

    feed(&client, "MOVE_1_2_3");
    feed(&client, "HBAR_x");
    feed(&client, "CHAT_SET_!!!");
    feed(&client, "INV_1_2");
    feed(&client, "WHATEVER");
    feed(&client, "");
    client.on_tick(&mut host);

    assert_eq!(host.orientation, (1.0, 2.0));
    assert!(host.events.is_empty());
    assert!(client.session().is_follower());
    assert!(client.session().is_enabled());
}

#[test]
fn chat_widget_field_write_when_no_setter() {
    let (mut client, _outbound) = follower();
    let widget = inputsync_introspect::ClassBuilder::new("ui.q")
        .field("a", inputsync_introspect::TypeRef::Text)
        .field("b", inputsync_introspect::TypeRef::Text)
        .method("c", &[], inputsync_introspect::TypeRef::Text, |slots, _| {
            Ok(slots.get("b").cloned().unwrap_or(Value::Null))
        })
        .build();
    let screen_class = inputsync_introspect::ClassBuilder::new("ui.r")
        .field("w", inputsync_introspect::TypeRef::object("ui.q"))
        .build();
    let screen = inputsync_introspect::DynObject::new(&screen_class).with_child(
        "w",
        inputsync_introspect::DynObject::new(&widget)
            .with("a", Value::Text("x".into()))
            .with("b", Value::Text("typed so far".into())),
    );
    let mut host = MockHost::in_world().with_screen(ScreenKind::Chat, screen, None);

    feed(&client, "CHAT_SET_SGVsbG8=");
    client.on_tick(&mut host);

    let widget = host
        .screen
        .as_ref()
        .and_then(|s| s.object.child("w"))
        .unwrap();
    assert_eq!(widget.text("b"), Some("Hello"));
    assert_eq!(widget.text("a"), Some("x"));
}
