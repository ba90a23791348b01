use inputsync::host::{Host, Key, KeyAction, MouseButton, ScreenKind, SlotRect, MOD_SHIFT};
use inputsync::input::NO_SLOT;
use inputsync::{InputListener, SyncClient};
use inputsync_network::{OpenKind, Role};
use inputsync_test_utils::{fixtures, init_test_logging, HostEvent, MockHost, RecordingOutbound};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

fn leader() -> (SyncClient, Arc<RecordingOutbound>) {
    init_test_logging();
    let outbound = RecordingOutbound::connected(Role::Leader);
    let client = SyncClient::with_outbound(outbound.clone());
    (client, outbound)
}

fn press(client: &mut SyncClient, host: &mut MockHost, key: Key) {
    client.on_key(host, key, 0, KeyAction::Press, 0);
}

fn screen(kind: ScreenKind) -> MockHost {
    let host = MockHost::in_world();
    match kind {
        ScreenKind::Chat => host.with_screen(kind, fixtures::chat_screen("hey"), None),
        ScreenKind::Handled => {
            host.with_screen(kind, fixtures::container_screen((0, 0), None), Some(1))
        }
        ScreenKind::Menu | ScreenKind::Other => host.with_screen(kind, fixtures::menu_screen(), None),
    }
}

#[test_case(None, Key::Escape, Some("OPEN_MENU") ; "escape in world opens menu")]
#[test_case(Some(ScreenKind::Menu), Key::Escape, Some("CLOSE_SCREEN") ; "escape in menu closes")]
#[test_case(None, Key::E, Some("OPEN_INV") ; "e in world opens inventory")]
#[test_case(Some(ScreenKind::Handled), Key::E, Some("CLOSE_SCREEN") ; "e in container closes")]
#[test_case(None, Key::T, Some("OPEN_CHAT") ; "t opens chat")]
#[test_case(None, Key::Slash, Some("OPEN_CMD") ; "slash opens command line")]
#[test_case(Some(ScreenKind::Menu), Key::T, None ; "t inside a screen does nothing")]
#[test_case(Some(ScreenKind::Chat), Key::Enter, Some("CHAT_SEND") ; "enter submits chat")]
#[test_case(Some(ScreenKind::Chat), Key::KeypadEnter, Some("CHAT_SEND") ; "keypad enter submits chat")]
#[test_case(Some(ScreenKind::Chat), Key::Escape, Some("CLOSE_SCREEN") ; "escape leaves chat")]
#[test_case(Some(ScreenKind::Chat), Key::E, None ; "typing e in chat is just text")]
#[test_case(None, Key::Digit(3), Some("HBAR_2") ; "number keys select hotbar")]
#[test_case(None, Key::Digit(9), Some("HBAR_8") ; "nine is the last slot")]
#[test_case(None, Key::Other(65), None ; "other keys are ignored")]
fn key_press_mapping(screen_kind: Option<ScreenKind>, key: Key, expected: Option<&str>) {
    let (mut client, outbound) = leader();
    let mut host = match screen_kind {
        Some(kind) => screen(kind),
        None => MockHost::in_world(),
    };

    press(&mut client, &mut host, key);
    assert_eq!(outbound.sent(), expected.map(str::to_string).into_iter().collect::<Vec<_>>());
}

#[test]
fn key_release_and_repeat_are_ignored() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world();

    client.on_key(&mut host, Key::E, 0, KeyAction::Release, 0);
    client.on_key(&mut host, Key::E, 0, KeyAction::Repeat, 0);
    assert!(outbound.sent().is_empty());
}

#[test]
fn followers_capture_nothing() {
    init_test_logging();
    let outbound = RecordingOutbound::connected(Role::Follower);
    let mut client = SyncClient::with_outbound(outbound.clone());
    let mut host = MockHost::in_world();

    press(&mut client, &mut host, Key::E);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);
    client.on_char(&mut host, 'a' as u32, 0);
    assert!(outbound.sent().is_empty());
}

/// Stands in for the host's own handler, which runs first
struct OpensChatOnT;

impl InputListener for OpensChatOnT {
    fn on_key(&mut self, host: &mut dyn Host, key: Key, _: i32, action: KeyAction, _: i32) {
        if key == Key::T && action == KeyAction::Press {
            let _ = host.open_screen(OpenKind::Chat);
        }
    }
}

#[test]
fn key_mapping_uses_screen_from_before_previous_handler() {
    let (mut client, outbound) = leader();
    client.chain_listener(Box::new(OpensChatOnT));
    let mut host = MockHost::in_world();

    press(&mut client, &mut host, Key::T);
    assert_eq!(host.take_events(), vec![HostEvent::OpenScreen(OpenKind::Chat)]);
    assert_eq!(outbound.sent(), vec!["OPEN_CHAT"]);
}

#[test]
fn container_click_uses_hovered_slot() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::container_screen((100, 50), Some(14)),
        Some(7),
    );

    client.on_mouse_button(&mut host, MouseButton::Right, KeyAction::Press, MOD_SHIFT);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);
    assert_eq!(outbound.sent(), vec!["INV_7_14_1_1", "INV_7_14_0_0"]);
}

#[test]
fn empty_hovered_slot_falls_back_to_hit_test() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::container_screen((100, 50), None),
        Some(4),
    );
    host.slots = vec![SlotRect { id: 5, x: 8, y: 18 }];

    // gui (110, 70) is (10, 20) inside the screen, over slot 5
    client.on_cursor_pos(&mut host, 220.0, 140.0);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);
    // gui (60, 10) misses every slot
    client.on_cursor_pos(&mut host, 120.0, 20.0);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);

    assert_eq!(
        outbound.sent_with_prefix("INV_"),
        vec!["INV_4_5_0_0".to_string(), format!("INV_4_{NO_SLOT}_0_0")]
    );
}

#[test]
fn container_click_falls_back_to_hit_test() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::obfuscated_container_screen((100, 50)),
        Some(4),
    );
    host.gui_scale = 2.0;
    host.slots = vec![
        SlotRect { id: 0, x: 8, y: 84 },
        SlotRect { id: 5, x: 8, y: 18 },
    ];

    // gui (110, 70) is (10, 20) inside the screen
    client.on_cursor_pos(&mut host, 220.0, 140.0);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);
    // gui (60, 10) misses every slot
    client.on_cursor_pos(&mut host, 120.0, 20.0);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Press, 0);

    assert_eq!(
        outbound.sent_with_prefix("INV_"),
        vec!["INV_4_5_0_0".to_string(), format!("INV_4_{NO_SLOT}_0_0")]
    );
}

#[test]
fn release_inside_container_is_a_ui_event() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world().with_screen(
        ScreenKind::Handled,
        fixtures::container_screen((0, 0), Some(1)),
        Some(1),
    );

    client.on_cursor_pos(&mut host, 20.0, 30.0);
    client.on_mouse_button(&mut host, MouseButton::Left, KeyAction::Release, 0);
    assert_eq!(outbound.sent(), vec!["UI_MOVE_10_15", "UI_RELEASE_0_10_15_0"]);
}

#[test]
fn raw_ui_events_outside_containers() {
    let (mut client, outbound) = leader();
    let mut host = MockHost::in_world().with_screen(ScreenKind::Menu, fixtures::menu_screen(), None);

    client.on_cursor_pos(&mut host, 50.0, 30.0);
    client.on_mouse_button(&mut host, MouseButton::Middle, KeyAction::Press, 2);
    client.on_scroll(&mut host, 0.0, -1.0);
    client.on_char(&mut host, 'x' as u32, 0);

    assert_eq!(
        outbound.sent(),
        vec![
            "UI_MOVE_25_15",
            "UI_CLICK_2_25_15_2",
            "UI_SCROLL_25_15_0_-1",
            "UI_CHAR_120_0",
        ]
    );
}
