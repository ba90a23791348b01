use inputsync_network::{Message, OpenKind, Role, UiEvent};
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test_case("ROLE_LEADER", Message::Role(Role::Leader) ; "leader")]
#[test_case("ROLE_FOLLOWER", Message::Role(Role::Follower) ; "follower")]
#[test_case("PAUSE", Message::Pause ; "pause")]
#[test_case("RESUME", Message::Resume ; "resume")]
#[test_case("TOGGLE_SYNC", Message::ToggleSync ; "toggle")]
#[test_case("CLOSE_SCREEN", Message::CloseScreen ; "close")]
#[test_case("OPEN_INV", Message::OpenScreen(OpenKind::Inventory) ; "open inventory")]
#[test_case("OPEN_CHAT", Message::OpenScreen(OpenKind::Chat) ; "open chat")]
#[test_case("OPEN_CMD", Message::OpenScreen(OpenKind::Command) ; "open command")]
#[test_case("OPEN_MENU", Message::OpenScreen(OpenKind::Menu) ; "open menu")]
#[test_case("HBAR_4", Message::HotbarSelect(4) ; "hotbar")]
#[test_case("HBAR_12", Message::HotbarSelect(12) ; "hotbar is clamped later, not here")]
#[test_case("INV_3_36_1_1", Message::InventoryClick { sync_id: 3, slot_id: 36, button: 1, action: 1 } ; "slot click")]
#[test_case("INV_0_-999_0_0", Message::InventoryClick { sync_id: 0, slot_id: -999, button: 0, action: 0 } ; "outside click")]
#[test_case("CHAT_SET_SGVsbG8=", Message::ChatSetBuffer("Hello".to_string()) ; "chat buffer")]
#[test_case("CHAT_SET_", Message::ChatSetBuffer(String::new()) ; "empty chat buffer")]
#[test_case("CHAT_SEND", Message::ChatSend ; "chat send")]
#[test_case("FOCUS_1", Message::Focus(true) ; "focus gained")]
#[test_case("UI_MOVE_12.5_40", Message::UiDebug(UiEvent::Move { x: 12.5, y: 40.0 }) ; "ui move")]
#[test_case("UI_CLICK_0_1.0_2.0_1", Message::UiDebug(UiEvent::Click { button: 0, x: 1.0, y: 2.0, mods: 1 }) ; "ui click")]
#[test_case("UI_SCROLL_1_2_0.0_-1.0", Message::UiDebug(UiEvent::Scroll { x: 1.0, y: 2.0, dx: 0.0, dy: -1.0 }) ; "ui scroll")]
#[test_case("UI_CHAR_97_0", Message::UiDebug(UiEvent::Char { codepoint: 97, mods: 0 }) ; "ui char")]
#[test_case("UI_CLICK_x", Message::UiDebug(UiEvent::Unknown("UI_CLICK_x".to_string())) ; "malformed ui is kept")]
#[test_case("  PAUSE \r", Message::Pause ; "whitespace trimmed")]
fn parses(line: &str, expected: Message) {
    assert_eq!(Message::parse(line).unwrap(), expected);
}

#[test_case("" ; "empty")]
#[test_case("HELLO" ; "unknown")]
#[test_case("HBAR_x" ; "non numeric hotbar")]
#[test_case("INV_1_2_3" ; "short slot click")]
#[test_case("INV_1_2_3_4_5" ; "long slot click")]
#[test_case("CHAT_SET_***" ; "bad base64")]
#[test_case("MOVE_1_2" ; "short snapshot")]
#[test_case("role_leader" ; "case sensitive")]
fn rejects(line: &str) {
    assert!(Message::parse(line).is_err());
}

#[test]
fn encode_is_accepted_by_parse() {
    let messages = [
        Message::Role(Role::Leader),
        Message::OpenScreen(OpenKind::Command),
        Message::HotbarSelect(8),
        Message::InventoryClick {
            sync_id: 2,
            slot_id: 5,
            button: 0,
            action: 1,
        },
        Message::ChatSetBuffer("/tp @s ~ ~1 ~".to_string()),
        Message::Focus(false),
        Message::UiDebug(UiEvent::Release {
            button: 1,
            x: 3.5,
            y: 4.0,
            mods: 0,
        }),
    ];
    for message in messages {
        assert_eq!(Message::parse(&message.encode()).unwrap(), message);
    }
}
