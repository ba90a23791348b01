//! Movement/input snapshot and its `MOVE_` line format

use std::fmt::Write;

pub const MOVE_PREFIX: &str = "MOVE_";

/// Fields after the prefix
const FIELD_COUNT: usize = 10;

pub const HOTBAR_MAX: u8 = 8;

/// One point-in-time capture of the leader's input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub yaw: f32,
    pub pitch: f32,
    /// -1, 0 or 1
    pub forward: f32,
    /// -1, 0 or 1
    pub strafe: f32,
    pub jump: bool,
    pub sneak: bool,
    pub sprint: bool,
    pub attack_held: bool,
    pub use_held: bool,
    /// 0..=8
    pub hotbar: u8,
}

impl Snapshot {
    /// Encode as a single protocol line (without the trailing newline).
    /// Floats always use six decimals and a `.` separator.
    pub fn encode(&self) -> String {
        let mut line = String::with_capacity(64);
        line.push_str(MOVE_PREFIX);
        // Writing to a String cannot fail
        let _ = write!(
            line,
            "{:.6}_{:.6}_{:.6}_{:.6}_{}_{}_{}_{}_{}_{}",
            self.yaw,
            self.pitch,
            self.forward,
            self.strafe,
            flag(self.jump),
            flag(self.sneak),
            flag(self.sprint),
            flag(self.attack_held),
            flag(self.use_held),
            self.hotbar.min(HOTBAR_MAX),
        );
        line
    }

    /// Parse a `MOVE_` line. Any malformed field yields `None`; callers keep
    /// their previous state.
    pub fn decode(line: &str) -> Option<Snapshot> {
        let body = line.strip_prefix(MOVE_PREFIX)?;
        let parts: Vec<&str> = body.split('_').collect();
        if parts.len() != FIELD_COUNT {
            return None;
        }

        let hotbar: i32 = parts[9].trim().parse().ok()?;
        Some(Snapshot {
            yaw: parts[0].trim().parse().ok()?,
            pitch: parts[1].trim().parse().ok()?,
            forward: parts[2].trim().parse().ok()?,
            strafe: parts[3].trim().parse().ok()?,
            jump: parse_flag(parts[4])?,
            sneak: parse_flag(parts[5])?,
            sprint: parse_flag(parts[6])?,
            attack_held: parse_flag(parts[7])?,
            use_held: parse_flag(parts[8])?,
            hotbar: hotbar.clamp(0, HOTBAR_MAX as i32) as u8,
        })
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_fixed_format() {
        let snapshot = Snapshot {
            yaw: 90.0,
            pitch: -12.5,
            forward: 1.0,
            strafe: 0.0,
            sprint: true,
            hotbar: 2,
            ..Default::default()
        };
        assert_eq!(
            snapshot.encode(),
            "MOVE_90.000000_-12.500000_1.000000_0.000000_0_0_1_0_0_2"
        );
    }

    #[test]
    fn decodes_short_float_form() {
        let snapshot = Snapshot::decode("MOVE_90.0_0.0_1.0_0.0_0_0_1_0_0_2").unwrap();
        assert_eq!(snapshot.yaw, 90.0);
        assert_eq!(snapshot.forward, 1.0);
        assert!(snapshot.sprint);
        assert!(!snapshot.sneak);
        assert_eq!(snapshot.hotbar, 2);
    }

    #[test]
    fn out_of_range_hotbar_is_clamped() {
        let high = Snapshot::decode("MOVE_0_0_0_0_0_0_0_0_0_15").unwrap();
        assert_eq!(high.hotbar, 8);
        let low = Snapshot::decode("MOVE_0_0_0_0_0_0_0_0_0_-3").unwrap();
        assert_eq!(low.hotbar, 0);
    }
}
