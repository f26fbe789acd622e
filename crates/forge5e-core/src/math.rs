//! Derivation math: ability modifiers and the proficiency table.

/// Lowest character level.
pub const MIN_LEVEL: u8 = 1;

/// Highest character level.
pub const MAX_LEVEL: u8 = 20;

/// Ability modifier for a score: `floor((score - 10) / 2)`.
///
/// Rounds toward negative infinity, so a score of 9 yields -1. Total over
/// every `i32`.
pub fn modifier(score: i32) -> i32 {
    score.div_euclid(2) - 5
}

/// Proficiency bonus for a character level.
///
/// The level is expected to be in `1..=20` already (see [`clamp_level`]);
/// the table is not clamped here.
pub fn proficiency_bonus(level: u8) -> i32 {
    match level {
        ..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        _ => 6,
    }
}

/// Clamp an arbitrary requested level into `1..=20`.
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(i64::from(MIN_LEVEL), i64::from(MAX_LEVEL)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_reference_values() {
        assert_eq!(modifier(10), 0);
        assert_eq!(modifier(11), 0);
        assert_eq!(modifier(9), -1);
        assert_eq!(modifier(8), -1);
        assert_eq!(modifier(20), 5);
        assert_eq!(modifier(1), -5);
        assert_eq!(modifier(30), 10);
    }

    #[test]
    fn modifier_floors_out_of_range_scores() {
        assert_eq!(modifier(0), -5);
        assert_eq!(modifier(-1), -6);
        assert_eq!(modifier(31), 10);
        assert_eq!(modifier(i32::MIN), i32::MIN / 2 - 5);
        assert_eq!(modifier(i32::MAX), i32::MAX / 2 - 5);
        assert_eq!(modifier(i32::MAX - 1), i32::MAX / 2 - 5);
    }

    #[test]
    fn modifier_matches_float_floor() {
        for s in -40..=60 {
            let expected = ((f64::from(s) - 10.0) / 2.0).floor() as i32;
            assert_eq!(modifier(s), expected, "score {s}");
        }
    }

    #[test]
    fn proficiency_bonus_steps() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(13), 5);
        assert_eq!(proficiency_bonus(17), 6);
        assert_eq!(proficiency_bonus(20), 6);
    }

    #[test]
    fn proficiency_bonus_is_monotonic() {
        for level in MIN_LEVEL..MAX_LEVEL {
            assert!(proficiency_bonus(level) <= proficiency_bonus(level + 1));
        }
    }

    #[test]
    fn clamp_level_bounds() {
        assert_eq!(clamp_level(-3), 1);
        assert_eq!(clamp_level(0), 1);
        assert_eq!(clamp_level(7), 7);
        assert_eq!(clamp_level(20), 20);
        assert_eq!(clamp_level(99), 20);
    }
}
