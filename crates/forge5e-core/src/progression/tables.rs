//! Per-class unlock tables for the 2014 SRD core classes.

/// Subclass unlock level used for classes missing from the table.
pub const DEFAULT_SUBCLASS_LEVEL: u8 = 3;

/// ASI schedule shared by every class without an override.
pub const DEFAULT_ASI_LEVELS: &[u8] = &[4, 8, 12, 16, 19];

const FIGHTER_ASI_LEVELS: &[u8] = &[4, 6, 8, 12, 14, 16, 19];
const ROGUE_ASI_LEVELS: &[u8] = &[4, 8, 10, 12, 16, 19];

/// Level at which `class_index` picks its subclass.
pub fn subclass_level(class_index: &str) -> u8 {
    match class_index {
        "cleric" | "sorcerer" | "warlock" => 1,
        "druid" | "wizard" => 2,
        "barbarian" | "bard" | "fighter" | "monk" | "paladin" | "ranger" | "rogue" => 3,
        _ => DEFAULT_SUBCLASS_LEVEL,
    }
}

/// Levels at which `class_index` gains an ability score improvement.
pub fn asi_levels(class_index: &str) -> &'static [u8] {
    match class_index {
        "fighter" => FIGHTER_ASI_LEVELS,
        "rogue" => ROGUE_ASI_LEVELS,
        _ => DEFAULT_ASI_LEVELS,
    }
}
