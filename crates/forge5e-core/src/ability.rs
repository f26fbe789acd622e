//! The six abilities and the computed ability block.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::modifier;

// ---------------------------------------------------------------------------
// Ability
// ---------------------------------------------------------------------------

/// One of the six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "STR")]
    Strength,
    #[serde(rename = "DEX")]
    Dexterity,
    #[serde(rename = "CON")]
    Constitution,
    #[serde(rename = "INT")]
    Intelligence,
    #[serde(rename = "WIS")]
    Wisdom,
    #[serde(rename = "CHA")]
    Charisma,
}

impl Ability {
    /// All abilities in canonical order.
    pub const ALL: [Ability; 6] = [
        Self::Strength,
        Self::Dexterity,
        Self::Constitution,
        Self::Intelligence,
        Self::Wisdom,
        Self::Charisma,
    ];

    /// Three-letter abbreviation (e.g. `STR`).
    pub fn abbrev(self) -> &'static str {
        match self {
            Self::Strength => "STR",
            Self::Dexterity => "DEX",
            Self::Constitution => "CON",
            Self::Intelligence => "INT",
            Self::Wisdom => "WIS",
            Self::Charisma => "CHA",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl FromStr for Ability {
    type Err = AbilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STR" => Ok(Self::Strength),
            "DEX" => Ok(Self::Dexterity),
            "CON" => Ok(Self::Constitution),
            "INT" => Ok(Self::Intelligence),
            "WIS" => Ok(Self::Wisdom),
            "CHA" => Ok(Self::Charisma),
            _ => Err(AbilityParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Ability`] abbreviation.
#[derive(Debug, Clone)]
pub struct AbilityParseError(pub String);

impl fmt::Display for AbilityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid ability: {:?} (expected STR, DEX, CON, INT, WIS, or CHA)",
            self.0
        )
    }
}

impl std::error::Error for AbilityParseError {}

// ---------------------------------------------------------------------------
// AbilityBlock
// ---------------------------------------------------------------------------

/// Six ability scores together with their derived modifiers.
///
/// Serialized flat: `STR`..`CHA` for scores, `STR_mod`..`CHA_mod` for
/// modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBlock {
    #[serde(rename = "STR")]
    pub strength: i32,
    #[serde(rename = "DEX")]
    pub dexterity: i32,
    #[serde(rename = "CON")]
    pub constitution: i32,
    #[serde(rename = "INT")]
    pub intelligence: i32,
    #[serde(rename = "WIS")]
    pub wisdom: i32,
    #[serde(rename = "CHA")]
    pub charisma: i32,
    #[serde(rename = "STR_mod")]
    pub strength_mod: i32,
    #[serde(rename = "DEX_mod")]
    pub dexterity_mod: i32,
    #[serde(rename = "CON_mod")]
    pub constitution_mod: i32,
    #[serde(rename = "INT_mod")]
    pub intelligence_mod: i32,
    #[serde(rename = "WIS_mod")]
    pub wisdom_mod: i32,
    #[serde(rename = "CHA_mod")]
    pub charisma_mod: i32,
}

impl AbilityBlock {
    /// Build a block from scores in canonical order (STR, DEX, CON, INT,
    /// WIS, CHA), computing every modifier.
    pub fn from_scores(scores: [i32; 6]) -> Self {
        let [strength, dexterity, constitution, intelligence, wisdom, charisma] = scores;
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
            strength_mod: modifier(strength),
            dexterity_mod: modifier(dexterity),
            constitution_mod: modifier(constitution),
            intelligence_mod: modifier(intelligence),
            wisdom_mod: modifier(wisdom),
            charisma_mod: modifier(charisma),
        }
    }

    /// Scores in canonical order.
    pub fn scores(&self) -> [i32; 6] {
        [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ]
    }

    /// Modifiers in canonical order.
    pub fn modifiers(&self) -> [i32; 6] {
        [
            self.strength_mod,
            self.dexterity_mod,
            self.constitution_mod,
            self.intelligence_mod,
            self.wisdom_mod,
            self.charisma_mod,
        ]
    }

    pub fn score(&self, ability: Ability) -> i32 {
        self.scores()[ability.index()]
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        self.modifiers()[ability.index()]
    }
}
