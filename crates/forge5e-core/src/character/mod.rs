//! Character derivation: inputs, the computed draft, and the deriver.

mod derive;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ability::{Ability, AbilityBlock};

pub use derive::derive_character;

/// Caller input for [`derive_character`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateInput {
    pub class_index: String,
    pub race_index: String,
    pub background_index: String,
    /// Requested level; clamped into `1..=20` during derivation.
    #[serde(default = "default_level")]
    pub level: i64,
    /// Six rolled or chosen scores.
    pub scores: Vec<i32>,
    /// Which ability each entry of `scores` is assigned to.
    pub assignment: Vec<Ability>,
}

fn default_level() -> i64 {
    1
}

/// Where a proficiency came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencySource {
    Class,
    Race,
    Background,
}

impl fmt::Display for ProficiencySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Race => "race",
            Self::Background => "background",
        };
        f.write_str(s)
    }
}

/// A single proficiency granted by a class, race or background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proficiency {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub source: ProficiencySource,
}

/// Fully computed character at a single level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub level: u8,
    #[serde(rename = "cls")]
    pub class: String,
    pub race: String,
    pub background: String,
    pub hit_die: u32,
    pub proficiency_bonus: i32,
    pub abilities: AbilityBlock,
    pub speed: u32,
    pub saving_throws: Vec<String>,
    pub languages: Vec<String>,
    #[serde(default)]
    pub proficiencies: Vec<Proficiency>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub armor_class_basic: i32,
    #[serde(default)]
    pub features: Vec<String>,
    /// Spell level to slot count. Absent for classes without spellcasting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_slots: Option<BTreeMap<u8, u32>>,
}

impl CharacterDraft {
    /// Name for listings: the explicit name, else `"<race> <class> L<level>"`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} {} L{}", self.race, self.class, self.level),
        }
    }
}
