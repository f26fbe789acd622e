//! Level-by-level progression planning.

mod planner;
pub mod tables;

use serde::{Deserialize, Serialize};

use crate::character::CharacterDraft;

pub use planner::{ASI_PLACEHOLDER, SKELETON_NOTES, plan_progression};

/// Caller input for [`plan_progression`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionInput {
    /// Rules index of the class, e.g. `"wizard"`.
    pub class_index: String,
    /// Requested final level; clamped into `1..=20`.
    #[serde(default = "default_target")]
    pub target_level: i64,
    pub draft: CharacterDraft,
}

fn default_target() -> i64 {
    1
}

/// What a character gains at a single level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPick {
    pub level: u8,
    pub hp_gain: i32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asi: Option<String>,
    #[serde(default)]
    pub spells_known: Vec<String>,
    #[serde(default)]
    pub prepared: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A level-by-level plan from level 1 to the target level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub class_index: String,
    pub target_level: u8,
    /// One pick per level, ascending and contiguous from 1.
    pub picks: Vec<LevelPick>,
    #[serde(default)]
    pub notes_markdown: String,
}

impl ProgressionPlan {
    /// Name for listings and filenames.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Progression Plan",
        }
    }
}
