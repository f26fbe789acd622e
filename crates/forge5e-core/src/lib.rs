//! Rules engine for the forge5e character creator.
//!
//! Derives character drafts from ability scores and rules documents, plans
//! level-by-level progression, rolls ability scores, builds prompts for the
//! narrative and portrait generators, and renders exports.

pub mod ability;
pub mod backstory;
pub mod character;
pub mod error;
pub mod export;
pub mod generation;
pub mod math;
pub mod portrait;
pub mod progression;
pub mod roll;
pub mod rules;

pub use ability::{Ability, AbilityBlock};
pub use character::{CharacterDraft, GenerateInput, Proficiency, ProficiencySource, derive_character};
pub use error::ForgeError;
pub use progression::{LevelPick, ProgressionInput, ProgressionPlan, plan_progression};
pub use rules::{Document, LookupError, RulesKey, RulesProvider};
