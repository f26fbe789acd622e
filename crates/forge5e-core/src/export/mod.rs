//! Character and progression exports.

pub mod markdown;

use serde::{Deserialize, Serialize};

use crate::backstory::BackstoryResult;
use crate::character::CharacterDraft;
use crate::progression::ProgressionPlan;

pub use markdown::{character_markdown, progression_markdown};

/// A draft with its optional backstory and progression plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterExport {
    pub draft: CharacterDraft,
    #[serde(default)]
    pub backstory: Option<BackstoryResult>,
    #[serde(default)]
    pub progression: Option<ProgressionPlan>,
}

/// `<race>_<class>_lvl<level>.<ext>` with spaces replaced.
pub fn character_filename(draft: &CharacterDraft, ext: &str) -> String {
    format!("{}_{}_lvl{}.{ext}", draft.race, draft.class, draft.level).replace(' ', "_")
}

/// `<plan name>.<ext>` with spaces replaced.
pub fn progression_filename(plan: &ProgressionPlan, ext: &str) -> String {
    let base = plan.name.as_deref().unwrap_or("progression");
    format!("{}.{ext}", base.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityBlock;

    #[test]
    fn filenames_replace_spaces() {
        let draft = CharacterDraft {
            name: None,
            level: 4,
            class: "Wizard".into(),
            race: "High Elf".into(),
            background: "Sage".into(),
            hit_die: 6,
            proficiency_bonus: 2,
            abilities: AbilityBlock::from_scores([10; 6]),
            speed: 30,
            saving_throws: vec![],
            languages: vec![],
            proficiencies: vec![],
            equipment: vec![],
            armor_class_basic: 10,
            features: vec![],
            spell_slots: None,
        };
        assert_eq!(character_filename(&draft, "md"), "High_Elf_Wizard_lvl4.md");

        let plan = ProgressionPlan {
            name: Some("High Elf Wizard progression".into()),
            class_index: "wizard".into(),
            target_level: 1,
            picks: vec![],
            notes_markdown: String::new(),
        };
        assert_eq!(progression_filename(&plan, "md"), "High_Elf_Wizard_progression.md");

        let unnamed = ProgressionPlan { name: None, ..plan };
        assert_eq!(progression_filename(&unnamed, "md"), "progression.md");
    }
}
