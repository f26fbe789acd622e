//! Portrait prompt construction.

use crate::backstory::BackstoryResult;
use crate::character::CharacterDraft;

/// Backstory prose beyond this many characters is left out of the prompt.
const MAX_BACKSTORY_CHARS: usize = 1200;

/// Build the image prompt for a character portrait.
///
/// A non-blank `custom_prompt` is used verbatim (trimmed).
pub fn portrait_prompt(
    draft: &CharacterDraft,
    backstory: Option<&BackstoryResult>,
    custom_prompt: Option<&str>,
) -> String {
    if let Some(custom) = custom_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        return custom.to_owned();
    }

    let name = draft.name.as_deref().unwrap_or("Unnamed Adventurer");
    let a = &draft.abilities;
    let mut prompt = format!(
        "Create a detailed fantasy portrait of a D&D 5e character.\n\
         Name: {name}. Race: {}. Class: {}. Background: {}. Level: {}.\n\
         Key abilities: STR {}, DEX {}, CON {}, INT {}, WIS {}, CHA {}.\n",
        draft.race,
        draft.class,
        draft.background,
        draft.level,
        a.strength,
        a.dexterity,
        a.constitution,
        a.intelligence,
        a.wisdom,
        a.charisma,
    );
    if let Some(bs) = backstory {
        let excerpt: String = bs.prose_markdown.chars().take(MAX_BACKSTORY_CHARS).collect();
        if !excerpt.trim().is_empty() {
            prompt.push_str("Backstory excerpt: ");
            prompt.push_str(excerpt.trim());
            prompt.push('\n');
        }
    }
    prompt
}

/// Attachment filename for a portrait.
pub fn portrait_filename(draft: &CharacterDraft) -> String {
    let base = match &draft.name {
        Some(name) => name.clone(),
        None => format!("{} {}", draft.race, draft.class),
    };
    format!("{}_portrait.png", base.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityBlock;

    fn draft() -> CharacterDraft {
        CharacterDraft {
            name: None,
            level: 2,
            class: "Paladin".into(),
            race: "Half-Orc".into(),
            background: "Soldier".into(),
            hit_die: 10,
            proficiency_bonus: 2,
            abilities: AbilityBlock::from_scores([16, 10, 14, 8, 12, 15]),
            speed: 30,
            saving_throws: vec![],
            languages: vec![],
            proficiencies: vec![],
            equipment: vec![],
            armor_class_basic: 10,
            features: vec![],
            spell_slots: None,
        }
    }

    #[test]
    fn default_prompt_names_character() {
        let prompt = portrait_prompt(&draft(), None, Some("   "));
        assert!(prompt.contains("Name: Unnamed Adventurer. Race: Half-Orc. Class: Paladin."));
        assert!(prompt.contains("Key abilities: STR 16, DEX 10, CON 14, INT 8, WIS 12, CHA 15."));
        assert!(!prompt.contains("Backstory"));
    }

    #[test]
    fn custom_prompt_wins() {
        let prompt = portrait_prompt(&draft(), None, Some("  a knight at dawn "));
        assert_eq!(prompt, "a knight at dawn");
    }

    #[test]
    fn backstory_excerpt_is_truncated() {
        let bs = BackstoryResult {
            summary: String::new(),
            traits: vec![],
            ideals: vec![],
            bonds: vec![],
            flaws: vec![],
            hooks: vec![],
            prose_markdown: "~".repeat(5000),
        };
        let prompt = portrait_prompt(&draft(), Some(&bs), None);
        let excerpt_len = prompt.matches('~').count();
        assert_eq!(excerpt_len, MAX_BACKSTORY_CHARS);
    }

    #[test]
    fn filename_uses_name_or_race_class() {
        assert_eq!(portrait_filename(&draft()), "Half-Orc_Paladin_portrait.png");
        let mut named = draft();
        named.name = Some("Grum the Bold".into());
        assert_eq!(portrait_filename(&named), "Grum_the_Bold_portrait.png");
    }
}
