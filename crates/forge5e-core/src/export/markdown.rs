//! Markdown rendering for character sheets and progression plans.

use crate::ability::Ability;
use crate::backstory::BackstoryResult;
use crate::character::CharacterDraft;
use crate::progression::ProgressionPlan;

/// Render a character sheet, with backstory and progression sections when
/// present.
pub fn character_markdown(
    draft: &CharacterDraft,
    backstory: Option<&BackstoryResult>,
    progression: Option<&ProgressionPlan>,
) -> String {
    let mut lines = vec![
        format!("# {} {} — Level {}", draft.race, draft.class, draft.level),
        String::new(),
        format!("- **Background:** {}", draft.background),
        format!("- **Proficiency Bonus:** +{}", draft.proficiency_bonus),
        format!("- **Hit Die:** d{}", draft.hit_die),
        format!("- **Speed:** {} ft", draft.speed),
        format!("- **AC (no armor):** {}", draft.armor_class_basic),
    ];

    let abilities = Ability::ALL
        .iter()
        .map(|&a| {
            format!(
                "{a} {} ({:+})",
                draft.abilities.score(a),
                draft.abilities.modifier(a)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("- **Abilities:** {abilities}"));

    push_list(&mut lines, "Saving Throws", &draft.saving_throws);
    push_list(&mut lines, "Languages", &draft.languages);
    let proficiencies: Vec<String> = draft.proficiencies.iter().map(|p| p.name.clone()).collect();
    push_list(&mut lines, "Proficiencies", &proficiencies);
    push_list(&mut lines, "Equipment", &draft.equipment);
    push_list(&mut lines, "Features", &draft.features);
    if let Some(slots) = draft.spell_slots.as_ref().filter(|s| !s.is_empty()) {
        let rendered = slots
            .iter()
            .map(|(level, count)| format!("L{level}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("- **Spell Slots:** {rendered}"));
    }
    lines.push(String::new());

    if let Some(bs) = backstory {
        lines.push("## Backstory".to_owned());
        lines.push(String::new());
        lines.push(bs.prose_markdown.trim().to_owned());
        lines.push(String::new());
        lines.push("### Traits / Ideals / Bonds / Flaws".to_owned());
        lines.push(format!("- **Traits:** {}", join_or_dash(&bs.traits)));
        lines.push(format!("- **Ideals:** {}", join_or_dash(&bs.ideals)));
        lines.push(format!("- **Bonds:** {}", join_or_dash(&bs.bonds)));
        lines.push(format!("- **Flaws:** {}", join_or_dash(&bs.flaws)));
        if !bs.hooks.is_empty() {
            lines.push(format!("- **Hooks:** {}", bs.hooks.join(", ")));
        }
    }

    let mut out = lines.join("\n");
    if let Some(plan) = progression {
        let mut section = vec![
            String::new(),
            "## Progression Plan".to_owned(),
            String::new(),
            format!("- Title: {}", plan.display_name()),
            format!("- Class: {}", draft.class),
            format!("- Target Level: {}", plan.target_level),
            String::new(),
        ];
        push_levels(&mut section, plan, 3);
        out.push_str("\n\n");
        out.push_str(&section.join("\n"));
    }
    out
}

/// Render a standalone progression plan.
///
/// With a draft, the class name and ancestry/background come from it;
/// otherwise the class index is title-cased.
pub fn progression_markdown(plan: &ProgressionPlan, draft: Option<&CharacterDraft>) -> String {
    let title = plan
        .name
        .as_deref()
        .or_else(|| draft.and_then(|d| d.name.as_deref()))
        .unwrap_or("Progression Plan");
    let class_name = match draft {
        Some(d) => d.class.clone(),
        None => title_case(&plan.class_index),
    };

    let mut lines = vec![format!("# {title}"), String::new(), format!("- Class: {class_name}")];
    if let Some(d) = draft {
        lines.push(format!("- Ancestry/Background: {} · {}", d.race, d.background));
    }
    lines.push(format!("- Target Level: {}", plan.target_level));
    lines.push(String::new());
    push_levels(&mut lines, plan, 2);
    lines.join("\n")
}

/// Append the level-by-level section. `depth` is the heading depth of the
/// "Level-by-Level" heading; each level sits one deeper.
fn push_levels(lines: &mut Vec<String>, plan: &ProgressionPlan, depth: usize) {
    let section = "#".repeat(depth);
    let level_heading = "#".repeat(depth + 1);

    lines.push(format!("{section} Level-by-Level"));
    for pick in &plan.picks {
        let mut header = format!("{level_heading} Level {}", pick.level);
        if let Some(subclass) = &pick.subclass {
            header.push_str(&format!(" — Subclass: {subclass}"));
        }
        lines.push(header);
        lines.push(format!("- Features: {}", join_or_dash(&pick.features)));
        if let Some(asi) = &pick.asi {
            lines.push(format!("- ASI/Feat: {asi}"));
        }
        if !pick.spells_known.is_empty() {
            lines.push(format!("- Spells Known: {}", pick.spells_known.join(", ")));
        }
        if !pick.prepared.is_empty() {
            lines.push(format!("- Prepared: {}", pick.prepared.join(", ")));
        }
        lines.push(format!("- HP Gain: {}", pick.hp_gain));
        if let Some(notes) = &pick.notes {
            lines.push(String::new());
            lines.push(notes.clone());
        }
        lines.push(String::new());
    }
    if !plan.notes_markdown.is_empty() {
        lines.push(format!("{section} Notes"));
        lines.push(plan.notes_markdown.clone());
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, items: &[String]) {
    if !items.is_empty() {
        lines.push(format!("- **{label}:** {}", items.join(", ")));
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "—".to_owned()
    } else {
        items.join(", ")
    }
}

fn title_case(s: &str) -> String {
    s.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ability::AbilityBlock;
    use crate::character::{Proficiency, ProficiencySource};
    use crate::progression::LevelPick;

    fn draft() -> CharacterDraft {
        CharacterDraft {
            name: None,
            level: 2,
            class: "Wizard".into(),
            race: "Elf".into(),
            background: "Sage".into(),
            hit_die: 6,
            proficiency_bonus: 2,
            abilities: AbilityBlock::from_scores([8, 14, 13, 15, 12, 10]),
            speed: 30,
            saving_throws: vec!["INT".into(), "WIS".into()],
            languages: vec!["Common".into(), "Elvish".into()],
            proficiencies: vec![Proficiency {
                kind: "proficiency".into(),
                name: "Daggers".into(),
                source: ProficiencySource::Class,
            }],
            equipment: vec![],
            armor_class_basic: 12,
            features: vec![],
            spell_slots: Some(BTreeMap::from([(1, 3)])),
        }
    }

    fn plan() -> ProgressionPlan {
        ProgressionPlan {
            name: Some("Elf Wizard progression".into()),
            class_index: "wizard".into(),
            target_level: 2,
            picks: vec![
                LevelPick {
                    level: 1,
                    hp_gain: 7,
                    features: vec!["Arcane Recovery".into()],
                    subclass: None,
                    asi: None,
                    spells_known: vec![],
                    prepared: vec![],
                    notes: None,
                },
                LevelPick {
                    level: 2,
                    hp_gain: 5,
                    features: vec![],
                    subclass: Some("Evocation".into()),
                    asi: None,
                    spells_known: vec!["Shield".into()],
                    prepared: vec![],
                    notes: Some("Chose subclass: Evocation.".into()),
                },
            ],
            notes_markdown: "Adjust as needed.".into(),
        }
    }

    #[test]
    fn character_sheet_basics() {
        let md = character_markdown(&draft(), None, None);
        assert!(md.starts_with("# Elf Wizard — Level 2\n"));
        assert!(md.contains("- **Proficiency Bonus:** +2"));
        assert!(md.contains("- **Hit Die:** d6"));
        assert!(md.contains("STR 8 (-1), DEX 14 (+2)"));
        assert!(md.contains("- **Languages:** Common, Elvish"));
        assert!(md.contains("- **Proficiencies:** Daggers"));
        assert!(md.contains("- **Spell Slots:** L1: 3"));
        assert!(!md.contains("Equipment"));
        assert!(!md.contains("## Backstory"));
    }

    #[test]
    fn character_sheet_with_backstory_and_plan() {
        let bs = BackstoryResult {
            summary: "s".into(),
            traits: vec!["Curious".into()],
            ideals: vec![],
            bonds: vec![],
            flaws: vec![],
            hooks: vec![],
            prose_markdown: "  Raised among books.  ".into(),
        };
        let md = character_markdown(&draft(), Some(&bs), Some(&plan()));
        assert!(md.contains("## Backstory\n\nRaised among books.\n"));
        assert!(md.contains("- **Traits:** Curious"));
        assert!(md.contains("- **Ideals:** —"));
        assert!(!md.contains("Hooks"));
        assert!(md.contains("## Progression Plan"));
        assert!(md.contains("#### Level 2 — Subclass: Evocation"));
        assert!(md.contains("### Notes\nAdjust as needed."));
    }

    #[test]
    fn progression_without_draft() {
        let md = progression_markdown(&plan(), None);
        assert!(md.starts_with("# Elf Wizard progression\n"));
        assert!(md.contains("- Class: Wizard"));
        assert!(!md.contains("Ancestry"));
        assert!(md.contains("### Level 1\n- Features: Arcane Recovery\n- HP Gain: 7"));
        assert!(md.contains("- Features: —"));
        assert!(md.contains("- Spells Known: Shield"));
        assert!(md.contains("\nChose subclass: Evocation.\n"));
        assert!(md.ends_with("## Notes\nAdjust as needed."));
    }

    #[test]
    fn progression_with_draft() {
        let md = progression_markdown(&plan(), Some(&draft()));
        assert!(md.contains("- Ancestry/Background: Elf · Sage"));
    }

    #[test]
    fn title_case_class_index() {
        assert_eq!(title_case("wizard"), "Wizard");
        assert_eq!(title_case("eldritch-knight"), "Eldritch Knight");
    }
}
