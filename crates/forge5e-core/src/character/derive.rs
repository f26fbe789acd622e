//! The character deriver.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;
use tracing::{debug, warn};

use crate::ability::{Ability, AbilityBlock};
use crate::error::ForgeError;
use crate::math::{clamp_level, modifier, proficiency_bonus};
use crate::rules::{Document, RulesKey, RulesProvider};

use super::{CharacterDraft, GenerateInput, Proficiency, ProficiencySource};

const DEFAULT_HIT_DIE: u32 = 8;
const DEFAULT_SPEED: u32 = 30;
const SPELL_SLOT_PREFIX: &str = "spell_slots_level_";

/// Derive a [`CharacterDraft`] from caller input and rules documents.
///
/// Input is validated before any lookup. The class, race, background and
/// class-level lookups are required; the class starting-equipment lookup is
/// best-effort and a failure leaves only background equipment.
pub async fn derive_character(
    rules: &dyn RulesProvider,
    input: &GenerateInput,
) -> Result<CharacterDraft, ForgeError> {
    let abilities = assign_scores(&input.scores, &input.assignment)?;
    let level = clamp_level(input.level);

    debug!(
        class = %input.class_index,
        race = %input.race_index,
        background = %input.background_index,
        level,
        "deriving character"
    );

    let class_key = RulesKey::Class(input.class_index.clone());
    let race_key = RulesKey::Race(input.race_index.clone());
    let background_key = RulesKey::Background(input.background_index.clone());
    let level_key = RulesKey::ClassLevel {
        class: input.class_index.clone(),
        level,
    };
    let equipment_key = RulesKey::StartingEquipment(input.class_index.clone());

    let (class, race, background, level_doc, class_equipment) = futures::join!(
        rules.get(&class_key),
        rules.get(&race_key),
        rules.get(&background_key),
        rules.get(&level_key),
        rules.get(&equipment_key),
    );
    let class = class?;
    let race = race?;
    let background = background?;
    let level_doc = level_doc?;

    let mut equipment = Vec::new();
    match class_equipment {
        Ok(doc) => equipment.extend(format_equipment(doc.list("starting_equipment"))),
        Err(e) => warn!(error = %e, "class starting equipment unavailable, using background only"),
    }
    equipment.extend(format_equipment(background.list("starting_equipment")));

    let languages: BTreeSet<String> = race
        .names("languages")
        .into_iter()
        .chain(background.names("languages"))
        .collect();

    let mut proficiencies = Vec::new();
    for (doc, field, source) in [
        (&class, "proficiencies", ProficiencySource::Class),
        (&race, "starting_proficiencies", ProficiencySource::Race),
        (&background, "starting_proficiencies", ProficiencySource::Background),
    ] {
        proficiencies.extend(doc.names(field).into_iter().map(|name| Proficiency {
            kind: "proficiency".to_owned(),
            name,
            source,
        }));
    }

    let hit_die = class
        .int_field("hit_die")
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_HIT_DIE);
    let speed = race
        .int_field("speed")
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(DEFAULT_SPEED);

    Ok(CharacterDraft {
        name: None,
        level,
        class: doc_name(&class, &input.class_index),
        race: doc_name(&race, &input.race_index),
        background: doc_name(&background, &input.background_index),
        hit_die,
        proficiency_bonus: proficiency_bonus(level),
        abilities,
        speed,
        saving_throws: class.names("saving_throws"),
        languages: languages.into_iter().collect(),
        proficiencies,
        equipment,
        armor_class_basic: 10 + modifier(abilities.dexterity),
        features: level_doc.names("features"),
        spell_slots: level_doc.get("spellcasting").and_then(spell_slots),
    })
}

/// Map scores onto abilities pairwise.
///
/// A repeated ability silently replaces the earlier score, which leaves
/// another ability unassigned and is then reported as missing.
fn assign_scores(scores: &[i32], assignment: &[Ability]) -> Result<AbilityBlock, ForgeError> {
    if scores.len() != 6 || assignment.len() != 6 {
        return Err(ForgeError::validation(format!(
            "scores and assignment must each have length 6 (got {} scores, {} assignments)",
            scores.len(),
            assignment.len()
        )));
    }

    let mut by_ability: HashMap<Ability, i32> = HashMap::with_capacity(6);
    for (&score, &ability) in scores.iter().zip(assignment) {
        by_ability.insert(ability, score);
    }

    let mut ordered = [0; 6];
    for (slot, ability) in ordered.iter_mut().zip(Ability::ALL) {
        *slot = *by_ability.get(&ability).ok_or_else(|| {
            ForgeError::validation(format!("missing ability in assignment: {ability}"))
        })?;
    }
    Ok(AbilityBlock::from_scores(ordered))
}

fn doc_name(doc: &Document, fallback: &str) -> String {
    doc.str_field("name").unwrap_or(fallback).to_owned()
}

/// Format starting-equipment entries as `"<quantity>x <name>"`.
fn format_equipment(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("equipment")?.get("name")?.as_str()?;
            let quantity = match entry.get("quantity") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => "1".to_owned(),
            };
            Some(format!("{quantity}x {name}"))
        })
        .collect()
}

/// Extract `spell_slots_level_<N>` entries from a spellcasting section.
///
/// An empty section counts as no spellcasting. Null counts read as zero and
/// numeric strings are accepted; other values and non-numeric levels are
/// skipped.
fn spell_slots(section: &Value) -> Option<BTreeMap<u8, u32>> {
    let map = section.as_object().filter(|m| !m.is_empty())?;
    let slots = map
        .iter()
        .filter_map(|(key, value)| {
            let level = key.strip_prefix(SPELL_SLOT_PREFIX)?.parse::<u8>().ok()?;
            let count = match value {
                Value::Null => 0,
                Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            Some((level, count))
        })
        .collect();
    Some(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{LookupError, StaticRulesProvider};
    use serde_json::json;

    const SAMPLE: &str = include_str!("../../tests/fixtures/srd_sample.json");

    fn sample_rules() -> StaticRulesProvider {
        StaticRulesProvider::from_json(serde_json::from_str(SAMPLE).unwrap()).unwrap()
    }

    fn abilities(list: [&str; 6]) -> Vec<Ability> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn wizard_input() -> GenerateInput {
        GenerateInput {
            class_index: "wizard".into(),
            race_index: "elf".into(),
            background_index: "sage".into(),
            level: 5,
            scores: vec![15, 14, 13, 12, 10, 8],
            assignment: abilities(["INT", "DEX", "CON", "WIS", "STR", "CHA"]),
        }
    }

    #[tokio::test]
    async fn wizard_elf_sage_level_five() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();

        assert_eq!(draft.level, 5);
        assert_eq!(draft.class, "Wizard");
        assert_eq!(draft.race, "Elf");
        assert_eq!(draft.background, "Sage");
        assert_eq!(draft.hit_die, 6);
        assert_eq!(draft.abilities.intelligence, 15);
        assert_eq!(draft.abilities.intelligence_mod, 2);
        assert_eq!(draft.proficiency_bonus, 3);
        assert_eq!(draft.armor_class_basic, 12);
        assert_eq!(draft.speed, 30);
        assert_eq!(draft.saving_throws, vec!["INT", "WIS"]);
    }

    #[tokio::test]
    async fn every_ability_mapped_once_with_modifier() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();
        let input = wizard_input();
        for (score, ability) in input.scores.iter().zip(&input.assignment) {
            assert_eq!(draft.abilities.score(*ability), *score);
            assert_eq!(draft.abilities.modifier(*ability), modifier(*score));
        }
    }

    #[tokio::test]
    async fn armor_class_tracks_dexterity() {
        let rules = sample_rules();
        for dex in 1..=30 {
            let mut input = wizard_input();
            // The second slot is assigned to DEX.
            input.scores[1] = dex;
            let draft = derive_character(&rules, &input).await.unwrap();
            assert_eq!(draft.abilities.dexterity, dex);
            assert_eq!(draft.armor_class_basic, 10 + modifier(dex), "dex {dex}");
        }
        assert_eq!(10 + modifier(1), 5);
        assert_eq!(10 + modifier(9), 9);
    }

    #[tokio::test]
    async fn languages_sorted_and_deduplicated() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();
        // Elf grants Common and Elvish; Sage grants Elvish and Draconic.
        assert_eq!(draft.languages, vec!["Common", "Draconic", "Elvish"]);
    }

    #[tokio::test]
    async fn proficiencies_ordered_by_source() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();
        let sources: Vec<ProficiencySource> =
            draft.proficiencies.iter().map(|p| p.source).collect();
        let first_race = sources
            .iter()
            .position(|s| *s == ProficiencySource::Race)
            .unwrap();
        let first_background = sources
            .iter()
            .position(|s| *s == ProficiencySource::Background)
            .unwrap();
        assert!(sources[..first_race].iter().all(|s| *s == ProficiencySource::Class));
        assert!(first_race < first_background);
        assert!(draft.proficiencies.iter().all(|p| p.kind == "proficiency"));
    }

    #[tokio::test]
    async fn equipment_class_then_background() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();
        assert_eq!(
            draft.equipment,
            vec!["1x Spellbook", "1x Bottle of black ink", "1x Common clothes"]
        );
    }

    #[tokio::test]
    async fn missing_class_equipment_degrades_to_background() {
        let mut rules = sample_rules();
        let mut input = wizard_input();
        input.class_index = "sorcerer".into();
        rules.insert(
            &RulesKey::Class("sorcerer".into()),
            json!({"name": "Sorcerer", "hit_die": 6}),
        );
        rules.insert(
            &RulesKey::ClassLevel {
                class: "sorcerer".into(),
                level: 5,
            },
            json!({"features": []}),
        );

        let draft = derive_character(&rules, &input).await.unwrap();
        assert_eq!(draft.equipment, vec!["1x Bottle of black ink", "1x Common clothes"]);
        assert!(draft.saving_throws.is_empty());
    }

    #[tokio::test]
    async fn spell_slots_extracted_for_casters() {
        let draft = derive_character(&sample_rules(), &wizard_input()).await.unwrap();
        let slots = draft.spell_slots.expect("wizard has spellcasting");
        assert_eq!(slots.get(&1), Some(&4));
        assert_eq!(slots.get(&3), Some(&2));
        assert_eq!(slots.get(&4), Some(&0));
        assert_eq!(draft.features, vec!["Arcane Tradition feature"]);
    }

    #[tokio::test]
    async fn spell_slots_absent_without_spellcasting() {
        let mut input = wizard_input();
        input.class_index = "fighter".into();
        input.level = 3;
        let draft = derive_character(&sample_rules(), &input).await.unwrap();
        assert!(draft.spell_slots.is_none());
        assert_eq!(draft.hit_die, 10);
    }

    #[tokio::test]
    async fn level_is_clamped() {
        let mut input = wizard_input();
        input.class_index = "fighter".into();
        input.level = 0;
        let draft = derive_character(&sample_rules(), &input).await.unwrap();
        assert_eq!(draft.level, 1);
        assert_eq!(draft.proficiency_bonus, 2);
    }

    #[tokio::test]
    async fn five_scores_is_validation_error() {
        let mut input = wizard_input();
        input.scores.pop();
        let err = derive_character(&sample_rules(), &input).await.unwrap_err();
        assert!(matches!(err, ForgeError::Validation(ref m) if m.contains("length 6")));
    }

    #[tokio::test]
    async fn duplicate_assignment_reports_missing_ability() {
        let mut input = wizard_input();
        input.assignment = abilities(["INT", "DEX", "INT", "WIS", "STR", "CHA"]);
        let err = derive_character(&sample_rules(), &input).await.unwrap_err();
        assert_eq!(err.to_string(), "missing ability in assignment: CON");
    }

    #[tokio::test]
    async fn missing_race_is_lookup_error() {
        let mut input = wizard_input();
        input.race_index = "tabaxi".into();
        let err = derive_character(&sample_rules(), &input).await.unwrap_err();
        match err {
            ForgeError::Lookup(LookupError::NotFound(key)) => {
                assert_eq!(key, RulesKey::Race("tabaxi".into()));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn class_failure_reported_before_race_failure() {
        let mut input = wizard_input();
        input.class_index = "artificer".into();
        input.race_index = "tabaxi".into();
        let err = derive_character(&sample_rules(), &input).await.unwrap_err();
        assert!(err.to_string().contains("class \"artificer\""), "{err}");
    }

    #[test]
    fn spell_slots_skip_malformed_entries() {
        let slots = spell_slots(&json!({
            "spell_slots_level_1": 2,
            "spell_slots_level_2": null,
            "spell_slots_level_3": "3",
            "spell_slots_level_4": "many",
            "spell_slots_level_x": 1,
            "spell_slots_level_5": -1,
            "cantrips_known": 4
        }))
        .unwrap();
        assert_eq!(slots, BTreeMap::from([(1, 2), (2, 0), (3, 3)]));
    }

    #[test]
    fn spell_slots_require_object() {
        assert!(spell_slots(&json!("none")).is_none());
        assert!(spell_slots(&json!({})).is_none());
        assert_eq!(spell_slots(&json!({"cantrips_known": 3})), Some(BTreeMap::new()));
    }

    #[test]
    fn equipment_quantity_defaults_to_one() {
        let items = format_equipment(&[
            json!({"equipment": {"name": "Rope"}}),
            json!({"equipment": {"name": "Arrow"}, "quantity": 20}),
            json!({"quantity": 3}),
        ]);
        assert_eq!(items, vec!["1x Rope", "20x Arrow"]);
    }
}
