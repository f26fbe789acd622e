//! The progression planner.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::ForgeError;
use crate::math::clamp_level;
use crate::rules::{RulesKey, RulesProvider};

use super::tables::{asi_levels, subclass_level};
use super::{LevelPick, ProgressionInput, ProgressionPlan};

/// Marker attached to every ASI level. The actual choice is left to the
/// player.
pub const ASI_PLACEHOLDER: &str = "+2 to primary ability";

/// Notes attached to every generated plan.
pub const SKELETON_NOTES: &str = "This is an initial, rules-aware skeleton plan.\n\n\
    • Features pulled from SRD per level.\n\n\
    • Subclass chosen automatically if available; adjust as desired.\n\n\
    • ASI/feat choices are placeholders.\n";

/// Build a [`ProgressionPlan`] from level 1 to the (clamped) target level.
///
/// Only an empty class index or a hit die beyond `i32` is fatal. The
/// subclass lookup and every per-level feature lookup degrade independently:
/// a failure leaves that value empty and the rest of the plan intact.
pub async fn plan_progression(
    rules: &dyn RulesProvider,
    input: &ProgressionInput,
) -> Result<ProgressionPlan, ForgeError> {
    let class_index = input.class_index.trim().to_lowercase();
    if class_index.is_empty() {
        return Err(ForgeError::validation("class_index required"));
    }
    let target = clamp_level(input.target_level);
    let draft = &input.draft;
    let hit_die = i32::try_from(draft.hit_die).map_err(|_| {
        ForgeError::validation(format!("hit_die out of range: {}", draft.hit_die))
    })?;

    debug!(class = %class_index, target, "planning progression");

    let class_key = RulesKey::Class(class_index.clone());
    let level_lookups = (1..=target).map(|level| level_features(rules, &class_index, level));
    let (class_doc, features) = futures::join!(rules.get(&class_key), join_all(level_lookups));

    let chosen_subclass = match class_doc {
        Ok(doc) => doc.names("subclasses").into_iter().next(),
        Err(e) => {
            warn!(class = %class_index, error = %e, "subclass lookup failed");
            None
        }
    };
    let unlock_level = subclass_level(&class_index);
    let asi_schedule = asi_levels(&class_index);

    let con_mod = draft.abilities.constitution_mod;
    let first_level_hp = hit_die.saturating_add(con_mod);
    let later_level_hp = (hit_die / 2 + 1).saturating_add(con_mod);

    let picks = (1..=target)
        .zip(features)
        .map(|(level, features)| {
            let subclass = chosen_subclass.clone().filter(|_| level == unlock_level);
            LevelPick {
                level,
                hp_gain: if level == 1 { first_level_hp } else { later_level_hp },
                features,
                notes: subclass.as_ref().map(|s| format!("Chose subclass: {s}.")),
                subclass,
                asi: asi_schedule
                    .contains(&level)
                    .then(|| ASI_PLACEHOLDER.to_owned()),
                spells_known: Vec::new(),
                prepared: Vec::new(),
            }
        })
        .collect();

    Ok(ProgressionPlan {
        name: Some(
            draft
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("{} {} progression", draft.race, draft.class)),
        ),
        class_index,
        target_level: target,
        picks,
        notes_markdown: SKELETON_NOTES.to_owned(),
    })
}

/// Feature names unlocked at one level, or nothing if the lookup fails.
async fn level_features(rules: &dyn RulesProvider, class: &str, level: u8) -> Vec<String> {
    let key = RulesKey::ClassLevel {
        class: class.to_owned(),
        level,
    };
    match rules.get(&key).await {
        Ok(doc) => doc.names("features"),
        Err(e) => {
            warn!(%key, error = %e, "level features unavailable");
            Vec::new()
        }
    }
}
