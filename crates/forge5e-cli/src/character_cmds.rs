//! Handlers for `forge5e roll`, `forge5e generate` and `forge5e plan`.

use anyhow::{Context, Result};

use forge5e_core::export::{character_markdown, progression_markdown};
use forge5e_core::roll::{AbilitySet, roll_ability_set};
use forge5e_core::rules::RulesProvider;
use forge5e_core::{GenerateInput, ProgressionInput, derive_character, plan_progression};

// -----------------------------------------------------------------------
// forge5e roll
// -----------------------------------------------------------------------

pub fn run_roll(seed: Option<u64>, json: bool) -> Result<()> {
    let set = roll_ability_set(seed);
    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
    } else {
        print!("{}", roll_table(&set));
    }
    Ok(())
}

fn roll_table(set: &AbilitySet) -> String {
    let mut out = format!("{:<4}{:<16}{:>5}\n", "#", "DICE", "TOTAL");
    for (i, roll) in set.rolls.iter().enumerate() {
        let dice = roll
            .dice
            .iter()
            .enumerate()
            .map(|(j, d)| {
                if j == roll.dropped_index {
                    format!("({d})")
                } else {
                    d.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("{:<4}{:<16}{:>5}\n", i + 1, dice, roll.total));
    }
    let scores = set
        .scores
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&format!("\nScores: {scores}\n"));
    if let Some(seed) = set.seed {
        out.push_str(&format!("Seed:   {seed}\n"));
    }
    out
}

// -----------------------------------------------------------------------
// forge5e generate
// -----------------------------------------------------------------------

pub async fn run_generate(
    rules: &dyn RulesProvider,
    input: &GenerateInput,
    markdown: bool,
) -> Result<()> {
    let draft = derive_character(rules, input)
        .await
        .context("character derivation failed")?;
    if markdown {
        println!("{}", character_markdown(&draft, None, None));
    } else {
        println!("{}", serde_json::to_string_pretty(&draft)?);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// forge5e plan
// -----------------------------------------------------------------------

pub async fn run_plan(
    rules: &dyn RulesProvider,
    input: &GenerateInput,
    target_level: i64,
    markdown: bool,
) -> Result<()> {
    let draft = derive_character(rules, input)
        .await
        .context("character derivation failed")?;
    let plan = plan_progression(
        rules,
        &ProgressionInput {
            class_index: input.class_index.clone(),
            target_level,
            draft: draft.clone(),
        },
    )
    .await
    .context("progression planning failed")?;

    if markdown {
        println!("{}", progression_markdown(&plan, Some(&draft)));
    } else {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }
    Ok(())
}
