//! Backstory generation: prompt construction and response parsing.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::ability::Ability;
use crate::character::CharacterDraft;
use crate::generation::{GenerationError, TextGenerator};

/// Instruction placed ahead of every backstory prompt.
pub const BACKSTORY_SYSTEM: &str = "You are an expert tabletop RPG writer. Write backstories \
consistent with D&D 5e SRD, avoiding copyrighted setting names. Use clear, evocative prose \
suitable for a character handout.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Heroic,
    Grimdark,
    Whimsical,
    Noir,
    Epic,
    #[default]
    Custom,
}

impl Tone {
    fn as_str(self) -> &'static str {
        match self {
            Self::Heroic => "heroic",
            Self::Grimdark => "grimdark",
            Self::Whimsical => "whimsical",
            Self::Noir => "noir",
            Self::Epic => "epic",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Standard,
    Long,
}

impl Length {
    fn word_target(self) -> &'static str {
        match self {
            Self::Short => "~120-180 words",
            Self::Standard => "~250-350 words",
            Self::Long => "~500-700 words",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackstoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub length: Length,
    #[serde(default = "default_true")]
    pub include_hooks: bool,
    #[serde(default)]
    pub custom_inspiration: Option<String>,
    pub draft: CharacterDraft,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackstoryResult {
    pub summary: String,
    pub traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub flaws: Vec<String>,
    pub hooks: Vec<String>,
    pub prose_markdown: String,
}

#[derive(Debug, Error)]
pub enum BackstoryError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("LLM returned non-JSON: {0}")]
    NotJson(serde_json::Error),

    #[error("backstory schema validation failed: {0}")]
    Schema(serde_json::Error),
}

/// One-paragraph rules summary of a draft, used in the prompt.
pub fn character_summary(draft: &CharacterDraft) -> String {
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
    format!(
        "{} {}, Level {}. Background: {}. Abilities {abilities}. Languages: {}. Saving Throws: {}.",
        draft.race,
        draft.class,
        draft.level,
        draft.background,
        join_or_dash(&draft.languages),
        join_or_dash(&draft.saving_throws),
    )
}

/// Build the full prompt, system instruction included.
pub fn build_prompt(input: &BackstoryInput) -> String {
    let mut prompt = format!("{BACKSTORY_SYSTEM}\n\n");
    let _ = writeln!(prompt, "Character summary: {}", character_summary(&input.draft));
    if let Some(name) = input.name.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(prompt, "Character name: {name}.");
    }
    let _ = writeln!(
        prompt,
        "Tone preset: {}. Target length: {}.",
        input.tone.as_str(),
        input.length.word_target()
    );
    if input.tone == Tone::Custom {
        if let Some(inspiration) = input.custom_inspiration.as_deref() {
            let _ = writeln!(prompt, "Custom inspiration: {inspiration}");
        }
    }
    prompt.push_str(
        "Return JSON ONLY with keys: summary, traits (list), ideals (list), bonds (list), \
         flaws (list), hooks (list), prose_markdown. Avoid extra keys.",
    );
    if !input.include_hooks {
        prompt.push_str(" The 'hooks' array should be empty.");
    }
    prompt
}

/// Parse a generator response into a [`BackstoryResult`].
///
/// Output wrapped in a Markdown code fence is unwrapped first.
pub fn parse_response(text: &str) -> Result<BackstoryResult, BackstoryError> {
    let value: Value = serde_json::from_str(strip_code_fence(text)).map_err(BackstoryError::NotJson)?;
    serde_json::from_value(value).map_err(BackstoryError::Schema)
}

/// Generate a backstory for a draft.
pub async fn generate_backstory(
    generator: &dyn TextGenerator,
    input: &BackstoryInput,
) -> Result<BackstoryResult, BackstoryError> {
    debug!(
        backend = generator.name(),
        race = %input.draft.race,
        class = %input.draft.class,
        level = input.draft.level,
        "generating backstory"
    );
    let text = generator.generate(&build_prompt(input)).await?;
    parse_response(&text)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "—".to_owned()
    } else {
        items.join(", ")
    }
}
