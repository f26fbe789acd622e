//! Configuration file management for forge5e.
//!
//! Provides a TOML config file at `~/.config/forge5e/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use forge5e_db::config::DbConfig;

pub const DEFAULT_RULES_BASE_URL: &str = "https://www.dnd5eapi.co";
pub const DEFAULT_RULES_API_PREFIX: &str = "api/2014";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_LLM_MODEL: &str = "gpt-oss:120b";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub inference: InferenceSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RulesSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InferenceSection {
    /// Ollama `/api/generate` endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Diffusion server endpoint returning PNG bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait_url: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/forge5e`, or `~/.config/forge5e` on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("forge5e");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("forge5e")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Write the config file, creating parent directories. The file is made
/// owner-only on Unix since it holds the database URL.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub llm_url: Option<String>,
    pub llm_model: String,
    pub portrait_url: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub db_config: DbConfig,
    pub rules: RulesConfig,
    pub inference: InferenceConfig,
}

impl ForgeConfig {
    /// Resolve against the config file on disk. A missing file is fine; an
    /// unparsable one is an error.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };
        Ok(Self::resolve_with(cli_db_url, file))
    }

    /// Resolve against an already-loaded config file.
    pub fn resolve_with(cli_db_url: Option<&str>, file: Option<ConfigFile>) -> Self {
        let (database, rules, inference) = match file {
            Some(f) => (Some(f.database), f.rules, f.inference),
            None => (None, RulesSection::default(), InferenceSection::default()),
        };

        let db_url = cli_db_url
            .map(str::to_owned)
            .or_else(|| env_var(DbConfig::ENV_VAR))
            .or(database.map(|d| d.url))
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let rules = RulesConfig {
            base_url: env_var("FORGE5E_RULES_BASE_URL")
                .or(rules.base_url)
                .unwrap_or_else(|| DEFAULT_RULES_BASE_URL.to_owned()),
            api_prefix: env_var("FORGE5E_RULES_API_PREFIX")
                .or(rules.api_prefix)
                .unwrap_or_else(|| DEFAULT_RULES_API_PREFIX.to_owned()),
            cache_ttl: Duration::from_secs(rules.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS)),
        };

        let inference = InferenceConfig {
            llm_url: env_var("FORGE5E_LLM_URL").or(inference.llm_url),
            llm_model: env_var("FORGE5E_LLM_MODEL")
                .or(inference.llm_model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_owned()),
            portrait_url: env_var("FORGE5E_PORTRAIT_URL").or(inference.portrait_url),
        };

        Self {
            db_config: DbConfig::new(db_url),
            rules,
            inference,
        }
    }
}

/// A set, non-blank environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
