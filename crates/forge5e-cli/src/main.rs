mod character_cmds;
mod config;
mod library_cmds;
mod ollama;
mod portrait_client;
mod serve_cmd;
mod srd_client;
#[cfg(test)]
mod test_util;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use forge5e_core::rules::{RulesProvider, StaticRulesProvider};
use forge5e_core::{Ability, GenerateInput};
use forge5e_db::config::DbConfig;
use forge5e_db::pool;

use config::{ForgeConfig, RulesConfig};

#[derive(Parser)]
#[command(name = "forge5e", about = "Rules-aware 5e character and progression generator")]
struct Cli {
    /// Database URL (overrides FORGE5E_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a forge5e config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and run migrations
    DbInit {
        /// Drop all saved characters and plans first
        #[arg(long)]
        reset: bool,
    },
    /// Roll an ability score set (4d6, drop lowest)
    Roll {
        /// Seed for a reproducible roll
        #[arg(long)]
        seed: Option<u64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Derive a character draft
    Generate {
        #[command(flatten)]
        character: CharacterArgs,
        /// Print a Markdown sheet instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Derive a character and plan its progression
    Plan {
        #[command(flatten)]
        character: CharacterArgs,
        /// Level to plan up to
        #[arg(long)]
        target: i64,
        /// Print Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Saved character management
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
    /// Saved progression plan management
    Progression {
        #[command(subcommand)]
        command: ProgressionCommands,
    },
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Serve rules from a JSON fixture instead of the SRD API
        #[arg(long)]
        rules_file: Option<PathBuf>,
    },
}

/// Inputs shared by `generate` and `plan`.
#[derive(Args)]
pub struct CharacterArgs {
    /// Class index (e.g. wizard)
    #[arg(long = "class")]
    class_index: String,
    /// Race index (e.g. elf)
    #[arg(long = "race")]
    race_index: String,
    /// Background index (e.g. sage)
    #[arg(long = "background")]
    background_index: String,
    /// Character level (clamped to 1..=20)
    #[arg(long, default_value_t = 1)]
    level: i64,
    /// Six comma-separated scores, e.g. 15,14,13,12,10,8
    #[arg(long, value_delimiter = ',', required = true)]
    scores: Vec<i32>,
    /// Ability receiving each score, e.g. INT,DEX,CON,WIS,STR,CHA
    #[arg(long, value_delimiter = ',', required = true)]
    assign: Vec<Ability>,
    /// Read rules from a JSON fixture instead of the SRD API
    #[arg(long)]
    rules_file: Option<PathBuf>,
}

impl CharacterArgs {
    fn input(&self) -> GenerateInput {
        GenerateInput {
            class_index: self.class_index.clone(),
            race_index: self.race_index.clone(),
            background_index: self.background_index.clone(),
            level: self.level,
            scores: self.scores.clone(),
            assignment: self.assign.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum LibraryCommands {
    /// List saved characters
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a saved character
    Show {
        /// Character ID
        id: String,
        /// Print a Markdown sheet instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Delete a saved character
    Delete {
        /// Character ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProgressionCommands {
    /// List saved progression plans
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show a saved progression plan
    Show {
        /// Plan ID
        id: String,
        /// Print Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Delete a saved progression plan
    Delete {
        /// Plan ID
        id: String,
    },
}

/// Listing options.
#[derive(Args)]
pub struct PageArgs {
    /// Page number (from 1)
    #[arg(long, default_value_t = 1)]
    page: i64,
    /// Rows per page (1..=100)
    #[arg(long, default_value_t = 20)]
    limit: i64,
    /// Case-insensitive name filter
    #[arg(long)]
    search: Option<String>,
    /// name_asc, name_desc, created_asc or created_desc
    #[arg(long)]
    sort: Option<String>,
}

/// Rules from a fixture file when given, otherwise the SRD API client.
fn rules_provider(
    rules_file: Option<&Path>,
    rules: &RulesConfig,
) -> anyhow::Result<Arc<dyn RulesProvider>> {
    match rules_file {
        Some(path) => {
            let provider = StaticRulesProvider::from_file(path)?;
            info!(path = %path.display(), documents = provider.len(), "using rules fixture");
            Ok(Arc::new(provider))
        }
        None => Ok(Arc::new(srd_client::SrdRulesProvider::new(rules)?)),
    }
}

/// Execute `forge5e init`: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_owned(),
        },
        rules: config::RulesSection::default(),
        inference: config::InferenceSection::default(),
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `forge5e db-init` to create and migrate the database.");
    Ok(())
}

/// Execute `forge5e db-init`: create the database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>, reset: bool) -> anyhow::Result<()> {
    let resolved = ForgeConfig::resolve(cli_db_url)?;

    println!("Initializing forge5e database...");
    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    let result = async {
        if reset {
            pool::reset_schema(&db_pool).await?;
        } else {
            pool::run_migrations(&db_pool).await?;
        }
        pool::table_counts(&db_pool).await
    }
    .await;
    db_pool.close().await;

    println!("Database ready. Tables:");
    for (table, count) in &result? {
        println!("  {table}: {count} rows");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit { reset } => {
            cmd_db_init(cli.database_url.as_deref(), reset).await?;
        }
        Commands::Roll { seed, json } => {
            character_cmds::run_roll(seed, json)?;
        }
        Commands::Generate {
            character,
            markdown,
        } => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref())?;
            let rules = rules_provider(character.rules_file.as_deref(), &resolved.rules)?;
            character_cmds::run_generate(rules.as_ref(), &character.input(), markdown).await?;
        }
        Commands::Plan {
            character,
            target,
            markdown,
        } => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref())?;
            let rules = rules_provider(character.rules_file.as_deref(), &resolved.rules)?;
            character_cmds::run_plan(rules.as_ref(), &character.input(), target, markdown)
                .await?;
        }
        Commands::Library { command } => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = library_cmds::run_library_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Progression { command } => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = library_cmds::run_progression_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve {
            bind,
            port,
            rules_file,
        } => {
            let resolved = ForgeConfig::resolve(cli.database_url.as_deref())?;
            let rules = rules_provider(rules_file.as_deref(), &resolved.rules)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            pool::run_migrations(&db_pool).await?;
            let state = serve_cmd::AppState::from_config(db_pool.clone(), rules, &resolved)?;
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
