//! Handlers for `forge5e library` and `forge5e progression` subcommands.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use forge5e_core::export::{character_markdown, progression_markdown};
use forge5e_db::models::{LibrarySummary, ListQuery, Page};
use forge5e_db::queries::{characters, progressions};

use crate::{LibraryCommands, PageArgs, ProgressionCommands};

// -----------------------------------------------------------------------
// Public entry points
// -----------------------------------------------------------------------

pub async fn run_library_command(command: LibraryCommands, pool: &PgPool) -> Result<()> {
    match command {
        LibraryCommands::List { page } => {
            let listing = characters::list_characters(pool, &list_query(page)).await?;
            print_page(&listing, "characters");
            Ok(())
        }
        LibraryCommands::Show { id, markdown } => cmd_show_character(pool, &id, markdown).await,
        LibraryCommands::Delete { id } => {
            let id = parse_id(&id)?;
            if !characters::delete_character(pool, id).await? {
                anyhow::bail!("character {id} not found");
            }
            println!("Character {id} deleted.");
            Ok(())
        }
    }
}

pub async fn run_progression_command(command: ProgressionCommands, pool: &PgPool) -> Result<()> {
    match command {
        ProgressionCommands::List { page } => {
            let listing = progressions::list_progressions(pool, &list_query(page)).await?;
            print_page(&listing, "progression plans");
            Ok(())
        }
        ProgressionCommands::Show { id, markdown } => {
            cmd_show_progression(pool, &id, markdown).await
        }
        ProgressionCommands::Delete { id } => {
            let id = parse_id(&id)?;
            if !progressions::delete_progression(pool, id).await? {
                anyhow::bail!("progression {id} not found");
            }
            println!("Progression {id} deleted.");
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------
// show
// -----------------------------------------------------------------------

async fn cmd_show_character(pool: &PgPool, id: &str, markdown: bool) -> Result<()> {
    let id = parse_id(id)?;
    let record = characters::get_character(pool, id)
        .await?
        .with_context(|| format!("character {id} not found"))?;

    let backstory = record.backstory.as_ref().map(|b| &b.0);
    let progression = record.progression.as_ref().map(|p| &p.0);
    if markdown {
        println!("{}", character_markdown(&record.draft, backstory, progression));
        return Ok(());
    }

    let body = serde_json::json!({
        "id": record.id,
        "name": record.name,
        "created_at": record.created_at,
        "draft": record.draft.0,
        "backstory": backstory,
        "progression": progression,
        "has_portrait": record.portrait_png.is_some(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn cmd_show_progression(pool: &PgPool, id: &str, markdown: bool) -> Result<()> {
    let id = parse_id(id)?;
    let record = progressions::get_progression(pool, id)
        .await?
        .with_context(|| format!("progression {id} not found"))?;

    if markdown {
        println!("{}", progression_markdown(&record.plan, None));
        return Ok(());
    }

    let body = serde_json::json!({
        "id": record.id,
        "name": record.name,
        "created_at": record.created_at,
        "plan": record.plan.0,
        "prompt": record.prompt,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("invalid ID: {id}"))
}

fn list_query(args: PageArgs) -> ListQuery {
    ListQuery::new(args.page, args.limit, args.search, args.sort.as_deref())
}

fn print_page(page: &Page<LibrarySummary>, what: &str) {
    if page.items.is_empty() {
        println!("No {what} found.");
        return;
    }

    let id_w = 36;
    let name_w = page
        .items
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<id_w$}  {:<name_w$}  CREATED", "ID", "NAME");
    for item in &page.items {
        println!(
            "{:<id_w$}  {:<name_w$}  {}",
            item.id,
            item.name,
            item.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    println!();
    println!("{} of {} {what}", page.items.len(), page.total);
}
