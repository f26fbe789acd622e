//! Database query functions for the `characters` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{NAME_FILTER, search_pattern};
use crate::models::{CharacterRecord, LibrarySummary, ListQuery, NewCharacter, Page};

/// Insert a saved character. Returns the new row's summary.
pub async fn insert_character(pool: &PgPool, new: &NewCharacter<'_>) -> Result<LibrarySummary> {
    let saved = sqlx::query_as::<_, LibrarySummary>(
        "INSERT INTO characters (name, draft, backstory, progression, portrait_png) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, name, created_at",
    )
    .bind(new.name)
    .bind(Json(new.draft))
    .bind(new.backstory.map(Json))
    .bind(new.progression.map(Json))
    .bind(new.portrait_png)
    .fetch_one(pool)
    .await
    .context("failed to insert character")?;

    Ok(saved)
}

pub async fn get_character(pool: &PgPool, id: Uuid) -> Result<Option<CharacterRecord>> {
    let record = sqlx::query_as::<_, CharacterRecord>("SELECT * FROM characters WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch character")?;

    Ok(record)
}

/// One page of saved characters, filtered by case-insensitive name
/// substring.
pub async fn list_characters(pool: &PgPool, query: &ListQuery) -> Result<Page<LibrarySummary>> {
    let pattern = search_pattern(query);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM characters {NAME_FILTER}"))
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .context("failed to count characters")?;

    let sql = format!(
        "SELECT id, name, created_at FROM characters {NAME_FILTER} {} LIMIT $2 OFFSET $3",
        query.sort.order_by()
    );
    let items = sqlx::query_as::<_, LibrarySummary>(&sql)
        .bind(pattern.as_deref())
        .bind(query.limit)
        .bind(query.offset())
        .fetch_all(pool)
        .await
        .context("failed to list characters")?;

    Ok(Page { items, total })
}

/// Delete a saved character. Returns `false` when no row matched.
pub async fn delete_character(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM characters WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete character")?;

    Ok(result.rows_affected() > 0)
}
