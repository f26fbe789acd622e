//! Database query functions for the `progressions` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use forge5e_core::ProgressionPlan;

use super::{NAME_FILTER, search_pattern};
use crate::models::{LibrarySummary, ListQuery, Page, ProgressionRecord};

/// Insert a saved plan. Returns the new row's summary.
pub async fn insert_progression(
    pool: &PgPool,
    name: &str,
    plan: &ProgressionPlan,
    prompt: Option<&str>,
) -> Result<LibrarySummary> {
    let saved = sqlx::query_as::<_, LibrarySummary>(
        "INSERT INTO progressions (name, plan, prompt) \
         VALUES ($1, $2, $3) \
         RETURNING id, name, created_at",
    )
    .bind(name)
    .bind(Json(plan))
    .bind(prompt)
    .fetch_one(pool)
    .await
    .context("failed to insert progression")?;

    Ok(saved)
}

pub async fn get_progression(pool: &PgPool, id: Uuid) -> Result<Option<ProgressionRecord>> {
    let record =
        sqlx::query_as::<_, ProgressionRecord>("SELECT * FROM progressions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch progression")?;

    Ok(record)
}

pub async fn list_progressions(pool: &PgPool, query: &ListQuery) -> Result<Page<LibrarySummary>> {
    let pattern = search_pattern(query);

    let total: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM progressions {NAME_FILTER}"))
            .bind(pattern.as_deref())
            .fetch_one(pool)
            .await
            .context("failed to count progressions")?;

    let sql = format!(
        "SELECT id, name, created_at FROM progressions {NAME_FILTER} {} LIMIT $2 OFFSET $3",
        query.sort.order_by()
    );
    let items = sqlx::query_as::<_, LibrarySummary>(&sql)
        .bind(pattern.as_deref())
        .bind(query.limit)
        .bind(query.offset())
        .fetch_all(pool)
        .await
        .context("failed to list progressions")?;

    Ok(Page { items, total })
}

/// Delete a saved plan. Returns `false` when no row matched.
pub async fn delete_progression(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM progressions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete progression")?;

    Ok(result.rows_affected() > 0)
}
