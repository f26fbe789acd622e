use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use forge5e_core::backstory::BackstoryResult;
use forge5e_core::{CharacterDraft, ProgressionPlan};

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Sort order for library listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
}

impl SortOrder {
    /// `ORDER BY` clause. Ties break on id so pages are stable.
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "ORDER BY lower(name) ASC, id ASC",
            Self::NameDesc => "ORDER BY lower(name) DESC, id DESC",
            Self::CreatedAsc => "ORDER BY created_at ASC, id ASC",
            Self::CreatedDesc => "ORDER BY created_at DESC, id DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::CreatedAsc => "created_asc",
            Self::CreatedDesc => "created_desc",
        };
        f.write_str(s)
    }
}

impl FromStr for SortOrder {
    type Err = SortOrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            "created_asc" => Ok(Self::CreatedAsc),
            "created_desc" => Ok(Self::CreatedDesc),
            other => Err(SortOrderParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`SortOrder`] string.
#[derive(Debug, Clone)]
pub struct SortOrderParseError(pub String);

impl fmt::Display for SortOrderParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort order: {:?}", self.0)
    }
}

impl std::error::Error for SortOrderParseError {}

/// Normalized listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub sort: SortOrder,
}

impl ListQuery {
    /// Clamp `limit` to `1..=100` and `page` to at least 1. A blank search
    /// is dropped and an unrecognized sort falls back to newest first.
    pub fn new(page: i64, limit: i64, search: Option<String>, sort: Option<&str>) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            search: search
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            sort: sort.and_then(|s| s.parse().ok()).unwrap_or_default(),
        }
    }

    /// Row offset of the page; saturates instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT, None, None)
    }
}

/// One row of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LibrarySummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A page of results plus the total number of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct CharacterRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub draft: Json<CharacterDraft>,
    pub backstory: Option<Json<BackstoryResult>>,
    pub progression: Option<Json<ProgressionPlan>>,
    pub portrait_png: Option<Vec<u8>>,
}

/// Fields for a new `characters` row.
#[derive(Debug, Clone)]
pub struct NewCharacter<'a> {
    pub name: &'a str,
    pub draft: &'a CharacterDraft,
    pub backstory: Option<&'a BackstoryResult>,
    pub progression: Option<&'a ProgressionPlan>,
    pub portrait_png: Option<&'a [u8]>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProgressionRecord {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub plan: Json<ProgressionPlan>,
    pub prompt: Option<String>,
}
