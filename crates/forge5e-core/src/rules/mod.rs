//! Rules provider seam: keyed, read-only lookups of rules documents.
//!
//! The deriver and planner never talk to a concrete data source. They go
//! through the [`RulesProvider`] trait, which is object-safe so a provider can
//! be shared as `Arc<dyn RulesProvider>` across request handlers.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use memory::StaticRulesProvider;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Identifies one rules document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RulesKey {
    Class(String),
    Race(String),
    Background(String),
    ClassLevel { class: String, level: u8 },
    StartingEquipment(String),
}

impl RulesKey {
    /// Category name used in error messages.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Race(_) => "race",
            Self::Background(_) => "background",
            Self::ClassLevel { .. } => "class-level",
            Self::StartingEquipment(_) => "class-starting-equipment",
        }
    }

    /// Resource path relative to the rules API root, e.g.
    /// `classes/wizard/levels/5`.
    pub fn path(&self) -> String {
        match self {
            Self::Class(index) => format!("classes/{index}"),
            Self::Race(index) => format!("races/{index}"),
            Self::Background(index) => format!("backgrounds/{index}"),
            Self::ClassLevel { class, level } => format!("classes/{class}/levels/{level}"),
            Self::StartingEquipment(index) => format!("starting-equipment/{index}"),
        }
    }
}

impl fmt::Display for RulesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassLevel { class, level } => write!(f, "class-level {class:?} level {level}"),
            Self::Class(i) | Self::Race(i) | Self::Background(i) | Self::StartingEquipment(i) => {
                write!(f, "{} {i:?}", self.category())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rules document could not be retrieved.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("rules document not found: {0}")]
    NotFound(RulesKey),

    #[error("rules lookup failed for {key}: {message}")]
    Provider { key: RulesKey, message: String },
}

impl LookupError {
    /// The key whose lookup failed.
    pub fn key(&self) -> &RulesKey {
        match self {
            Self::NotFound(key) | Self::Provider { key, .. } => key,
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A semi-structured rules document (a JSON object).
///
/// Accessors are lenient: a missing or mistyped field reads as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn int_field(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    /// Entries of an array field; empty when absent or not an array.
    pub fn list(&self, field: &str) -> &[Value] {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The `name` of every object in an array field, skipping entries
    /// without one.
    pub fn names(&self, field: &str) -> Vec<String> {
        self.list(field)
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .map(str::to_owned)
            .collect()
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Read-only source of rules documents.
///
/// Caching, timeouts and backpressure are the implementation's concern.
#[async_trait]
pub trait RulesProvider: Send + Sync {
    /// Fetch the document identified by `key`.
    async fn get(&self, key: &RulesKey) -> Result<Document, LookupError>;
}

// Compile-time assertion: RulesProvider must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn RulesProvider) {}
};
