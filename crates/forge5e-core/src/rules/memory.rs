//! In-memory rules provider, keyed by resource path.
//!
//! Used for tests and for offline fixtures: a JSON object mapping paths such
//! as `classes/wizard` to documents.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use super::{Document, LookupError, RulesKey, RulesProvider};

/// A fixed set of documents served from memory.
#[derive(Debug, Default, Clone)]
pub struct StaticRulesProvider {
    documents: HashMap<String, Value>,
}

impl StaticRulesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `key`, replacing any previous one.
    pub fn insert(&mut self, key: &RulesKey, document: Value) {
        self.documents.insert(key.path(), document);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: RulesKey, document: Value) -> Self {
        self.insert(&key, document);
        self
    }

    /// Build a provider from a JSON object of `path -> document`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            bail!("rules fixture must be a JSON object keyed by resource path");
        };
        let documents = map
            .into_iter()
            .map(|(path, doc)| (path.trim_matches('/').to_owned(), doc))
            .collect();
        Ok(Self { documents })
    }

    /// Load a fixture file (see [`from_json`](Self::from_json)).
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rules fixture {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse rules fixture {}", path.display()))?;
        Self::from_json(value)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl RulesProvider for StaticRulesProvider {
    async fn get(&self, key: &RulesKey) -> Result<Document, LookupError> {
        self.documents
            .get(&key.path())
            .cloned()
            .map(Document::new)
            .ok_or_else(|| LookupError::NotFound(key.clone()))
    }
}
