//! Rules provider backed by the 5e SRD HTTP API.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lru::LruCache;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use forge5e_core::rules::{Document, LookupError, RulesKey, RulesProvider};

use crate::config::RulesConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Most documents kept at once; least recently used entries go first.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

struct CacheEntry {
    fetched_at: Instant,
    value: Value,
}

/// Fetches rules documents over HTTP and caches successful responses for
/// the configured time-to-live in a bounded LRU.
pub struct SrdRulesProvider {
    client: Client,
    root: String,
    ttl: Duration,
    cache: RwLock<LruCache<String, CacheEntry>>,
}

impl SrdRulesProvider {
    pub fn new(config: &RulesConfig) -> Result<Self> {
        Self::with_capacity(config, DEFAULT_CACHE_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(config: &RulesConfig, capacity: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("forge5e/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        let root = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.api_prefix.trim_matches('/')
        );
        Ok(Self {
            client,
            root,
            ttl: config.cache_ttl,
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    fn url(&self, key: &RulesKey) -> String {
        format!("{}/{}", self.root, key.path())
    }

    /// Fresh cached value for `url`. Expired entries are evicted.
    async fn cached(&self, url: &str) -> Option<Value> {
        let mut cache = self.cache.write().await;
        let lookup = cache
            .get(url)
            .map(|entry| (entry.fetched_at.elapsed() < self.ttl).then(|| entry.value.clone()));
        match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                cache.pop(url);
                None
            }
            None => None,
        }
    }

    async fn fetch(&self, key: &RulesKey, url: &str) -> Result<Value, LookupError> {
        let provider_error = |message: String| LookupError::Provider {
            key: key.clone(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| provider_error(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(LookupError::NotFound(key.clone())),
            status if !status.is_success() => Err(provider_error(format!("HTTP {status}"))),
            _ => response
                .json::<Value>()
                .await
                .map_err(|e| provider_error(format!("invalid JSON: {e}"))),
        }
    }
}

#[async_trait]
impl RulesProvider for SrdRulesProvider {
    async fn get(&self, key: &RulesKey) -> Result<Document, LookupError> {
        let url = self.url(key);
        if let Some(value) = self.cached(&url).await {
            debug!(%key, "rules cache hit");
            return Ok(Document::new(value));
        }

        debug!(%key, %url, "fetching rules document");
        let value = self.fetch(key, &url).await?;
        self.cache.write().await.put(
            url,
            CacheEntry {
                fetched_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(Document::new(value))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(server: &MockServer, ttl: Duration) -> RulesConfig {
        RulesConfig {
            base_url: format!("{}/", server.uri()),
            api_prefix: "/api/2014/".to_owned(),
            cache_ttl: ttl,
        }
    }

    fn provider(server: &MockServer, ttl: Duration) -> SrdRulesProvider {
        SrdRulesProvider::new(&config(server, ttl)).unwrap()
    }

    #[tokio::test]
    async fn fetches_documents_by_key_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/classes/wizard/levels/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"level": 3})))
            .mount(&server)
            .await;

        let key = RulesKey::ClassLevel {
            class: "wizard".into(),
            level: 3,
        };
        let doc = provider(&server, Duration::from_secs(60)).get(&key).await.unwrap();
        assert_eq!(doc.int_field("level"), Some(3));
    }

    #[tokio::test]
    async fn not_found_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let key = RulesKey::Race("tabaxi".into());
        let err = provider(&server, Duration::from_secs(60)).get(&key).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(k) if k == key));
    }

    #[tokio::test]
    async fn server_errors_and_bad_json_are_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/races/elf"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2014/races/dwarf"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let rules = provider(&server, Duration::from_secs(60));
        let err = rules.get(&RulesKey::Race("elf".into())).await.unwrap_err();
        assert!(matches!(&err, LookupError::Provider { message, .. } if message.contains("503")));
        let err = rules.get(&RulesKey::Race("dwarf".into())).await.unwrap_err();
        assert!(matches!(&err, LookupError::Provider { message, .. } if message.contains("invalid JSON")));
    }

    #[tokio::test]
    async fn responses_are_cached_within_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/backgrounds/sage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Sage"})))
            .expect(1)
            .mount(&server)
            .await;

        let rules = provider(&server, Duration::from_secs(60));
        let key = RulesKey::Background("sage".into());
        for _ in 0..3 {
            assert_eq!(rules.get(&key).await.unwrap().str_field("name"), Some("Sage"));
        }
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/classes/fighter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Fighter"})))
            .expect(2)
            .mount(&server)
            .await;

        let rules = provider(&server, Duration::ZERO);
        let key = RulesKey::Class("fighter".into());
        rules.get(&key).await.unwrap();
        rules.get(&key).await.unwrap();
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_on_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/classes/fighter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Fighter"})))
            .mount(&server)
            .await;

        let rules = provider(&server, Duration::ZERO);
        rules.get(&RulesKey::Class("fighter".into())).await.unwrap();
        assert_eq!(rules.cache.read().await.len(), 1);

        let url = format!("{}/api/2014/classes/fighter", server.uri());
        assert!(rules.cached(&url).await.is_none());
        assert!(rules.cache.read().await.is_empty());
    }

    #[tokio::test]
    async fn cache_is_bounded_by_capacity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/2014/races/elf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Elf"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/2014/races/dwarf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Dwarf"})))
            .expect(1)
            .mount(&server)
            .await;

        let rules =
            SrdRulesProvider::with_capacity(&config(&server, Duration::from_secs(60)), 1).unwrap();
        let elf = RulesKey::Race("elf".into());
        rules.get(&elf).await.unwrap();
        rules.get(&RulesKey::Race("dwarf".into())).await.unwrap();
        assert_eq!(rules.cache.read().await.len(), 1);
        // Evicted by dwarf, so fetched again.
        rules.get(&elf).await.unwrap();
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let rules = provider(&server, Duration::from_secs(60));
        let key = RulesKey::StartingEquipment("wizard".into());
        assert!(rules.get(&key).await.is_err());
        assert!(rules.get(&key).await.is_err());
    }
}
