//! Identifier resolution for placeholder path parameters
//!
//! Placeholders such as `test_series_123` are replaced with a real entity id
//! read from the service's listing endpoint. When no live id is available
//! the profile's static fallback id is used and flagged as such.

use crate::client::{ApiRequest, RequestSender};
use crate::error::HarnessError;
use crate::services::ServiceRegistry;
use async_trait::async_trait;
use moka::future::Cache;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Field names checked, in order, for an item's id
pub const ID_FIELDS: &[&str] = &[
    "id",
    "Id",
    "ID",
    "seriesId",
    "movieId",
    "authorId",
    "bookId",
    "applicationId",
    "indexerId",
    "downloadClientId",
    "nzo_id",
];

/// Where a resolved id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdSource {
    /// Read from the live service
    Live,
    /// Static fallback from the service profile
    Fallback,
}

/// Identifier for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedId {
    /// Id value
    pub value: String,
    /// Origin
    pub source: IdSource,
}

impl ResolvedId {
    /// Live id
    #[inline]
    #[must_use]
    pub fn live(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: IdSource::Live,
        }
    }

    /// Fallback id
    #[inline]
    #[must_use]
    pub fn fallback(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: IdSource::Fallback,
        }
    }

    /// Check if this is a fallback
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == IdSource::Fallback
    }
}

/// How a live id is picked from a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdSelection {
    /// First item
    #[default]
    First,
    /// Random item among the first `id_sample_limit`
    Random,
}

/// Supplies real ids for a service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    /// Resolve an id for the service
    ///
    /// # Errors
    /// Implementations may fail; the executor turns the failure into a
    /// runner exception for the affected case only.
    async fn resolve_id(&self, service: &str) -> Result<ResolvedId, HarnessError>;
}

/// Per-run id cache keyed by service
///
/// Concurrent lookups for the same service share one listing call.
#[derive(Debug, Clone)]
pub struct IdCache {
    inner: Cache<String, ResolvedId>,
}

impl IdCache {
    /// Create cache
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Cached id, if any
    pub async fn get(&self, service: &str) -> Option<ResolvedId> {
        self.inner.get(service).await
    }

    /// Cached id or the result of running `resolve` once
    pub async fn get_or_resolve<F>(&self, service: &str, resolve: F) -> ResolvedId
    where
        F: std::future::Future<Output = ResolvedId>,
    {
        self.inner.get_with(service.to_string(), resolve).await
    }
}

impl Default for IdCache {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Resolves ids from the gateway's listing endpoints
///
/// Results, including fallbacks, are cached for the run.
pub struct HttpIdentifierResolver {
    sender: Arc<dyn RequestSender>,
    registry: ServiceRegistry,
    cache: IdCache,
    selection: IdSelection,
    sample_limit: usize,
}

impl HttpIdentifierResolver {
    /// Create resolver
    #[must_use]
    pub fn new(sender: Arc<dyn RequestSender>, registry: ServiceRegistry) -> Self {
        Self {
            sender,
            registry,
            cache: IdCache::default(),
            selection: IdSelection::First,
            sample_limit: 20,
        }
    }

    /// With selection strategy
    #[inline]
    #[must_use]
    pub fn with_selection(mut self, selection: IdSelection, sample_limit: usize) -> Self {
        self.selection = selection;
        self.sample_limit = sample_limit.max(1);
        self
    }

    /// With a shared cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: IdCache) -> Self {
        self.cache = cache;
        self
    }

    async fn resolve_uncached(&self, service: &str) -> ResolvedId {
        match self.fetch_live(service).await {
            Some(id) => {
                debug!(service, id = %id, "resolved live id");
                ResolvedId::live(id)
            }
            None => {
                let fallback = self.registry.profile(service).fallback_id;
                warn!(service, id = %fallback, "no live id, using fallback");
                ResolvedId::fallback(fallback)
            }
        }
    }

    async fn fetch_live(&self, service: &str) -> Option<String> {
        let profile = self.registry.profile(service);
        let endpoint = profile.id_endpoint.as_deref()?;

        let response = self.sender.send(&ApiRequest::get(endpoint)).await;
        if let Some(err) = &response.transport_error {
            debug!(service, error = %err, "id listing unavailable");
            return None;
        }
        if response.status_code != Some(200) {
            debug!(service, status = ?response.status_code, "id listing returned non-200");
            return None;
        }
        let data: Value = serde_json::from_str(&response.body).ok()?;

        let ids = extract_ids(service, &data, self.sample_limit);
        match self.selection {
            IdSelection::First => ids.into_iter().next(),
            IdSelection::Random => ids.choose(&mut rand::rng()).cloned(),
        }
    }
}

#[async_trait]
impl IdentifierResolver for HttpIdentifierResolver {
    async fn resolve_id(&self, service: &str) -> Result<ResolvedId, HarnessError> {
        Ok(self.cache.get_or_resolve(service, self.resolve_uncached(service)).await)
    }
}

/// Ids found in a listing response, at most `limit`
///
/// sabnzbd wraps its items as `{"queue": [...]}` keyed by `nzo_id`; other
/// services return a plain array.
#[must_use]
pub fn extract_ids(service: &str, data: &Value, limit: usize) -> Vec<String> {
    let items = if service == "sabnzbd" {
        data.get("queue").and_then(Value::as_array)
    } else {
        data.as_array()
    };

    items
        .into_iter()
        .flatten()
        .take(limit)
        .filter_map(|item| {
            if service == "sabnzbd" {
                item.get("nzo_id").and_then(scalar_id)
            } else {
                item_id(item)
            }
        })
        .collect()
}

/// Id of one listing item
#[must_use]
pub fn item_id(item: &Value) -> Option<String> {
    let object = item.as_object()?;
    ID_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(scalar_id))
        .or_else(|| {
            object
                .iter()
                .filter(|(key, _)| key.to_ascii_lowercase().contains("id"))
                .find_map(|(_, value)| scalar_id(value))
        })
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
