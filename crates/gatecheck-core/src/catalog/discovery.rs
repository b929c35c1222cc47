//! Endpoint discovery from API description documents
//!
//! Fetching never fails past this module: an unavailable, non-200,
//! non-JSON or non-OpenAPI document simply yields `None` and the resolver
//! falls back to built-in cases for that service.

use crate::catalog::classify::{classify, OperationMeta};
use crate::catalog::normalize::normalize_path;
use crate::client::{ApiRequest, ApiResponse, RequestSender};
use crate::services::ServiceProfile;
use crate::types::{EndpointCase, HttpMethod, SafetyMode, PLACEHOLDER_PREFIX};
use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fetches a service's API description
#[async_trait]
pub trait DescriptionFetcher: Send + Sync {
    /// Fetch and accept a description; `None` when unavailable
    async fn fetch(&self, profile: &ServiceProfile) -> Option<Arc<Value>>;
}

/// Per-run description cache keyed by service
///
/// Concurrent lookups for the same service share one fetch.
#[derive(Debug, Clone)]
pub struct DescriptionCache {
    inner: Cache<String, Option<Arc<Value>>>,
}

impl DescriptionCache {
    /// Create cache
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Get cached description or run the fetch once
    pub async fn get_or_fetch<F>(&self, service: &str, fetch: F) -> Option<Arc<Value>>
    where
        F: std::future::Future<Output = Option<Arc<Value>>>,
    {
        self.inner.get_with(service.to_string(), fetch).await
    }
}

impl Default for DescriptionCache {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Fetches descriptions through a [`RequestSender`], caching per service
pub struct HttpDescriptionFetcher {
    sender: Arc<dyn RequestSender>,
    cache: DescriptionCache,
}

impl HttpDescriptionFetcher {
    /// Create fetcher with a fresh cache
    #[must_use]
    pub fn new(sender: Arc<dyn RequestSender>) -> Self {
        Self {
            sender,
            cache: DescriptionCache::default(),
        }
    }

    /// With an injected cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: DescriptionCache) -> Self {
        self.cache = cache;
        self
    }

    async fn fetch_uncached(&self, profile: &ServiceProfile) -> Option<Arc<Value>> {
        let path = profile.description_path();
        debug!(service = %profile.key, path = %path, "fetching API description");

        let response = self.sender.send(&ApiRequest::get(&path)).await;
        match accept_description(&response) {
            Ok(doc) => {
                info!(service = %profile.key, "API description found");
                Some(Arc::new(doc))
            }
            Err(reason) => {
                warn!(service = %profile.key, path = %path, reason = %reason, "API description unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl DescriptionFetcher for HttpDescriptionFetcher {
    async fn fetch(&self, profile: &ServiceProfile) -> Option<Arc<Value>> {
        self.cache
            .get_or_fetch(&profile.key, self.fetch_uncached(profile))
            .await
    }
}

/// Accept a description response
///
/// # Errors
/// Returns why the response is not a usable description
pub fn accept_description(response: &ApiResponse) -> Result<Value, String> {
    if let Some(err) = &response.transport_error {
        return Err(err.to_string());
    }
    match response.status_code {
        Some(200) => {}
        Some(code) => return Err(format!("HTTP {code}")),
        None => return Err("no status".to_string()),
    }
    let doc: Value = serde_json::from_str(&response.body).map_err(|e| format!("invalid JSON: {e}"))?;
    let is_description = doc
        .as_object()
        .is_some_and(|o| o.contains_key("openapi") || o.contains_key("swagger"));
    if is_description {
        Ok(doc)
    } else {
        Err("missing openapi/swagger key".to_string())
    }
}

/// Base path declared by a description
///
/// `basePath` wins; otherwise the path component of the first server URL.
#[must_use]
pub fn base_path(doc: &Value) -> String {
    if let Some(base) = doc.get("basePath").and_then(Value::as_str) {
        if !base.is_empty() {
            return base.trim_end_matches('/').to_string();
        }
    }

    let Some(url) = doc
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(|s| s.get("url"))
        .and_then(Value::as_str)
    else {
        return String::new();
    };

    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) if url.starts_with('/') => url.to_string(),
        Err(_) => String::new(),
    };
    path.trim_end_matches('/').to_string()
}

/// Turn a description into cases for one service
///
/// Deprecated operations and non-HTTP keys (`parameters`, `summary`, ...)
/// are skipped. Destructive operations are mocked, the rest allowed.
#[must_use]
pub fn cases_from_description(profile: &ServiceProfile, doc: &Value) -> Vec<EndpointCase> {
    let base = base_path(doc);
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut cases = Vec::new();
    for (raw_path, item) in paths {
        let full_path = normalize_path(profile, &base, raw_path);
        let shared_params = path_params(item.get("parameters"));

        for method in HttpMethod::ALL {
            let Some(op) = item.get(method.as_str().to_ascii_lowercase()) else {
                continue;
            };
            if op.get("deprecated").and_then(Value::as_bool).unwrap_or(false) {
                continue;
            }

            let operation_id = op.get("operationId").and_then(Value::as_str);
            let tags: Vec<String> = op
                .get("tags")
                .and_then(Value::as_array)
                .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default();
            let meta = OperationMeta {
                operation_id,
                tags: &tags,
            };
            let reason = classify(method, raw_path, meta);

            let name = operation_id.map_or_else(|| format!("{method} {full_path}"), str::to_string);
            let description = ["description", "summary"]
                .iter()
                .find_map(|k| op.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
                .map_or_else(|| name.clone(), str::to_string);

            let mut case = EndpointCase::new(name, &profile.key, method, &full_path)
                .with_description(description);
            case.path_params = shared_params.clone();
            case.path_params.extend(path_params(op.get("parameters")));

            case = match reason {
                Some(reason) => {
                    debug!(service = %profile.key, path = %full_path, %method, %reason, "destructive operation");
                    case.destructive(SafetyMode::Mock)
                }
                None => case.with_safety_mode(SafetyMode::Allow),
            };
            cases.push(case);
        }
    }
    cases
}

fn path_params(parameters: Option<&Value>) -> BTreeMap<String, String> {
    parameters
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|p| p.get("in").and_then(Value::as_str) == Some("path"))
        .filter_map(|p| p.get("name").and_then(Value::as_str))
        .map(|name| (name.to_string(), format!("{PLACEHOLDER_PREFIX}{name}_123")))
        .collect()
}
