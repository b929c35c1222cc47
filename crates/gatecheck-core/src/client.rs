//! HTTP client adapter
//!
//! Issues one request against the gateway's base URL and folds every
//! outcome (success, HTTP error status, transport failure) into a single
//! [`ApiResponse`] value. There is no retry logic here.

use crate::error::{ConfigError, TransportError};
use crate::types::HttpMethod;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Accept header sent unless a case overrides it
pub const DEFAULT_ACCEPT: &str = "application/json, */*;q=0.1";

/// Request description handed to a [`RequestSender`]
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters, URL-encoded on send
    pub query: BTreeMap<String, String>,
    /// Extra headers
    pub headers: BTreeMap<String, String>,
    /// JSON body
    pub json_body: Option<Value>,
}

impl ApiRequest {
    /// Create request
    #[inline]
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
            json_body: None,
        }
    }

    /// Create GET request
    #[inline]
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// With query parameters
    #[inline]
    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// With headers
    #[inline]
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// With JSON body
    #[inline]
    #[must_use]
    pub fn with_json(mut self, body: Option<Value>) -> Self {
        self.json_body = body;
        self
    }
}

/// Uniform result of one request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status; `None` on transport failure
    pub status_code: Option<u16>,
    /// Response headers
    pub headers: BTreeMap<String, String>,
    /// Response body, lossily decoded
    pub body: String,
    /// Milliseconds from send until the body was read or the call failed
    pub elapsed_ms: u64,
    /// Transport failure, if any
    pub transport_error: Option<TransportError>,
}

impl ApiResponse {
    /// Create a transport failure response
    #[must_use]
    pub fn transport_failure(error: TransportError, elapsed_ms: u64) -> Self {
        Self {
            status_code: None,
            headers: BTreeMap::new(),
            body: String::new(),
            elapsed_ms,
            transport_error: Some(error),
        }
    }

    /// Check if the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.transport_error.is_none() && matches!(self.status_code, Some(200..=299))
    }
}

/// Sends requests to the target
///
/// Shared by every worker of a run, so implementations must not keep
/// per-request mutable state.
#[async_trait]
pub trait RequestSender: Send + Sync {
    /// Send one request; never fails, failures live inside the response
    async fn send(&self, request: &ApiRequest) -> ApiResponse;
}

/// reqwest-backed adapter bound to one base URL
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpClient {
    /// Create client with a fixed per-request timeout
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the underlying client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// Base URL without trailing slash
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the absolute URL for a path and query
    ///
    /// # Errors
    /// Returns `TransportError::InvalidUrl` if the joined URL does not parse
    pub fn url_for(
        &self,
        path: &str,
        query: &BTreeMap<String, String>,
    ) -> Result<reqwest::Url, TransportError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        let mut url =
            reqwest::Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{joined}: {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    fn classify(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                after_ms: duration_ms(self.timeout),
            }
        } else if error.is_connect() {
            TransportError::Connection(error_chain(error))
        } else if error.is_builder() {
            TransportError::InvalidUrl(error_chain(error))
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(error_chain(error))
        } else {
            TransportError::Other(error_chain(error))
        }
    }
}

/// Encode case headers, naming the first one that is rejected
fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = |message: String| TransportError::InvalidHeader {
            name: name.clone(),
            message,
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl RequestSender for HttpClient {
    async fn send(&self, request: &ApiRequest) -> ApiResponse {
        let url = match self.url_for(&request.path, &request.query) {
            Ok(url) => url,
            Err(e) => return ApiResponse::transport_failure(e, 0),
        };

        let headers = match header_map(&request.headers) {
            Ok(headers) => headers,
            Err(e) => return ApiResponse::transport_failure(e, 0),
        };

        let mut builder = self.client.request(request.method.into(), url);
        if !headers.contains_key(ACCEPT) {
            builder = builder.header(ACCEPT, DEFAULT_ACCEPT);
        }
        builder = builder.headers(headers);
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = self.classify(&e);
                debug!(method = %request.method, path = %request.path, error = %error, "request failed");
                return ApiResponse::transport_failure(error, duration_ms(started.elapsed()));
            }
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let (body, transport_error) = match response.bytes().await {
            Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), None),
            Err(e) => (String::new(), Some(self.classify(&e))),
        };
        let elapsed_ms = duration_ms(started.elapsed());

        debug!(method = %request.method, path = %request.path, status, elapsed_ms, "request completed");

        ApiResponse {
            status_code: Some(status),
            headers,
            body,
            elapsed_ms,
            transport_error,
        }
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
