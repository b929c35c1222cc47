//! Core types for gatecheck
//!
//! Defines the value objects that flow through one run:
//! - HTTP methods and safety modes
//! - Endpoint cases (one test unit each)
//! - Request outcomes (one per case)

use crate::validator::ExpectationSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix marking a parameter value as "substitute a real id if available"
pub const PLACEHOLDER_PREFIX: &str = "test_";

/// HTTP methods an endpoint case may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// All supported methods
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Upper-case wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported HTTP method `{s}`"))
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Policy applied to a destructive case while safe mode is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    /// Synthesize a mocked outcome without dispatching
    #[default]
    Mock,
    /// Do not dispatch and record a skip
    Skip,
    /// Dispatch despite being destructive
    Allow,
}

impl fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SafetyMode::Mock => "mock",
            SafetyMode::Skip => "skip",
            SafetyMode::Allow => "allow",
        };
        f.write_str(label)
    }
}

/// One endpoint test unit
///
/// Built once by the catalog resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointCase {
    /// Human label, unique within a catalog
    pub name: String,
    /// Owning downstream service key
    pub service: String,
    /// Path template, may contain `{param}` placeholders
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Free-form description
    pub description: String,
    /// Whether executing the case would mutate backend state
    pub destructive: bool,
    /// Policy when destructive and safe mode is on
    pub safety_mode: SafetyMode,
    /// Values for `{param}` placeholders
    pub path_params: BTreeMap<String, String>,
    /// Query string parameters
    pub query_params: BTreeMap<String, String>,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    /// JSON request body
    pub body: Option<Value>,
    /// Expected HTTP status
    pub expected_status: u16,
    /// Explicit expectations; defaults apply when absent
    pub expectations: Option<ExpectationSet>,
}

impl EndpointCase {
    /// Create a safe GET-style case with default expectations
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        service: impl Into<String>,
        method: HttpMethod,
        path: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            service: service.into(),
            path: path.into(),
            method,
            destructive: false,
            safety_mode: SafetyMode::default(),
            path_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            expected_status: 200,
            expectations: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark as destructive under the given safety mode
    #[inline]
    #[must_use]
    pub fn destructive(mut self, mode: SafetyMode) -> Self {
        self.destructive = true;
        self.safety_mode = mode;
        self
    }

    /// With safety mode
    #[inline]
    #[must_use]
    pub fn with_safety_mode(mut self, mode: SafetyMode) -> Self {
        self.safety_mode = mode;
        self
    }

    /// With path parameter
    #[inline]
    #[must_use]
    pub fn with_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(key.into(), value.into());
        self
    }

    /// With query parameter
    #[inline]
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// With header
    #[inline]
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// With JSON body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// With expected status
    #[inline]
    #[must_use]
    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// With explicit expectations
    #[inline]
    #[must_use]
    pub fn with_expectations(mut self, expectations: ExpectationSet) -> Self {
        self.expectations = Some(expectations);
        self
    }

    /// Serialized request body, if any
    #[must_use]
    pub fn request_body_text(&self) -> Option<String> {
        self.body.as_ref().map(Value::to_string)
    }
}

/// Check if a parameter value asks for a real identifier
#[inline]
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Final status of one case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    /// All expectations held
    Pass,
    /// Transport error, validation failure or runner fault
    Fail,
    /// Not dispatched (mocked or skipped by the safety policy)
    Skipped,
}

impl OutcomeStatus {
    /// Upper-case label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Pass => "PASS",
            OutcomeStatus::Fail => "FAIL",
            OutcomeStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one endpoint case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    /// Service key
    pub service: String,
    /// Resolved path (template path when not dispatched)
    pub endpoint: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Case name
    pub test_name: String,
    /// PASS / FAIL / SKIPPED
    pub status: OutcomeStatus,
    /// HTTP status, absent on transport failure or skip
    pub http_status: Option<u16>,
    /// Failure description
    pub error_message: Option<String>,
    /// Wall time of the request in milliseconds
    pub elapsed_ms: u64,
    /// Serialized request body
    pub request_body: Option<String>,
    /// Raw response body
    pub response_body: Option<String>,
    /// Expectation name to result
    pub validation_results: BTreeMap<String, bool>,
    /// Why a case was mocked, skipped, or ran against a fallback id
    pub safety_note: Option<String>,
    /// Whether a placeholder was replaced by a static fallback id
    #[serde(default)]
    pub id_fallback: bool,
}

impl RequestOutcome {
    /// Create outcome skeleton for a case
    #[must_use]
    pub fn for_case(case: &EndpointCase, status: OutcomeStatus) -> Self {
        Self {
            service: case.service.clone(),
            endpoint: case.path.clone(),
            method: case.method,
            test_name: case.name.clone(),
            status,
            http_status: None,
            error_message: None,
            elapsed_ms: 0,
            request_body: None,
            response_body: None,
            validation_results: BTreeMap::new(),
            safety_note: None,
            id_fallback: false,
        }
    }

    /// Check if outcome failed
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Fail
    }

    /// Names of expectations that evaluated false
    #[must_use]
    pub fn failed_expectations(&self) -> Vec<&str> {
        self.validation_results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
