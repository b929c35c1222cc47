//! Declarative response validation
//!
//! A case names the expectations it cares about; the validator evaluates
//! each one against a response and returns a name → bool map. Keys this
//! version does not know are ignored when an expectation set is parsed.

use crate::client::ApiResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Expectation names as they appear in catalogs and outcomes
pub mod names {
    /// Exact status match
    pub const STATUS_CODE: &str = "status_code";
    /// Body parses as JSON
    pub const JSON_FORMAT: &str = "json_format";
    /// Latency ceiling
    pub const RESPONSE_TIME: &str = "response_time";
    /// Top-level fields present
    pub const REQUIRED_FIELDS: &str = "required_fields";
}

/// A single named expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Status must equal the given code
    StatusCode(u16),
    /// When `true`, body must parse as JSON
    JsonFormat(bool),
    /// Elapsed time must not exceed the given milliseconds
    ResponseTimeMs(u64),
    /// Body's top-level object must contain every field
    RequiredFields(Vec<String>),
}

impl Expectation {
    /// Name used in validation result maps
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Expectation::StatusCode(_) => names::STATUS_CODE,
            Expectation::JsonFormat(_) => names::JSON_FORMAT,
            Expectation::ResponseTimeMs(_) => names::RESPONSE_TIME,
            Expectation::RequiredFields(_) => names::REQUIRED_FIELDS,
        }
    }

    /// Evaluate against a response
    #[must_use]
    pub fn evaluate(&self, response: &ApiResponse) -> bool {
        match self {
            Expectation::StatusCode(expected) => response.status_code == Some(*expected),
            Expectation::JsonFormat(required) => {
                !*required || serde_json::from_str::<Value>(&response.body).is_ok()
            }
            Expectation::ResponseTimeMs(max_ms) => response.elapsed_ms <= *max_ms,
            Expectation::RequiredFields(fields) => has_required_fields(&response.body, fields),
        }
    }
}

/// Set of expectations attached to a case
///
/// Deserializes from a map such as
/// `{"status_code": 200, "json_format": true, "response_time": 5000}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationSet {
    /// Exact status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// JSON well-formedness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_format: Option<bool>,
    /// Latency ceiling in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    /// Required top-level fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_fields: Option<Vec<String>>,
}

impl ExpectationSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The set applied to cases without explicit expectations
    #[must_use]
    pub fn standard(expected_status: u16, max_response_ms: u64) -> Self {
        Self {
            status_code: Some(expected_status),
            json_format: Some(true),
            response_time: Some(max_response_ms),
            required_fields: None,
        }
    }

    /// With status expectation
    #[inline]
    #[must_use]
    pub fn status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// With JSON format expectation
    #[inline]
    #[must_use]
    pub fn json(mut self, required: bool) -> Self {
        self.json_format = Some(required);
        self
    }

    /// With latency ceiling
    #[inline]
    #[must_use]
    pub fn within_ms(mut self, max_ms: u64) -> Self {
        self.response_time = Some(max_ms);
        self
    }

    /// With required fields
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Expectations in evaluation order
    #[must_use]
    pub fn expectations(&self) -> Vec<Expectation> {
        let mut out = Vec::with_capacity(4);
        if let Some(code) = self.status_code {
            out.push(Expectation::StatusCode(code));
        }
        if let Some(required) = self.json_format {
            out.push(Expectation::JsonFormat(required));
        }
        if let Some(max_ms) = self.response_time {
            out.push(Expectation::ResponseTimeMs(max_ms));
        }
        if let Some(fields) = &self.required_fields {
            out.push(Expectation::RequiredFields(fields.clone()));
        }
        out
    }

    /// Check if no expectation is requested
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expectations().is_empty()
    }
}

/// Stateless response validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every requested expectation
    #[must_use]
    pub fn validate(&self, response: &ApiResponse, expectations: &ExpectationSet) -> BTreeMap<String, bool> {
        expectations
            .expectations()
            .iter()
            .map(|e| (e.name().to_string(), e.evaluate(response)))
            .collect()
    }

    /// Overall verdict: no transport error and every expectation held
    #[must_use]
    pub fn passed(response: &ApiResponse, results: &BTreeMap<String, bool>) -> bool {
        response.transport_error.is_none() && results.values().all(|ok| *ok)
    }
}

fn has_required_fields(body: &str, fields: &[String]) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return false;
    };

    // Collections are checked through their first element
    let object = match &value {
        Value::Object(map) => Some(map),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    };

    match object {
        Some(map) => fields.iter().all(|f| map.contains_key(f)),
        None => fields.is_empty(),
    }
}
