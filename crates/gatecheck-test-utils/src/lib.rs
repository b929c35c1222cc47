//! Testing utilities for the gatecheck workspace
//!
//! Shared fixtures: a scripted in-memory sender, a static identifier
//! resolver, and case/outcome builders.

#![allow(missing_docs)]

use async_trait::async_trait;
use gatecheck_core::client::{ApiRequest, ApiResponse, RequestSender};
use gatecheck_core::error::{HarnessError, TransportError};
use gatecheck_core::identifiers::{IdentifierResolver, ResolvedId};
use gatecheck_core::types::{EndpointCase, HttpMethod, OutcomeStatus, RequestOutcome};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

/// Canned reply for one method and path
#[derive(Debug, Clone)]
pub enum Scripted {
    Status { code: u16, body: String },
    Transport(TransportError),
}

/// In-memory sender answering from a script keyed by `METHOD path`
///
/// Unscripted requests answer 404 with an empty JSON object. Every
/// request is recorded in arrival order.
#[derive(Debug, Default)]
pub struct ScriptedSender {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, method: HttpMethod, path: &str, code: u16, body: &str) -> Self {
        self.script.insert(
            key(method, path),
            Scripted::Status {
                code,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn with_json(self, method: HttpMethod, path: &str, body: &Value) -> Self {
        self.with_status(method, path, 200, &body.to_string())
    }

    pub fn with_transport_error(mut self, method: HttpMethod, path: &str, error: TransportError) -> Self {
        self.script.insert(key(method, path), Scripted::Transport(error));
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|r| r.path).collect()
    }

    pub fn call_count(&self, method: HttpMethod, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl RequestSender for ScriptedSender {
    async fn send(&self, request: &ApiRequest) -> ApiResponse {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.script.get(&key(request.method, &request.path)) {
            Some(Scripted::Status { code, body }) => response(*code, body),
            Some(Scripted::Transport(error)) => ApiResponse::transport_failure(error.clone(), 1),
            None => response(404, "{}"),
        }
    }
}

fn key(method: HttpMethod, path: &str) -> String {
    format!("{method} {path}")
}

/// Plain response with a JSON content type
pub fn response(code: u16, body: &str) -> ApiResponse {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    ApiResponse {
        status_code: Some(code),
        headers,
        body: body.to_string(),
        elapsed_ms: 1,
        transport_error: None,
    }
}

/// Resolver returning one fixed id for every service
#[derive(Debug, Clone)]
pub struct StaticResolver {
    id: ResolvedId,
}

impl StaticResolver {
    pub fn live(value: &str) -> Self {
        Self {
            id: ResolvedId::live(value),
        }
    }

    pub fn fallback(value: &str) -> Self {
        Self {
            id: ResolvedId::fallback(value),
        }
    }
}

#[async_trait]
impl IdentifierResolver for StaticResolver {
    async fn resolve_id(&self, _service: &str) -> Result<ResolvedId, HarnessError> {
        Ok(self.id.clone())
    }
}

pub fn get_case(name: &str, service: &str, path: &str) -> EndpointCase {
    EndpointCase::new(name, service, HttpMethod::Get, path)
}

/// FAIL outcome with the given status and message
pub fn failed_outcome(service: &str, endpoint: &str, http_status: Option<u16>, error: &str) -> RequestOutcome {
    let case = get_case(endpoint, service, endpoint);
    let mut outcome = RequestOutcome::for_case(&case, OutcomeStatus::Fail);
    outcome.http_status = http_status;
    outcome.error_message = Some(error.to_string());
    outcome
}

pub fn passed_outcome(service: &str, endpoint: &str) -> RequestOutcome {
    let case = get_case(endpoint, service, endpoint);
    let mut outcome = RequestOutcome::for_case(&case, OutcomeStatus::Pass);
    outcome.http_status = Some(200);
    outcome
}
