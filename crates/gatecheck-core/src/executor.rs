//! Safety-gated concurrent executor
//!
//! Runs every case of a catalog through one shared [`RequestSender`] with a
//! bounded number of in-flight requests. Destructive cases are mocked,
//! skipped or allowed according to their safety mode while safe mode is on.
//! Results come back in catalog order whatever order they complete in.

use crate::client::{ApiRequest, ApiResponse, RequestSender};
use crate::error::HarnessError;
use crate::identifiers::{IdentifierResolver, ResolvedId};
use crate::types::{is_placeholder, EndpointCase, OutcomeStatus, RequestOutcome, SafetyMode};
use crate::validator::{names, ExpectationSet, ResponseValidator};
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Status reported for mocked destructive cases
pub const MOCK_STATUS: u16 = 200;

/// Note attached to mocked cases
pub const MOCK_NOTE: &str = "Mocked in safe mode";

/// Note attached to skipped cases
pub const SKIP_NOTE: &str = "Skipped in safe mode";

/// Executor settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Whether destructive cases are gated
    pub safe_mode: bool,
    /// Latency ceiling used by default expectations
    pub max_response_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            max_response_ms: 10_000,
        }
    }
}

/// Runs catalogs against the target
#[derive(Clone)]
pub struct SafetyGatedExecutor {
    sender: Arc<dyn RequestSender>,
    resolver: Arc<dyn IdentifierResolver>,
    validator: ResponseValidator,
    config: ExecutorConfig,
}

impl SafetyGatedExecutor {
    /// Create executor
    #[must_use]
    pub fn new(sender: Arc<dyn RequestSender>, resolver: Arc<dyn IdentifierResolver>) -> Self {
        Self {
            sender,
            resolver,
            validator: ResponseValidator::new(),
            config: ExecutorConfig::default(),
        }
    }

    /// With config
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run every case with at most `concurrency` requests in flight
    ///
    /// Returns exactly one outcome per case, in catalog order. A fault in
    /// one case becomes a FAIL outcome for that case only.
    pub async fn run_all(&self, cases: &[EndpointCase], concurrency: usize) -> Vec<RequestOutcome> {
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut join_set: JoinSet<(usize, RequestOutcome)> = JoinSet::new();
        let mut slots: Vec<Option<RequestOutcome>> = vec![None; cases.len()];

        info!(cases = cases.len(), concurrency, safe_mode = self.config.safe_mode, "starting run");

        // A task is spawned only once it holds a permit
        for (index, case) in cases.iter().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    slots[index] = Some(runner_exception(case, &e.to_string()));
                    continue;
                }
            };
            while let Some(joined) = join_set.try_join_next() {
                store(&mut slots, joined);
            }

            let executor = self.clone();
            let case = case.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let outcome = AssertUnwindSafe(executor.run_case(&case))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| runner_exception(&case, &panic_message(&*panic)));
                (index, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            store(&mut slots, joined);
        }

        let outcomes: Vec<RequestOutcome> = slots
            .into_iter()
            .zip(cases)
            .map(|(slot, case)| slot.unwrap_or_else(|| runner_exception(case, "task aborted")))
            .collect();

        for outcome in &outcomes {
            metrics::counter!("gatecheck_cases_total", "status" => outcome.status.as_str()).increment(1);
        }
        info!(
            passed = count(&outcomes, OutcomeStatus::Pass),
            failed = count(&outcomes, OutcomeStatus::Fail),
            skipped = count(&outcomes, OutcomeStatus::Skipped),
            "run finished"
        );
        outcomes
    }

    /// Run a single case
    pub async fn run_case(&self, case: &EndpointCase) -> RequestOutcome {
        if self.config.safe_mode && case.destructive {
            match case.safety_mode {
                SafetyMode::Mock => return mocked(case),
                SafetyMode::Skip => return skipped(case),
                SafetyMode::Allow => {
                    debug!(case = %case.name, "destructive case allowed in safe mode");
                }
            }
        }

        let (path, fallback) = match self.resolve_path(case).await {
            Ok(resolved) => resolved,
            Err(e) => return runner_exception(case, &e.to_string()),
        };

        let request = ApiRequest::new(case.method, &path)
            .with_query(case.query_params.clone())
            .with_headers(case.headers.clone())
            .with_json(case.body.clone());
        let response = self.sender.send(&request).await;
        #[allow(clippy::cast_precision_loss)]
        metrics::histogram!("gatecheck_request_duration_ms").record(response.elapsed_ms as f64);

        let expectations = case
            .expectations
            .clone()
            .unwrap_or_else(|| ExpectationSet::standard(case.expected_status, self.config.max_response_ms));
        let validation_results = self.validator.validate(&response, &expectations);
        let passed = ResponseValidator::passed(&response, &validation_results);

        let mut outcome = RequestOutcome::for_case(
            case,
            if passed { OutcomeStatus::Pass } else { OutcomeStatus::Fail },
        );
        outcome.endpoint = path;
        outcome.http_status = response.status_code;
        outcome.elapsed_ms = response.elapsed_ms;
        outcome.request_body = case.request_body_text();
        outcome.validation_results = validation_results;
        if !passed {
            let message = failure_message(&response, &outcome.failed_expectations());
            outcome.error_message = Some(message);
        }
        outcome.response_body = Some(response.body);

        if let Some(id) = fallback {
            outcome.id_fallback = true;
            outcome.safety_note = Some(format!("Placeholder replaced with fallback id {}", id.value));
        }

        debug!(
            case = %case.name,
            method = %case.method,
            path = %outcome.endpoint,
            status = ?outcome.http_status,
            result = %outcome.status,
            "case finished"
        );
        outcome
    }

    /// Substitute path parameters, resolving placeholders to real ids
    ///
    /// Returns the concrete path and, if used, the fallback id.
    async fn resolve_path(&self, case: &EndpointCase) -> Result<(String, Option<ResolvedId>), HarnessError> {
        let mut path = case.path.clone();
        let mut resolved: Option<ResolvedId> = None;

        for (key, value) in &case.path_params {
            let concrete = if is_placeholder(value) {
                let id = match &resolved {
                    Some(id) => id.clone(),
                    None => {
                        let id = self.resolver.resolve_id(&case.service).await?;
                        resolved = Some(id.clone());
                        id
                    }
                };
                id.value
            } else {
                value.clone()
            };
            path = path.replace(&format!("{{{key}}}"), &concrete);
        }

        let fallback = resolved.filter(ResolvedId::is_fallback);
        if let Some(id) = &fallback {
            warn!(case = %case.name, service = %case.service, id = %id.value, "running with fallback id");
        }
        Ok((path, fallback))
    }
}

fn mocked(case: &EndpointCase) -> RequestOutcome {
    let mut outcome = RequestOutcome::for_case(case, OutcomeStatus::Skipped);
    outcome.http_status = Some(MOCK_STATUS);
    outcome.request_body = case.request_body_text();
    outcome.response_body = Some(json!({"message": "Destructive operation mocked for safety"}).to_string());
    outcome.safety_note = Some(MOCK_NOTE.to_string());
    debug!(case = %case.name, "mocked destructive case");
    outcome
}

fn skipped(case: &EndpointCase) -> RequestOutcome {
    let mut outcome = RequestOutcome::for_case(case, OutcomeStatus::Skipped);
    outcome.safety_note = Some(SKIP_NOTE.to_string());
    debug!(case = %case.name, "skipped destructive case");
    outcome
}

fn runner_exception(case: &EndpointCase, message: &str) -> RequestOutcome {
    warn!(case = %case.name, error = %message, "runner exception");
    let mut outcome = RequestOutcome::for_case(case, OutcomeStatus::Fail);
    outcome.error_message = Some(HarnessError::Runner(message.to_string()).to_string());
    outcome
}

/// Human-readable failure text
///
/// Transport failures use the transport error; a status mismatch reads
/// `HTTP <code> <reason>`; anything else lists the failing expectations.
#[must_use]
pub fn failure_message(response: &ApiResponse, failed: &[&str]) -> String {
    if let Some(err) = &response.transport_error {
        return err.to_string();
    }
    if let (Some(code), true) = (response.status_code, failed.contains(&names::STATUS_CODE)) {
        let reason = reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        return format!("HTTP {code} {reason}");
    }
    format!("Validation failed: {}", failed.join(", "))
}

fn store(slots: &mut [Option<RequestOutcome>], joined: Result<(usize, RequestOutcome), JoinError>) {
    match joined {
        Ok((index, outcome)) => slots[index] = Some(outcome),
        Err(e) => warn!(error = %e, "case task did not complete"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

fn count(outcomes: &[RequestOutcome], status: OutcomeStatus) -> usize {
    outcomes.iter().filter(|o| o.status == status).count()
}
