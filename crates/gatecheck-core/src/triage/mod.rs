//! Issue triage
//!
//! Converts FAIL outcomes into scored, assigned and dated issues. Every
//! function here is pure: the only outside inputs are the date and service
//! registry the engine is built with, so triaging the same outcomes twice
//! yields the same issues.

pub mod rules;
pub mod summary;

pub use summary::{ErrorPattern, PatternCount, TriageSummary};

use crate::services::ServiceRegistry;
use crate::types::{HttpMethod, RequestOutcome};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Issue kind recorded for failing endpoints
pub const FAILING_ENDPOINT: &str = "Failing Endpoint";

/// Issue severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl Severity {
    /// Base priority score
    #[inline]
    #[must_use]
    pub fn base_score(self) -> u32 {
        match self {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Low => 25,
        }
    }

    /// Base effort in hours
    #[inline]
    #[must_use]
    pub fn base_effort_hours(self) -> f64 {
        match self {
            Severity::Critical => 8.0,
            Severity::High => 4.0,
            Severity::Medium => 2.0,
            Severity::Low => 1.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Priority band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Score >= 80
    P0,
    /// Score >= 60
    P1,
    /// Score >= 40
    P2,
    /// Anything lower
    P3,
}

impl Priority {
    /// Days allowed before the issue is due
    #[inline]
    #[must_use]
    pub fn turnaround_days(self) -> u64 {
        match self {
            Priority::P0 => 1,
            Priority::P1 => 3,
            Priority::P2 => 7,
            Priority::P3 => 14,
        }
    }

    /// Long label, e.g. `P0 - Critical`
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Priority::P0 => "P0 - Critical",
            Priority::P1 => "P1 - High",
            Priority::P2 => "P2 - Medium",
            Priority::P3 => "P3 - Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A prioritized work item derived from one failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// `ISSUE-001`, ... in failure order
    pub id: String,
    /// Issue kind
    pub kind: String,
    /// Service key
    pub service: String,
    /// Resolved endpoint path
    pub endpoint: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Severity
    pub severity: Severity,
    /// Human summary
    pub description: String,
    /// Failure text from the outcome
    pub error_message: String,
    /// HTTP status, if any
    pub http_status: Option<u16>,
    /// Likely source file
    pub file_location: String,
    /// Likely handler
    pub code_location: String,
    /// Advisory fix
    pub suggested_fix: String,
    /// Score in `0..=100`
    pub priority_score: u8,
    /// Band of the score
    pub priority: Priority,
    /// Suggested owner
    pub assignee: String,
    /// Estimated hours
    pub estimated_effort_hours: f64,
    /// Due date
    pub due_date: NaiveDate,
    /// Failure ran against a fallback id
    pub id_fallback: bool,
}

/// Triage policy switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageOptions {
    /// Drop failures that ran against a fallback id
    pub exclude_fallback_id_failures: bool,
}

/// Turns outcomes into an ordered issue list
#[derive(Debug, Clone)]
pub struct TriageEngine {
    today: NaiveDate,
    options: TriageOptions,
    registry: ServiceRegistry,
}

impl TriageEngine {
    /// Create engine dating issues from `today`
    #[inline]
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            options: TriageOptions::default(),
            registry: ServiceRegistry::builtin(),
        }
    }

    /// With the registry supplying source module hints
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: ServiceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: TriageOptions) -> Self {
        self.options = options;
        self
    }

    /// Issues for every FAIL outcome, highest score first
    ///
    /// Ids follow failure order; ties keep that order.
    #[must_use]
    pub fn triage(&self, outcomes: &[RequestOutcome]) -> Vec<Issue> {
        let mut issues: Vec<Issue> = outcomes
            .iter()
            .filter(|o| o.is_failure())
            .filter(|o| !(self.options.exclude_fallback_id_failures && o.id_fallback))
            .enumerate()
            .map(|(i, o)| self.issue_for(o, i + 1))
            .collect();

        issues.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
        debug!(issues = issues.len(), "triage complete");
        issues
    }

    /// Build the issue for one failing outcome
    #[must_use]
    pub fn issue_for(&self, outcome: &RequestOutcome, sequence: usize) -> Issue {
        let error = outcome.error_message.clone().unwrap_or_default();
        let severity = rules::severity(outcome.http_status, &error);
        let priority_score = rules::priority_score(&outcome.endpoint, severity, &error);
        let priority = rules::priority_band(priority_score);
        let file_location = rules::file_location(self.registry.source_dir(&outcome.service), &outcome.endpoint);

        Issue {
            id: format!("ISSUE-{sequence:03}"),
            kind: FAILING_ENDPOINT.to_string(),
            service: outcome.service.clone(),
            endpoint: outcome.endpoint.clone(),
            method: outcome.method,
            severity,
            description: format!("Endpoint {} failed with {} method", outcome.endpoint, outcome.method),
            suggested_fix: rules::suggested_fix(outcome.http_status, &error, &outcome.service, &file_location),
            code_location: format!("{file_location}:endpoint_handler"),
            file_location,
            priority_score,
            priority,
            assignee: rules::assignee(&outcome.service, severity),
            estimated_effort_hours: rules::effort_hours(severity, &error),
            due_date: rules::due_date(priority, self.today),
            http_status: outcome.http_status,
            error_message: error,
            id_fallback: outcome.id_fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EndpointCase, OutcomeStatus};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn failure(service: &str, endpoint: &str, status: Option<u16>, error: &str) -> RequestOutcome {
        let case = EndpointCase::new(endpoint, service, HttpMethod::Get, endpoint);
        let mut outcome = RequestOutcome::for_case(&case, OutcomeStatus::Fail);
        outcome.http_status = status;
        outcome.error_message = Some(error.to_string());
        outcome
    }

    #[test]
    fn server_error_on_queue_is_p0_due_tomorrow() {
        let outcome = failure("sonarr", "/api/sonarr/queue/123", Some(500), "Internal Server Error");
        let issues = TriageEngine::new(today()).triage(&[outcome]);

        let issue = &issues[0];
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.priority_score, 100);
        assert_eq!(issue.priority, Priority::P0);
        assert_eq!(issue.due_date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(issue.file_location, "app/api/sonarr/queue/route.ts");
        assert_eq!(issue.code_location, "app/api/sonarr/queue/route.ts:endpoint_handler");
    }

    #[test]
    fn connection_refused_is_high_p0() {
        let outcome = failure("radarr", "/api/radarr/movies", None, "connection refused");
        let issue = TriageEngine::new(today()).issue_for(&outcome, 1);

        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.priority_score, 90);
        assert_eq!(issue.priority, Priority::P0);
        assert!((issue.estimated_effort_hours - 6.0).abs() < 1e-9);
    }

    #[test]
    fn not_found_is_high_p1() {
        let outcome = failure("prowlarr", "/api/prowlarr/indexer", Some(404), "Not Found");
        let issue = TriageEngine::new(today()).issue_for(&outcome, 1);

        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.priority_score, 75);
        assert_eq!(issue.priority, Priority::P1);
        assert_eq!(issue.assignee, "Backend Developer");
    }

    #[test]
    fn locations_come_from_registry_module_hints() {
        let engine = TriageEngine::new(today()).with_registry(ServiceRegistry::builtin());

        let sab = engine.issue_for(&failure("sabnzbd", "/api/sabnzbd/history/1", Some(404), "Not Found"), 1);
        assert_eq!(sab.file_location, "app/api/sabnzbd/history/route.ts");
        assert_eq!(
            sab.suggested_fix,
            "Check if endpoint exists and is properly routed in app/api/sabnzbd/history/route.ts"
        );

        let books = engine.issue_for(&failure("readarr_audiobooks", "/api/readarr-audiobooks/book", Some(500), "x"), 1);
        assert_eq!(books.file_location, rules::UNKNOWN_LOCATION);
        assert_eq!(books.code_location, "Unknown location:endpoint_handler");
    }

    #[test]
    fn only_failures_become_issues() {
        let case = EndpointCase::new("ok", "sonarr", HttpMethod::Get, "/api/sonarr");
        let pass = RequestOutcome::for_case(&case, OutcomeStatus::Pass);
        let skip = RequestOutcome::for_case(&case, OutcomeStatus::Skipped);
        let fail = failure("sonarr", "/api/sonarr", Some(502), "Bad Gateway");

        let issues = TriageEngine::new(today()).triage(&[pass, skip, fail]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "ISSUE-001");
    }

    #[test]
    fn ids_follow_failure_order_and_sort_is_stable() {
        let outcomes = vec![
            failure("radarr", "/api/radarr/a", Some(404), "Not Found"),
            failure("radarr", "/api/radarr/b", Some(500), "boom"),
            failure("radarr", "/api/radarr/c", Some(404), "Not Found"),
        ];
        let issues = TriageEngine::new(today()).triage(&outcomes);
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ISSUE-002", "ISSUE-001", "ISSUE-003"]);
    }

    #[test]
    fn fallback_failures_can_be_excluded() {
        let mut masked = failure("sonarr", "/api/sonarr/series/test_series_123", Some(404), "Not Found");
        masked.id_fallback = true;
        let real = failure("sonarr", "/api/sonarr/series", Some(500), "boom");
        let outcomes = vec![masked, real];

        let all = TriageEngine::new(today()).triage(&outcomes);
        assert_eq!(all.len(), 2);

        let filtered = TriageEngine::new(today())
            .with_options(TriageOptions {
                exclude_fallback_id_failures: true,
            })
            .triage(&outcomes);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "ISSUE-001");
        assert!(!filtered[0].id_fallback);
    }

    #[test]
    fn priority_labels() {
        assert_eq!(Priority::P2.label(), "P2 - Medium");
        assert_eq!(Priority::P0.to_string(), "P0");
        assert_eq!(Severity::Critical.to_string(), "Critical");
    }

    fn arb_outcome() -> impl Strategy<Value = RequestOutcome> {
        (
            prop::sample::select(vec!["sonarr", "radarr", "sabnzbd", "lidarr"]),
            prop::sample::select(vec!["/api/x/queue", "/api/x/series", "/api/x/history", "/api/x/other"]),
            prop::option::of(400u16..600),
            prop::sample::select(vec!["timeout", "connection refused", "Not Found", ""]),
        )
            .prop_map(|(svc, path, status, err)| failure(svc, path, status, err))
    }

    proptest! {
        #[test]
        fn triage_is_idempotent(outcomes in prop::collection::vec(arb_outcome(), 0..20)) {
            let engine = TriageEngine::new(today());
            prop_assert_eq!(engine.triage(&outcomes), engine.triage(&outcomes));
        }

        #[test]
        fn issues_sorted_by_score(outcomes in prop::collection::vec(arb_outcome(), 0..20)) {
            let issues = TriageEngine::new(today()).triage(&outcomes);
            prop_assert!(issues.windows(2).all(|w| w[0].priority_score >= w[1].priority_score));
            prop_assert!(issues.iter().all(|i| i.priority_score <= 100));
        }

        #[test]
        fn raising_404_to_500_never_lowers_severity(
            outcome in arb_outcome(),
        ) {
            let engine = TriageEngine::new(today());
            let mut client = outcome.clone();
            client.http_status = Some(404);
            let mut server = outcome;
            server.http_status = Some(500);
            prop_assert!(engine.issue_for(&server, 1).severity >= engine.issue_for(&client, 1).severity);
        }
    }
}
