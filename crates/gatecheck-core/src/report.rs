//! Run report handed to reporters
//!
//! Reporters receive the finished outcome and issue lists and never call
//! back into the harness.

use crate::error::HarnessError;
use crate::triage::{Issue, TriageSummary};
use crate::types::{OutcomeStatus, RequestOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// All outcomes
    pub total: usize,
    /// PASS
    pub passed: usize,
    /// FAIL
    pub failed: usize,
    /// SKIPPED
    pub skipped: usize,
}

impl RunSummary {
    /// Count outcomes
    #[must_use]
    pub fn from_outcomes(outcomes: &[RequestOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total: outcomes.len(),
                ..Self::default()
            },
            |mut acc, o| {
                match o.status {
                    OutcomeStatus::Pass => acc.passed += 1,
                    OutcomeStatus::Fail => acc.failed += 1,
                    OutcomeStatus::Skipped => acc.skipped += 1,
                }
                acc
            },
        )
    }

    /// Check if nothing failed
    #[inline]
    #[must_use]
    pub fn is_green(&self) -> bool {
        self.failed == 0
    }
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Target base URL
    pub base_url: String,
    /// Catalog source label
    pub catalog_source: String,
    /// Services that fell back to essential defaults
    pub fallback_services: Vec<String>,
    /// Safe mode flag
    pub safe_mode: bool,
    /// Outcome counts
    pub summary: RunSummary,
    /// Outcomes in catalog order
    pub outcomes: Vec<RequestOutcome>,
    /// Issues, highest priority first
    pub issues: Vec<Issue>,
    /// Issue totals
    pub triage: TriageSummary,
}

impl RunReport {
    /// Assemble a report; counts and totals are derived
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        started_at: DateTime<Utc>,
        base_url: impl Into<String>,
        outcomes: Vec<RequestOutcome>,
        issues: Vec<Issue>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            base_url: base_url.into(),
            catalog_source: String::new(),
            fallback_services: Vec::new(),
            safe_mode: true,
            summary: RunSummary::from_outcomes(&outcomes),
            triage: TriageSummary::from_issues(&issues),
            outcomes,
            issues,
        }
    }

    /// With catalog details
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, source: impl Into<String>, fallback_services: Vec<String>) -> Self {
        self.catalog_source = source.into();
        self.fallback_services = fallback_services;
        self
    }

    /// With safe mode flag
    #[inline]
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }
}

/// Renders a finished run
pub trait Reporter {
    /// Render the report
    ///
    /// # Errors
    /// Returns `HarnessError::Report` on output failure
    fn render(&self, report: &RunReport) -> Result<(), HarnessError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::TriageEngine;
    use crate::types::{EndpointCase, HttpMethod};
    use chrono::NaiveDate;

    #[test]
    fn summary_is_derived() {
        let case = EndpointCase::new("x", "sonarr", HttpMethod::Get, "/api/sonarr/queue");
        let mut fail = RequestOutcome::for_case(&case, OutcomeStatus::Fail);
        fail.http_status = Some(500);
        let outcomes = vec![
            RequestOutcome::for_case(&case, OutcomeStatus::Pass),
            RequestOutcome::for_case(&case, OutcomeStatus::Skipped),
            fail,
        ];
        let issues = TriageEngine::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).triage(&outcomes);

        let report = RunReport::new("run-1", Utc::now(), "http://localhost:3000", outcomes, issues)
            .with_catalog("default", vec![]);

        assert_eq!(
            report.summary,
            RunSummary {
                total: 3,
                passed: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(!report.summary.is_green());
        assert_eq!(report.triage.critical, 1);
        assert_eq!(report.catalog_source, "default");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][2]["status"], "FAIL");
        assert_eq!(json["issues"][0]["severity"], "Critical");
    }
}
