//! Aggregate view over a triaged issue list

use super::{Issue, Severity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Coarse failure pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorPattern {
    /// HTTP 404
    #[serde(rename = "404 Not Found")]
    NotFound,
    /// HTTP 5xx
    #[serde(rename = "500 Server Error")]
    ServerError,
    /// Timed out
    Timeout,
    /// Connection failed
    #[serde(rename = "Connection Error")]
    Connection,
    /// 401/403 or an authentication message
    Authentication,
    /// Anything else
    Other,
}

impl ErrorPattern {
    /// Classify an issue's failure
    #[must_use]
    pub fn of(http_status: Option<u16>, error: &str) -> Self {
        let error = error.to_ascii_lowercase();
        match http_status {
            Some(404) => Self::NotFound,
            Some(code) if code >= 500 => Self::ServerError,
            Some(401 | 403) => Self::Authentication,
            _ if error.contains("timeout") => Self::Timeout,
            _ if error.contains("connection") => Self::Connection,
            _ if error.contains("authentication") => Self::Authentication,
            _ => Self::Other,
        }
    }

    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotFound => "404 Not Found",
            Self::ServerError => "500 Server Error",
            Self::Timeout => "Timeout",
            Self::Connection => "Connection Error",
            Self::Authentication => "Authentication",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ErrorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pattern with its number of issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    /// Pattern
    pub pattern: ErrorPattern,
    /// Issues matching it
    pub count: usize,
}

/// Totals over an issue list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    /// All issues
    pub total: usize,
    /// Critical issues
    pub critical: usize,
    /// High issues
    pub high: usize,
    /// Medium issues
    pub medium: usize,
    /// Low issues
    pub low: usize,
    /// Issues per service
    pub by_service: BTreeMap<String, usize>,
    /// Pattern distribution, most frequent first
    pub error_patterns: Vec<PatternCount>,
}

impl TriageSummary {
    /// Summarize issues
    #[must_use]
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Self {
            total: issues.len(),
            ..Self::default()
        };
        let mut patterns: BTreeMap<ErrorPattern, usize> = BTreeMap::new();

        for issue in issues {
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            *summary.by_service.entry(issue.service.clone()).or_default() += 1;
            *patterns
                .entry(ErrorPattern::of(issue.http_status, &issue.error_message))
                .or_default() += 1;
        }

        summary.error_patterns = patterns
            .into_iter()
            .map(|(pattern, count)| PatternCount { pattern, count })
            .collect();
        // stable: equal counts keep declaration order
        summary.error_patterns.sort_by(|a, b| b.count.cmp(&a.count));
        summary
    }

    /// Check if any issue is critical
    #[inline]
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.critical > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::TriageEngine;
    use crate::types::{EndpointCase, HttpMethod, OutcomeStatus, RequestOutcome};
    use chrono::NaiveDate;

    fn fail(service: &str, status: Option<u16>, error: &str) -> RequestOutcome {
        let case = EndpointCase::new("x", service, HttpMethod::Get, format!("/api/{service}"));
        let mut outcome = RequestOutcome::for_case(&case, OutcomeStatus::Fail);
        outcome.http_status = status;
        outcome.error_message = Some(error.to_string());
        outcome
    }

    #[test]
    fn pattern_classification() {
        assert_eq!(ErrorPattern::of(Some(404), "timeout"), ErrorPattern::NotFound);
        assert_eq!(ErrorPattern::of(Some(503), ""), ErrorPattern::ServerError);
        assert_eq!(ErrorPattern::of(Some(401), ""), ErrorPattern::Authentication);
        assert_eq!(ErrorPattern::of(None, "timeout after 10ms"), ErrorPattern::Timeout);
        assert_eq!(ErrorPattern::of(None, "connection failed: refused"), ErrorPattern::Connection);
        assert_eq!(ErrorPattern::of(Some(200), "Validation failed: json_format"), ErrorPattern::Other);
    }

    #[test]
    fn summary_counts() {
        let outcomes = vec![
            fail("sonarr", Some(404), "Not Found"),
            fail("sonarr", Some(500), "boom"),
            fail("radarr", Some(404), "Not Found"),
            fail("radarr", None, "connection failed: refused"),
        ];
        let issues = TriageEngine::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).triage(&outcomes);
        let summary = TriageSummary::from_issues(&issues);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 3);
        assert_eq!(summary.by_service.get("sonarr"), Some(&2));
        assert_eq!(
            summary.error_patterns[0],
            PatternCount {
                pattern: ErrorPattern::NotFound,
                count: 2
            }
        );
        assert!(summary.has_critical());
    }

    #[test]
    fn pattern_serializes_with_label() {
        let json = serde_json::to_string(&ErrorPattern::ServerError).unwrap();
        assert_eq!(json, "\"500 Server Error\"");
    }
}
