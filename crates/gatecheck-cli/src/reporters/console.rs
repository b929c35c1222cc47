//! Plain-text run summary on stdout

use gatecheck_core::error::HarnessError;
use gatecheck_core::report::{Reporter, RunReport};
use gatecheck_core::types::OutcomeStatus;
use std::fmt::Write as _;
use std::io::Write as _;

/// Issues listed in the console summary
pub const TOP_ISSUES: usize = 5;

/// Writes one line per case, the totals and the top issues
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet_passes: bool,
}

impl ConsoleReporter {
    /// Create reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit PASS lines
    #[inline]
    #[must_use]
    pub fn quiet_passes(mut self, quiet: bool) -> Self {
        self.quiet_passes = quiet;
        self
    }

    /// Render to a string
    #[must_use]
    pub fn format(&self, report: &RunReport) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "gatecheck run {} against {} (catalog: {}, safe mode: {})",
            report.run_id,
            report.base_url,
            report.catalog_source,
            if report.safe_mode { "on" } else { "off" }
        );
        if !report.fallback_services.is_empty() {
            let _ = writeln!(
                out,
                "  essential defaults used for: {}",
                report.fallback_services.join(", ")
            );
        }
        out.push('\n');

        for outcome in &report.outcomes {
            if self.quiet_passes && outcome.status == OutcomeStatus::Pass {
                continue;
            }
            let _ = write!(
                out,
                "[{:<7}] {:<7} {} ({}ms)",
                outcome.status.as_str(),
                outcome.method.as_str(),
                outcome.endpoint,
                outcome.elapsed_ms
            );
            if let Some(error) = &outcome.error_message {
                let _ = write!(out, " - {error}");
            }
            if let Some(note) = &outcome.safety_note {
                let _ = write!(out, " [{note}]");
            }
            out.push('\n');
        }

        let s = &report.summary;
        let _ = writeln!(
            out,
            "\n{} cases: {} passed, {} failed, {} skipped",
            s.total, s.passed, s.failed, s.skipped
        );

        let t = &report.triage;
        if t.total > 0 {
            let _ = writeln!(
                out,
                "{} issues: {} critical, {} high, {} medium, {} low",
                t.total, t.critical, t.high, t.medium, t.low
            );
            for issue in report.issues.iter().take(TOP_ISSUES) {
                let _ = writeln!(
                    out,
                    "  {} {} {:>3} {} {} -> {} (due {})",
                    issue.id,
                    issue.priority,
                    issue.priority_score,
                    issue.method,
                    issue.endpoint,
                    issue.assignee,
                    issue.due_date
                );
            }
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    fn render(&self, report: &RunReport) -> Result<(), HarnessError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(self.format(report).as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| HarnessError::Report(format!("stdout: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use gatecheck_core::triage::TriageEngine;
    use gatecheck_test_utils::{failed_outcome, passed_outcome};

    fn report() -> RunReport {
        let outcomes = vec![
            passed_outcome("sonarr", "/api/sonarr/series"),
            failed_outcome("sonarr", "/api/sonarr/queue", Some(500), "HTTP 500 Internal Server Error"),
        ];
        let issues = TriageEngine::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).triage(&outcomes);
        let started = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        RunReport::new("01RUN", started, "http://localhost:3000", outcomes, issues)
            .with_catalog("default", vec!["radarr".to_string()])
    }

    #[test]
    fn lists_cases_totals_and_issues() {
        let text = ConsoleReporter::new().format(&report());

        assert!(text.contains("catalog: default, safe mode: on"));
        assert!(text.contains("essential defaults used for: radarr"));
        assert!(text.contains("[PASS   ] GET     /api/sonarr/series"));
        assert!(text.contains("- HTTP 500 Internal Server Error"));
        assert!(text.contains("2 cases: 1 passed, 1 failed, 0 skipped"));
        assert!(text.contains("1 issues: 1 critical"));
        assert!(text.contains("ISSUE-001 P0 100 GET /api/sonarr/queue"));
    }

    #[test]
    fn quiet_mode_hides_passes() {
        let text = ConsoleReporter::new().quiet_passes(true).format(&report());
        assert!(!text.contains("[PASS"));
        assert!(text.contains("[FAIL"));
    }
}
