//! JSON report files
//!
//! Two files per run, stamped with the run's start time:
//! `<out>/json/test_report_<ts>.json` holds every outcome and
//! `<out>/analysis/issue_analysis_<ts>.json` holds the triaged issues.

use chrono::{DateTime, Utc};
use gatecheck_core::error::HarnessError;
use gatecheck_core::report::{Reporter, RunReport, RunSummary};
use gatecheck_core::triage::{Issue, TriageSummary};
use gatecheck_core::types::RequestOutcome;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestamp format used in file names
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Serialize)]
struct TestReportFile<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    base_url: &'a str,
    catalog_source: &'a str,
    fallback_services: &'a [String],
    safe_mode: bool,
    summary: RunSummary,
    results: &'a [RequestOutcome],
}

#[derive(Serialize)]
struct IssueAnalysisFile<'a> {
    run_id: &'a str,
    generated_at: DateTime<Utc>,
    summary: &'a TriageSummary,
    issues: &'a [Issue],
}

/// Paths written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReports {
    /// Outcome report
    pub test_report: PathBuf,
    /// Issue analysis
    pub issue_analysis: PathBuf,
}

/// Writes the run as pretty-printed JSON under an output directory
#[derive(Debug, Clone)]
pub struct JsonReporter {
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create reporter
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write both files
    ///
    /// # Errors
    /// Returns `HarnessError::Report` on serialization or I/O failure
    pub fn write(&self, report: &RunReport) -> Result<WrittenReports, HarnessError> {
        let stamp = report.started_at.format(STAMP_FORMAT).to_string();
        let test_report = self.output_dir.join("json").join(format!("test_report_{stamp}.json"));
        let issue_analysis = self
            .output_dir
            .join("analysis")
            .join(format!("issue_analysis_{stamp}.json"));

        write_json(
            &test_report,
            &TestReportFile {
                run_id: &report.run_id,
                started_at: report.started_at,
                base_url: &report.base_url,
                catalog_source: &report.catalog_source,
                fallback_services: &report.fallback_services,
                safe_mode: report.safe_mode,
                summary: report.summary,
                results: &report.outcomes,
            },
        )?;
        write_json(
            &issue_analysis,
            &IssueAnalysisFile {
                run_id: &report.run_id,
                generated_at: Utc::now(),
                summary: &report.triage,
                issues: &report.issues,
            },
        )?;

        info!(
            test_report = %test_report.display(),
            issue_analysis = %issue_analysis.display(),
            "reports written"
        );
        Ok(WrittenReports {
            test_report,
            issue_analysis,
        })
    }
}

impl Reporter for JsonReporter {
    fn render(&self, report: &RunReport) -> Result<(), HarnessError> {
        self.write(report).map(|_| ())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| HarnessError::Report(format!("{}: {e}", parent.display())))?;
    }
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| HarnessError::Report(format!("{}: {e}", path.display())))?;
    fs::write(path, text).map_err(|e| HarnessError::Report(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use gatecheck_core::triage::TriageEngine;
    use gatecheck_test_utils::{failed_outcome, passed_outcome};
    use serde_json::Value;

    #[test]
    fn writes_both_files_with_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            passed_outcome("radarr", "/api/radarr/movies"),
            failed_outcome("radarr", "/api/radarr/history", None, "connection failed: refused"),
        ];
        let issues = TriageEngine::new(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()).triage(&outcomes);
        let started = Utc.with_ymd_and_hms(2025, 2, 3, 9, 30, 15).unwrap();
        let report = RunReport::new("01RUN", started, "http://localhost:3000", outcomes, issues);

        let written = JsonReporter::new(dir.path()).write(&report).unwrap();

        assert_eq!(
            written.test_report,
            dir.path().join("json").join("test_report_20250203_093015.json")
        );
        let results: Value = serde_json::from_str(&fs::read_to_string(&written.test_report).unwrap()).unwrap();
        assert_eq!(results["summary"]["failed"], 1);
        assert_eq!(results["results"][1]["http_status"], Value::Null);

        let analysis: Value = serde_json::from_str(&fs::read_to_string(&written.issue_analysis).unwrap()).unwrap();
        assert_eq!(analysis["issues"][0]["id"], "ISSUE-001");
        assert_eq!(analysis["issues"][0]["severity"], "High");
        assert_eq!(analysis["summary"]["total"], 1);
    }

    #[test]
    fn unwritable_directory_is_a_report_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let report = RunReport::new("r", Utc::now(), "http://x", vec![], vec![]);

        let err = JsonReporter::new(file.path()).write(&report).unwrap_err();

        assert!(matches!(err, HarnessError::Report(_)));
    }
}
