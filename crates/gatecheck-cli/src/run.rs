//! One complete invocation: config, target check, sweep, reports

use crate::args::CliArgs;
use crate::logging;
use crate::reporters::{ConsoleReporter, JsonReporter};
use crate::server::{self, DevServer};
use anyhow::Context;
use chrono::Utc;
use gatecheck_core::catalog::{CatalogResolver, HttpDescriptionFetcher};
use gatecheck_core::client::{HttpClient, RequestSender};
use gatecheck_core::config::HarnessConfig;
use gatecheck_core::error::HarnessError;
use gatecheck_core::executor::SafetyGatedExecutor;
use gatecheck_core::identifiers::HttpIdentifierResolver;
use gatecheck_core::lifecycle::HttpServerProbe;
use gatecheck_core::report::{Reporter, RunReport};
use gatecheck_core::services::ServiceRegistry;
use gatecheck_core::triage::TriageEngine;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every dispatched case passed
    Green,
    /// At least one FAIL
    Failures,
    /// Setup failed before any case ran
    Fatal,
    /// Target down and could not be started
    Unreachable,
}

impl RunStatus {
    /// Numeric exit code
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Failures => 1,
            Self::Fatal => 2,
            Self::Unreachable => 3,
        }
    }

    /// Status for a finished report
    #[must_use]
    pub fn of(report: &RunReport) -> Self {
        if report.summary.is_green() {
            Self::Green
        } else {
            Self::Failures
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Resolve the catalog, execute it and triage the failures
///
/// # Errors
/// Returns a fatal `HarnessError` if the client cannot be built or the
/// catalog cannot be resolved; per-case problems live in the report.
pub async fn sweep(config: &HarnessConfig) -> Result<RunReport, HarnessError> {
    let started_at = Utc::now();
    let run_id = ulid::Ulid::new().to_string();
    let registry = ServiceRegistry::builtin();
    let sender: Arc<dyn RequestSender> = Arc::new(HttpClient::new(&config.base_url, config.timeout())?);

    let source = config.catalog.source();
    let catalog = CatalogResolver::new(registry.clone())
        .with_fetcher(Arc::new(HttpDescriptionFetcher::new(Arc::clone(&sender))))
        .resolve(&source)
        .await?;

    let resolver = HttpIdentifierResolver::new(Arc::clone(&sender), registry.clone())
        .with_selection(config.id_selection, config.id_sample_limit);
    let outcomes = SafetyGatedExecutor::new(sender, Arc::new(resolver))
        .with_config(config.executor())
        .run_all(&catalog.cases, config.concurrency)
        .await;

    let issues = TriageEngine::new(started_at.date_naive())
        .with_registry(registry)
        .with_options(config.triage())
        .triage(&outcomes);

    info!(%run_id, outcomes = outcomes.len(), issues = issues.len(), "sweep complete");
    Ok(RunReport::new(run_id, started_at, &config.base_url, outcomes, issues)
        .with_catalog(catalog.source, catalog.fallback_services)
        .with_safe_mode(config.safe_mode))
}

/// Render through every reporter, stopping at the first failure
fn render_all(report: &RunReport, reporters: &[&dyn Reporter]) -> anyhow::Result<()> {
    for reporter in reporters {
        reporter.render(report).context("rendering report")?;
    }
    Ok(())
}

/// Run the CLI with parsed arguments
pub async fn run(args: CliArgs) -> RunStatus {
    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("gatecheck: {e}");
            return RunStatus::Fatal;
        }
    };
    logging::init(args.log_level.as_deref(), config.log_format);

    let probe = match HttpServerProbe::new() {
        Ok(probe) => probe,
        Err(e) => {
            error!(error = %e, "cannot build reachability probe");
            return RunStatus::Fatal;
        }
    };
    let dev_server: Option<DevServer> = match server::ensure_running(&probe, &config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "target unavailable");
            return RunStatus::Unreachable;
        }
    };

    let status = match sweep(&config).await {
        Ok(report) => {
            let console = ConsoleReporter::new();
            let json = JsonReporter::new(&config.output_dir);
            let reporters: [&dyn Reporter; 2] = [&console, &json];
            if let Err(e) = render_all(&report, &reporters) {
                error!("report output failed: {e:#}");
            }
            RunStatus::of(&report)
        }
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "run aborted");
            RunStatus::Fatal
        }
    };

    if let Some(server) = dev_server {
        server.stop().await;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatecheck_test_utils::{failed_outcome, passed_outcome};

    #[test]
    fn exit_codes() {
        assert_eq!(RunStatus::Green.code(), 0);
        assert_eq!(RunStatus::Failures.code(), 1);
        assert_eq!(RunStatus::Fatal.code(), 2);
        assert_eq!(RunStatus::Unreachable.code(), 3);
    }

    #[test]
    fn only_failures_turn_a_run_red() {
        let green = RunReport::new("r", Utc::now(), "http://x", vec![passed_outcome("sonarr", "/api/sonarr")], vec![]);
        assert_eq!(RunStatus::of(&green), RunStatus::Green);

        let red = RunReport::new(
            "r",
            Utc::now(),
            "http://x",
            vec![failed_outcome("sonarr", "/api/sonarr", Some(404), "HTTP 404 Not Found")],
            vec![],
        );
        assert_eq!(RunStatus::of(&red), RunStatus::Failures);
    }

    #[tokio::test]
    async fn bad_config_file_is_fatal() {
        let args = CliArgs {
            config: Some("/missing/gatecheck.toml".into()),
            ..CliArgs::default()
        };
        assert_eq!(run(args).await, RunStatus::Fatal);
    }

    #[tokio::test]
    async fn unreachable_target_without_auto_start() {
        let args = CliArgs {
            base_url: Some("http://127.0.0.1:9".to_string()),
            no_auto_start: true,
            log_level: Some("error".to_string()),
            ..CliArgs::default()
        };
        assert_eq!(run(args).await, RunStatus::Unreachable);
    }
}
