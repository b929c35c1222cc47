//! Full run: explicit catalog, live ids, safety gate and triage

use chrono::NaiveDate;
use gatecheck_core::catalog::{CatalogResolver, CatalogSource};
use gatecheck_core::client::{HttpClient, RequestSender};
use gatecheck_core::executor::{SafetyGatedExecutor, MOCK_NOTE};
use gatecheck_core::identifiers::{HttpIdentifierResolver, IdentifierResolver};
use gatecheck_core::report::RunReport;
use gatecheck_core::services::ServiceRegistry;
use gatecheck_core::triage::{Priority, Severity, TriageEngine};
use gatecheck_core::types::OutcomeStatus;
use gatecheck_core::CatalogError;
use gatecheck_test_utils::{ScriptedSender, StaticResolver};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG: &str = r#"{
  "sonarr": {
    "endpoints": [
      {"name": "List Series", "path": "/api/sonarr/series"},
      {"name": "Get Series", "path": "/api/sonarr/series/{id}", "path_params": {"id": "test_series_123"}},
      {"name": "Delete Series", "path": "/api/sonarr/series/{id}", "method": "DELETE",
       "path_params": {"id": "test_series_123"}},
      {"name": "Queue", "path": "/api/sonarr/queue"}
    ]
  },
  "radarr": {
    "endpoints": [
      {"name": "Status", "path": "/api/radarr/system/status", "safe_mode": "skip", "destructive": true}
    ]
  }
}"#;

fn catalog_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();
    file
}

async fn gateway() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sonarr/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "title": "Show"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sonarr/series/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/sonarr/series/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sonarr/queue"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn explicit_catalog_run_produces_ordered_outcomes_and_issues() {
    let server = gateway().await;
    let file = catalog_file();
    let registry = ServiceRegistry::builtin();

    let catalog = CatalogResolver::new(registry.clone())
        .resolve(&CatalogSource::Explicit(file.path().to_path_buf()))
        .await
        .unwrap();
    assert_eq!(catalog.len(), 5);

    let sender: Arc<dyn RequestSender> =
        Arc::new(HttpClient::new(server.uri(), Duration::from_secs(5)).unwrap());
    let resolver: Arc<dyn IdentifierResolver> = Arc::new(HttpIdentifierResolver::new(sender.clone(), registry));
    let outcomes = SafetyGatedExecutor::new(sender, resolver)
        .run_all(&catalog.cases, 3)
        .await;

    let statuses: Vec<_> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Pass,
            OutcomeStatus::Pass,
            OutcomeStatus::Skipped,
            OutcomeStatus::Fail,
            OutcomeStatus::Skipped,
        ]
    );
    assert_eq!(outcomes[1].endpoint, "/api/sonarr/series/7");
    assert!(!outcomes[1].id_fallback);
    assert_eq!(outcomes[2].safety_note.as_deref(), Some(MOCK_NOTE));
    assert_eq!(outcomes[3].error_message.as_deref(), Some("HTTP 500 Internal Server Error"));
    assert_eq!(outcomes[4].http_status, None);

    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let issues = TriageEngine::new(today).triage(&outcomes);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "ISSUE-001");
    assert_eq!(issues[0].severity, Severity::Critical);
    assert_eq!(issues[0].priority, Priority::P0);
    assert_eq!(issues[0].due_date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());

    let report = RunReport::new("run", chrono::Utc::now(), server.uri(), outcomes, issues)
        .with_catalog(catalog.source, catalog.fallback_services);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.skipped, 2);
}

#[tokio::test]
async fn unreadable_explicit_catalog_is_fatal() {
    let err = CatalogResolver::new(ServiceRegistry::builtin())
        .resolve(&CatalogSource::Explicit("/does/not/exist.json".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Unreadable { .. }));
}

#[tokio::test]
async fn default_catalog_with_fallback_ids_never_touches_destructive_routes() {
    let sender = Arc::new(ScriptedSender::new());
    let catalog = CatalogResolver::new(ServiceRegistry::builtin())
        .resolve(&CatalogSource::Default)
        .await
        .unwrap();

    let outcomes = SafetyGatedExecutor::new(sender.clone(), Arc::new(StaticResolver::fallback("test_series_123")))
        .run_all(&catalog.cases, 8)
        .await;

    assert_eq!(outcomes.len(), catalog.len());
    for (case, outcome) in catalog.cases.iter().zip(&outcomes) {
        assert_eq!(case.name, outcome.test_name);
        if case.destructive {
            assert_eq!(outcome.status, OutcomeStatus::Skipped);
        } else {
            // unscripted routes answer 404
            assert_eq!(outcome.status, OutcomeStatus::Fail);
        }
    }
    let destructive_paths: Vec<_> = catalog
        .cases
        .iter()
        .filter(|c| c.destructive)
        .map(|c| (c.method, c.path.clone()))
        .collect();
    for request in sender.calls() {
        assert!(!destructive_paths.contains(&(request.method, request.path.clone())));
    }
}
