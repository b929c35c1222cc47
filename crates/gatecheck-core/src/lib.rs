//! gatecheck core - endpoint test orchestration and issue triage
//!
//! Validates the HTTP surface of a multi-service API gateway:
//! - Resolves an endpoint catalog (explicit file, API discovery or built-in defaults)
//! - Classifies destructive operations and gates them under safe mode
//! - Runs the catalog concurrently and validates every response
//! - Turns failures into a prioritized, assigned and dated issue list
//!
//! # Example
//!
//! ```rust,ignore
//! use gatecheck_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::default();
//! let client: Arc<dyn RequestSender> = Arc::new(HttpClient::new(&config.base_url, config.timeout())?);
//! let registry = ServiceRegistry::builtin();
//!
//! let catalog = CatalogResolver::new(registry.clone())
//!     .resolve(&CatalogSource::Default)
//!     .await?;
//! let resolver = Arc::new(HttpIdentifierResolver::new(client.clone(), registry));
//! let outcomes = SafetyGatedExecutor::new(client, resolver)
//!     .with_config(config.executor())
//!     .run_all(&catalog.cases, config.concurrency)
//!     .await;
//!
//! let issues = TriageEngine::new(chrono::Utc::now().date_naive()).triage(&outcomes);
//! println!("{} issues", issues.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod identifiers;
pub mod lifecycle;
pub mod report;
pub mod services;
pub mod triage;
pub mod types;
pub mod validator;

pub use catalog::{Catalog, CatalogResolver, CatalogSource, DescriptionFetcher, HttpDescriptionFetcher};
pub use client::{ApiRequest, ApiResponse, HttpClient, RequestSender};
pub use config::{CatalogSelection, HarnessConfig, LogFormat};
pub use error::{CatalogError, ConfigError, HarnessError, TransportError};
pub use executor::{ExecutorConfig, SafetyGatedExecutor};
pub use identifiers::{HttpIdentifierResolver, IdCache, IdSelection, IdSource, IdentifierResolver, ResolvedId};
pub use lifecycle::{HttpServerProbe, ServerProbe};
pub use report::{Reporter, RunReport, RunSummary};
pub use services::{ServiceProfile, ServiceRegistry};
pub use triage::{Issue, Priority, Severity, TriageEngine, TriageOptions, TriageSummary};
pub use types::{EndpointCase, HttpMethod, OutcomeStatus, RequestOutcome, SafetyMode};
pub use validator::{Expectation, ExpectationSet, ResponseValidator};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running gatecheck
    pub use crate::{
        CatalogResolver, CatalogSource, EndpointCase, HarnessConfig, HttpClient,
        HttpIdentifierResolver, Issue, OutcomeStatus, RequestOutcome, RequestSender,
        SafetyGatedExecutor, ServiceRegistry, TriageEngine,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
