//! Endpoint catalog resolution
//!
//! A run's catalog comes from exactly one [`CatalogSource`], chosen once at
//! startup. Every source normalizes into the same [`EndpointCase`] shape.

pub mod classify;
pub mod defaults;
pub mod discovery;
pub mod file;
pub mod normalize;

pub use classify::{classify, is_destructive, DestructiveReason, OperationMeta};
pub use discovery::{DescriptionCache, DescriptionFetcher, HttpDescriptionFetcher};
pub use file::CatalogFile;

use crate::error::CatalogError;
use crate::services::ServiceRegistry;
use crate::types::EndpointCase;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the catalog comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Structured file, JSON or YAML
    Explicit(PathBuf),
    /// API descriptions fetched per service
    Discovered,
    /// Built-in hand-curated catalog
    Default,
}

impl CatalogSource {
    /// Pick the source: a file wins over discovery, discovery over defaults
    #[must_use]
    pub fn select(file: Option<PathBuf>, discover: bool) -> Self {
        match file {
            Some(path) => Self::Explicit(path),
            None if discover => Self::Discovered,
            None => Self::Default,
        }
    }

    /// Short label for logs and reports
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "explicit",
            Self::Discovered => "discovered",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) => write!(f, "explicit ({})", path.display()),
            other => f.write_str(other.label()),
        }
    }
}

/// Resolved, ordered catalog for one run
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    /// Source label
    pub source: &'static str,
    /// Cases in execution order, names unique
    pub cases: Vec<EndpointCase>,
    /// Services whose description was unavailable
    pub fallback_services: Vec<String>,
}

impl Catalog {
    /// Number of cases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Builds the catalog from the selected source
pub struct CatalogResolver {
    registry: ServiceRegistry,
    services: Vec<String>,
    fetcher: Option<Arc<dyn DescriptionFetcher>>,
}

impl CatalogResolver {
    /// Create resolver over the built-in services
    #[must_use]
    pub fn new(registry: ServiceRegistry) -> Self {
        Self {
            registry,
            services: defaults::DEFAULT_SERVICES.iter().map(|s| (*s).to_string()).collect(),
            fetcher: None,
        }
    }

    /// Restrict or extend the discovered/default service list
    #[inline]
    #[must_use]
    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    /// With description fetcher used for discovery
    #[inline]
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn DescriptionFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Resolve the catalog
    ///
    /// # Errors
    /// Returns `CatalogError` if an explicit file cannot be loaded or
    /// the result has no cases. Discovery failures never error.
    pub async fn resolve(&self, source: &CatalogSource) -> Result<Catalog, CatalogError> {
        let (mut cases, fallback_services) = match source {
            CatalogSource::Explicit(path) => (file::load_cases(path)?, Vec::new()),
            CatalogSource::Discovered => self.discover().await,
            CatalogSource::Default => {
                let cases = self
                    .services
                    .iter()
                    .flat_map(|s| defaults::default_cases(s))
                    .collect();
                (cases, Vec::new())
            }
        };

        if cases.is_empty() {
            return Err(CatalogError::Empty);
        }
        dedup_names(&mut cases);

        info!(source = %source, cases = cases.len(), fallbacks = fallback_services.len(), "catalog resolved");
        Ok(Catalog {
            source: source.label(),
            cases,
            fallback_services,
        })
    }

    async fn discover(&self) -> (Vec<EndpointCase>, Vec<String>) {
        let per_service = self.services.iter().map(|service| async move {
            let profile = self.registry.profile(service);
            if !profile.discoverable {
                return (defaults::default_cases(service), false);
            }

            let doc = match &self.fetcher {
                Some(fetcher) => fetcher.fetch(&profile).await,
                None => None,
            };
            let discovered = doc
                .map(|d| discovery::cases_from_description(&profile, &d))
                .unwrap_or_default();

            if discovered.is_empty() {
                warn!(service = %service, "no usable API description, using essential defaults");
                (defaults::essential_cases(service), true)
            } else {
                (discovered, false)
            }
        });

        let mut cases = Vec::new();
        let mut fallbacks = Vec::new();
        for (service, (service_cases, fell_back)) in self
            .services
            .iter()
            .zip(futures::future::join_all(per_service).await)
        {
            if fell_back {
                fallbacks.push(service.clone());
            }
            cases.extend(service_cases);
        }
        (cases, fallbacks)
    }
}

/// Make names unique by suffixing ` #2`, ` #3`, ... to later duplicates
pub fn dedup_names(cases: &mut [EndpointCase]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for case in cases.iter_mut() {
        let count = seen.entry(case.name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let mut n = *count;
            let mut candidate = format!("{} #{n}", case.name);
            while seen.contains_key(&candidate) {
                n += 1;
                candidate = format!("{} #{n}", case.name);
            }
            seen.insert(candidate.clone(), 1);
            case.name = candidate;
        }
    }
}
