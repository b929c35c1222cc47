//! Harness configuration
//!
//! Every field is optional in the TOML file; missing fields take the
//! defaults below. The CLI layers its flags on top of a loaded file.

use crate::catalog::CatalogSource;
use crate::error::ConfigError;
use crate::executor::ExecutorConfig;
use crate::identifiers::IdSelection;
use crate::triage::TriageOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Catalog source selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSelection {
    /// Explicit catalog file; wins over discovery
    pub file: Option<PathBuf>,
    /// Discover endpoints from API descriptions
    pub discover: bool,
}

impl CatalogSelection {
    /// Resolve into a single source
    #[inline]
    #[must_use]
    pub fn source(&self) -> CatalogSource {
        CatalogSource::select(self.file.clone(), self.discover)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Complete harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Target base URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum requests in flight
    pub concurrency: usize,
    /// Gate destructive cases
    pub safe_mode: bool,
    /// Catalog source
    pub catalog: CatalogSelection,
    /// Latency ceiling for default expectations
    pub max_response_ms: u64,
    /// How live ids are picked
    pub id_selection: IdSelection,
    /// Listing items considered for random selection
    pub id_sample_limit: usize,
    /// Drop failures that ran against a fallback id from triage
    pub exclude_fallback_id_failures: bool,
    /// Report directory
    pub output_dir: PathBuf,
    /// Start a dev server when the target is unreachable
    pub auto_start: bool,
    /// Dev server command; `{port}` is replaced by the target port
    pub dev_command: String,
    /// Seconds to wait for a started server
    pub start_timeout_secs: u64,
    /// Log format
    pub log_format: LogFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
            concurrency: 8,
            safe_mode: true,
            catalog: CatalogSelection::default(),
            max_response_ms: 10_000,
            id_selection: IdSelection::First,
            id_sample_limit: 20,
            exclude_fallback_id_failures: false,
            output_dir: PathBuf::from("test_reports"),
            auto_start: true,
            dev_command: "pnpm dev -p {port}".to_string(),
            start_timeout_secs: 90,
            log_format: LogFormat::Pretty,
        }
    }
}

impl HarnessConfig {
    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is unreadable, malformed or invalid
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML text without validating
    ///
    /// # Errors
    /// Returns `ConfigError::Malformed` on parse failure
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Check values are usable
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ConfigError::Invalid(format!("base_url `{url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must use http or https, got `{}`",
                parsed.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if self.id_sample_limit == 0 {
            return Err(ConfigError::Invalid("id_sample_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With per-request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With concurrency
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// With safe mode
    #[inline]
    #[must_use]
    pub fn with_safe_mode(mut self, safe_mode: bool) -> Self {
        self.safe_mode = safe_mode;
        self
    }

    /// With catalog selection
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: CatalogSelection) -> Self {
        self.catalog = catalog;
        self
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Executor settings
    #[must_use]
    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            safe_mode: self.safe_mode,
            max_response_ms: self.max_response_ms,
        }
    }

    /// Triage settings
    #[must_use]
    pub fn triage(&self) -> TriageOptions {
        TriageOptions {
            exclude_fallback_id_failures: self.exclude_fallback_id_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(HarnessConfig::from_toml("").unwrap(), HarnessConfig::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = HarnessConfig::from_toml(
            r#"
base_url = "https://gateway.local"
concurrency = 2
safe_mode = false
id_selection = "random"

[catalog]
discover = true
"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://gateway.local");
        assert_eq!(config.concurrency, 2);
        assert!(!config.safe_mode);
        assert_eq!(config.id_selection, IdSelection::Random);
        assert_eq!(config.catalog.source(), CatalogSource::Discovered);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(HarnessConfig::default().validate().is_ok());
        assert!(HarnessConfig::default().with_base_url("").validate().is_err());
        assert!(HarnessConfig::default().with_base_url("ftp://x").validate().is_err());
        assert!(HarnessConfig::default().with_base_url("not a url").validate().is_err());
        assert!(HarnessConfig::default().with_timeout_secs(0).validate().is_err());
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 3\noutput_dir = \"out\"").unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn malformed_toml() {
        let err = HarnessConfig::from_toml("concurrency = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn missing_file() {
        let err = HarnessConfig::load(Path::new("/nope/gatecheck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
