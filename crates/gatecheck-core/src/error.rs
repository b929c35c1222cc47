//! Error types for gatecheck
//!
//! Provides error handling for:
//! - Catalog resolution (explicit files, malformed sources)
//! - Configuration loading and validation
//! - Per-request transport failures
//! - Identifier resolution and runner faults

use std::path::PathBuf;

/// Main harness error type
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Catalog could not be resolved
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Identifier resolution failed for a service
    #[error("identifier resolution failed for {service}: {message}")]
    IdResolution {
        /// Service whose identifier was requested
        service: String,
        /// Failure detail
        message: String,
    },

    /// Unexpected fault while running a single case
    #[error("runner exception: {0}")]
    Runner(String),

    /// Report rendering failed
    #[error("report error: {0}")]
    Report(String),
}

impl HarnessError {
    /// Check if error must terminate the run before execution starts
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Config(_))
    }

    /// Create identifier resolution error
    #[inline]
    pub fn id_resolution(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IdResolution {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Catalog source errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Explicit catalog file could not be read
    #[error("cannot read catalog file {path}: {source}")]
    Unreadable {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Catalog document did not match the expected shape
    #[error("malformed catalog {path}: {message}")]
    Malformed {
        /// File path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// File extension is not JSON or YAML
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Resolution produced no cases at all
    #[error("catalog resolved to zero endpoint cases")]
    Empty,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("malformed config: {0}")]
    Malformed(String),

    /// A value is out of range or inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Transport-level failure of a single request
///
/// The rendered text is what triage sees, so the timeout and connection
/// variants always contain the words `timeout` and `connection`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Request exceeded the per-request timeout
    #[error("timeout after {after_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        after_ms: u64,
    },

    /// DNS failure, refused or reset connection
    #[error("connection failed: {0}")]
    Connection(String),

    /// Target URL could not be built
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A case header could not be encoded
    #[error("invalid header `{name}`: {message}")]
    InvalidHeader {
        /// Header name as written in the case
        name: String,
        /// Why it was rejected
        message: String,
    },

    /// Response body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Anything else reported by the HTTP stack
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Check if error is a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
