//! Downstream service profiles
//!
//! The gateway exposes each proxied service under its own namespace. Most
//! namespaces equal the service key; the audiobook instance of readarr is
//! keyed `readarr_audiobooks` but mounted at `/api/readarr-audiobooks`.

use serde::Serialize;

/// Where and how a downstream service is reached through the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceProfile {
    /// Service key used in catalogs and outcomes
    pub key: String,
    /// Gateway namespace, e.g. `/api/sonarr`
    pub api_base: String,
    /// Whether an API description document is published
    pub discoverable: bool,
    /// Endpoint listing entities whose ids can replace placeholders
    pub id_endpoint: Option<String>,
    /// Static id used when no live id is available
    pub fallback_id: String,
    /// Gateway source directory handling this namespace
    pub source_dir: Option<String>,
    /// Described paths rooted at `/api` are relative to the gateway namespace
    pub rebases_api_root: bool,
}

impl ServiceProfile {
    /// Generic profile for a service with no registry entry
    #[must_use]
    pub fn generic(key: &str) -> Self {
        Self {
            key: key.to_string(),
            api_base: format!("/api/{key}"),
            discoverable: true,
            id_endpoint: None,
            fallback_id: "test_id_123".to_string(),
            source_dir: None,
            rebases_api_root: false,
        }
    }

    /// Path of the API description document
    #[inline]
    #[must_use]
    pub fn description_path(&self) -> String {
        format!("{}/openapi.json", self.api_base)
    }

    /// Check if a path already lives under this service's namespace
    #[must_use]
    pub fn owns_path(&self, path: &str) -> bool {
        path == self.api_base
            || path
                .strip_prefix(self.api_base.as_str())
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    }
}

struct ProfileRow {
    key: &'static str,
    segment: &'static str,
    discoverable: bool,
    id_endpoint: &'static str,
    fallback_id: &'static str,
    source_dir: Option<&'static str>,
    rebases_api_root: bool,
}

const PROFILES: &[ProfileRow] = &[
    ProfileRow {
        key: "sabnzbd",
        segment: "sabnzbd",
        discoverable: false,
        id_endpoint: "/api/sabnzbd/queue",
        fallback_id: "test_nzo_123",
        source_dir: Some("app/api/sabnzbd"),
        rebases_api_root: false,
    },
    ProfileRow {
        key: "sonarr",
        segment: "sonarr",
        discoverable: true,
        id_endpoint: "/api/sonarr/series",
        fallback_id: "test_series_123",
        source_dir: Some("app/api/sonarr"),
        rebases_api_root: false,
    },
    ProfileRow {
        key: "radarr",
        segment: "radarr",
        discoverable: true,
        id_endpoint: "/api/radarr/movies",
        fallback_id: "test_movie_123",
        source_dir: Some("app/api/radarr"),
        rebases_api_root: false,
    },
    ProfileRow {
        key: "prowlarr",
        segment: "prowlarr",
        discoverable: true,
        id_endpoint: "/api/prowlarr/applications",
        fallback_id: "test_app_123",
        source_dir: Some("app/api/prowlarr"),
        rebases_api_root: false,
    },
    ProfileRow {
        key: "readarr",
        segment: "readarr",
        discoverable: true,
        id_endpoint: "/api/readarr/author",
        fallback_id: "test_author_123",
        source_dir: Some("app/api/readarr"),
        rebases_api_root: false,
    },
    ProfileRow {
        key: "readarr_audiobooks",
        segment: "readarr-audiobooks",
        discoverable: true,
        id_endpoint: "/api/readarr-audiobooks/book",
        fallback_id: "test_author_123",
        source_dir: None,
        rebases_api_root: true,
    },
];

/// Registry of known downstream services
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    profiles: Vec<ServiceProfile>,
}

impl ServiceRegistry {
    /// Registry of the gateway's built-in services
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = PROFILES
            .iter()
            .map(|row| ServiceProfile {
                key: row.key.to_string(),
                api_base: format!("/api/{}", row.segment),
                discoverable: row.discoverable,
                id_endpoint: Some(row.id_endpoint.to_string()),
                fallback_id: row.fallback_id.to_string(),
                source_dir: row.source_dir.map(str::to_string),
                rebases_api_root: row.rebases_api_root,
            })
            .collect();
        Self { profiles }
    }

    /// Profile for a key, falling back to a generic profile
    #[must_use]
    pub fn profile(&self, key: &str) -> ServiceProfile {
        self.profiles
            .iter()
            .find(|p| p.key == key)
            .cloned()
            .unwrap_or_else(|| ServiceProfile::generic(key))
    }

    /// Source module hint for a service
    #[must_use]
    pub fn source_dir(&self, key: &str) -> Option<&str> {
        self.profiles
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.source_dir.as_deref())
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
