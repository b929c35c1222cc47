//! Gateway path normalization for discovered operations
//!
//! A description document lists paths relative to the downstream service
//! (`/api/v3/series`, proxied as `/api/sonarr/api/v3/series`). The audiobook
//! instance is the exception: its document is written against the gateway,
//! so its `/api` root stands for `/api/readarr-audiobooks`. Every discovered
//! path is rewritten into the gateway namespace exactly once.

use crate::services::ServiceProfile;

/// Join the document's base path and an operation path
///
/// Paths already rooted at `/api/` ignore the base path.
#[must_use]
pub fn join_base_path(base_path: &str, raw: &str) -> String {
    if raw.starts_with("/api/") {
        return raw.to_string();
    }
    let base = base_path.trim_end_matches('/');
    if raw.starts_with('/') {
        format!("{base}{raw}")
    } else {
        format!("{base}/{raw}")
    }
}

/// Rewrite a discovered path into the service's gateway namespace
///
/// - already under the namespace: unchanged
/// - `/api` paths of a rebasing profile: the leading `/api` becomes the namespace
/// - anything else: prefixed with the namespace
///
/// The namespace check works on whole segments, so `/api/readarr-audiobooks`
/// is never mistaken for `/api/readarr` and vice versa.
#[must_use]
pub fn to_gateway_path(profile: &ServiceProfile, path: &str) -> String {
    if profile.owns_path(path) {
        return path.to_string();
    }
    if profile.rebases_api_root {
        if let Some(rest) = path.strip_prefix("/api") {
            if rest.is_empty() || rest.starts_with('/') {
                return format!("{}{rest}", profile.api_base);
            }
        }
    }
    if path.starts_with('/') {
        format!("{}{path}", profile.api_base)
    } else {
        format!("{}/{path}", profile.api_base)
    }
}

/// [`join_base_path`] then [`to_gateway_path`]
#[inline]
#[must_use]
pub fn normalize_path(profile: &ServiceProfile, base_path: &str, raw: &str) -> String {
    to_gateway_path(profile, &join_base_path(base_path, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceRegistry;

    fn profile(key: &str) -> ServiceProfile {
        ServiceRegistry::builtin().profile(key)
    }

    #[test]
    fn relative_path_gets_namespace() {
        assert_eq!(normalize_path(&profile("sonarr"), "", "/series"), "/api/sonarr/series");
    }

    #[test]
    fn base_path_is_joined_first() {
        assert_eq!(
            normalize_path(&profile("radarr"), "/v3/", "/movie/{id}"),
            "/api/radarr/v3/movie/{id}"
        );
    }

    #[test]
    fn versioned_api_path_keeps_downstream_root() {
        assert_eq!(
            normalize_path(&profile("sonarr"), "", "/api/v3/series"),
            "/api/sonarr/api/v3/series"
        );
        assert_eq!(
            normalize_path(&profile("radarr"), "/ignored", "/api/v3/movie/{id}"),
            "/api/radarr/api/v3/movie/{id}"
        );
        assert_eq!(to_gateway_path(&profile("lidarr"), "/api"), "/api/lidarr/api");
    }

    #[test]
    fn owned_path_is_kept() {
        assert_eq!(
            normalize_path(&profile("prowlarr"), "/ignored", "/api/prowlarr/indexer"),
            "/api/prowlarr/indexer"
        );
    }

    #[test]
    fn hyphenated_namespace_is_not_doubled() {
        let audiobooks = profile("readarr_audiobooks");
        assert_eq!(
            normalize_path(&audiobooks, "", "/api/readarr-audiobooks/book/{id}"),
            "/api/readarr-audiobooks/book/{id}"
        );
        assert_eq!(
            normalize_path(&audiobooks, "", "/api/author"),
            "/api/readarr-audiobooks/author"
        );
        assert_eq!(
            normalize_path(&audiobooks, "", "/author"),
            "/api/readarr-audiobooks/author"
        );
    }

    #[test]
    fn sibling_namespace_is_not_treated_as_owned() {
        // readarr must not claim the audiobooks namespace as its own
        assert_eq!(
            to_gateway_path(&profile("readarr"), "/api/readarr-audiobooks/book"),
            "/api/readarr/readarr-audiobooks/book"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for key in ["readarr_audiobooks", "sonarr"] {
            let p = profile(key);
            for raw in ["/author", "/api/v1/book", "/api/readarr-audiobooks/queue"] {
                let once = normalize_path(&p, "", raw);
                assert_eq!(to_gateway_path(&p, &once), once);
            }
        }
    }

    #[test]
    fn missing_leading_slash() {
        assert_eq!(join_base_path("", "series"), "/series");
        assert_eq!(to_gateway_path(&profile("sonarr"), "series"), "/api/sonarr/series");
    }
}
