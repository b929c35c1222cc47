//! Built-in endpoint catalog
//!
//! Hand-curated per service: the primary read operations plus a few
//! representative destructive ones, which are always mocked.

use crate::types::{EndpointCase, HttpMethod, SafetyMode};
use serde_json::json;

/// Role of a default row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    /// Part of the essential fallback set
    Essential,
    /// Regular read operation
    Read,
    /// Mutating operation
    Destructive,
}

struct DefaultEndpoint {
    row: Row,
    method: HttpMethod,
    name: &'static str,
    path: &'static str,
    param: Option<(&'static str, &'static str)>,
    command: Option<&'static str>,
}

const fn read(name: &'static str, path: &'static str) -> DefaultEndpoint {
    DefaultEndpoint {
        row: Row::Read,
        method: HttpMethod::Get,
        name,
        path,
        param: None,
        command: None,
    }
}

const fn essential(name: &'static str, path: &'static str) -> DefaultEndpoint {
    DefaultEndpoint {
        row: Row::Essential,
        ..read(name, path)
    }
}

const fn by_id(
    name: &'static str,
    path: &'static str,
    key: &'static str,
    placeholder: &'static str,
) -> DefaultEndpoint {
    DefaultEndpoint {
        param: Some((key, placeholder)),
        ..read(name, path)
    }
}

const fn mutate(
    method: HttpMethod,
    name: &'static str,
    path: &'static str,
    param: Option<(&'static str, &'static str)>,
) -> DefaultEndpoint {
    DefaultEndpoint {
        row: Row::Destructive,
        method,
        name,
        path,
        param,
        command: None,
    }
}

const fn command(name: &'static str, path: &'static str, command: &'static str) -> DefaultEndpoint {
    DefaultEndpoint {
        command: Some(command),
        ..mutate(HttpMethod::Post, name, path, None)
    }
}

const NZO: Option<(&str, &str)> = Some(("nzoId", "test_nzo_123"));

const SABNZBD: &[DefaultEndpoint] = &[
    essential("Get SABnzbd Base", "/api/sabnzbd"),
    essential("Get SABnzbd Queue", "/api/sabnzbd/queue"),
    read("Get SABnzbd History", "/api/sabnzbd/history"),
    read("Get SABnzbd Categories", "/api/sabnzbd/categories"),
    read("Get SABnzbd Config", "/api/sabnzbd/config"),
    essential("Get SABnzbd Server Stats", "/api/sabnzbd/server-stats"),
    read("Get SABnzbd Add File", "/api/sabnzbd/addfile"),
    read("Get SABnzbd Add URL", "/api/sabnzbd/addurl"),
    by_id("Get SABnzbd Queue Item", "/api/sabnzbd/queue/{nzoId}", "nzoId", "test_nzo_123"),
    by_id(
        "Get SABnzbd Queue Item Category",
        "/api/sabnzbd/queue/{nzoId}/category",
        "nzoId",
        "test_nzo_123",
    ),
    by_id(
        "Get SABnzbd Queue Item Priority",
        "/api/sabnzbd/queue/{nzoId}/priority",
        "nzoId",
        "test_nzo_123",
    ),
    mutate(HttpMethod::Post, "Pause SABnzbd Queue", "/api/sabnzbd/queue/pause", None),
    mutate(HttpMethod::Post, "Resume SABnzbd Queue", "/api/sabnzbd/queue/resume", None),
    mutate(HttpMethod::Post, "Pause SABnzbd Queue Item", "/api/sabnzbd/queue/{nzoId}/pause", NZO),
    mutate(HttpMethod::Post, "Resume SABnzbd Queue Item", "/api/sabnzbd/queue/{nzoId}/resume", NZO),
    mutate(HttpMethod::Delete, "Delete SABnzbd Queue Item", "/api/sabnzbd/queue/{nzoId}", NZO),
];

const SONARR: &[DefaultEndpoint] = &[
    essential("Get Sonarr Base", "/api/sonarr"),
    essential("Get Sonarr Series", "/api/sonarr/series"),
    by_id("Get Sonarr Series by ID", "/api/sonarr/series/{id}", "id", "test_series_123"),
    read("Get Sonarr Series Lookup", "/api/sonarr/series/lookup"),
    read("Get Sonarr Calendar", "/api/sonarr/calendar"),
    read("Get Sonarr Queue", "/api/sonarr/queue"),
    by_id("Get Sonarr Queue Item", "/api/sonarr/queue/{id}", "id", "test_queue_123"),
    by_id("Get Sonarr Episode", "/api/sonarr/episode/{id}", "id", "test_episode_123"),
    read("Get Sonarr Wanted Missing", "/api/sonarr/wanted/missing"),
    essential("Get Sonarr System Status", "/api/sonarr/system/status"),
    read("Get Sonarr System Task", "/api/sonarr/system/task"),
    read("Get Sonarr Update", "/api/sonarr/update"),
    read("Get Sonarr Health", "/api/sonarr/health"),
    read("Get Sonarr Disk Space", "/api/sonarr/diskspace"),
    read("Get Sonarr Language Profile", "/api/sonarr/languageprofile"),
    read("Get Sonarr Quality Profile", "/api/sonarr/qualityprofile"),
    read("Get Sonarr Root Folder", "/api/sonarr/rootfolder"),
    mutate(
        HttpMethod::Delete,
        "Delete Sonarr Queue Item",
        "/api/sonarr/queue/{id}",
        Some(("id", "test_queue_123")),
    ),
    command("Execute Sonarr Command", "/api/sonarr/command", "MissingEpisodeSearch"),
];

const RADARR: &[DefaultEndpoint] = &[
    essential("Get Radarr Base", "/api/radarr"),
    essential("Get Radarr Movies", "/api/radarr/movies"),
    read("Get Radarr Movie", "/api/radarr/movie"),
    by_id("Get Radarr Movie by ID", "/api/radarr/movie/{id}", "id", "test_movie_123"),
    read("Get Radarr Movie Lookup", "/api/radarr/movie/lookup"),
    read("Get Radarr Queue", "/api/radarr/queue"),
    read("Get Radarr History", "/api/radarr/history"),
    read("Get Radarr Wanted Missing", "/api/radarr/wanted/missing"),
    essential("Get Radarr System Status", "/api/radarr/system/status"),
    read("Get Radarr Health", "/api/radarr/health"),
    read("Get Radarr Disk Space", "/api/radarr/diskspace"),
    read("Get Radarr Quality Profile", "/api/radarr/qualityprofile"),
    read("Get Radarr Root Folder", "/api/radarr/rootfolder"),
    command("Execute Radarr Command", "/api/radarr/command", "MoviesSearch"),
];

const PROWLARR: &[DefaultEndpoint] = &[
    essential("Get Prowlarr Base", "/api/prowlarr"),
    essential("Get Prowlarr Applications", "/api/prowlarr/applications"),
    read("Get Prowlarr Application", "/api/prowlarr/application"),
    by_id(
        "Get Prowlarr Application by ID",
        "/api/prowlarr/application/{id}",
        "id",
        "test_app_123",
    ),
    read("Get Prowlarr Download Clients", "/api/prowlarr/downloadclient"),
    by_id(
        "Get Prowlarr Download Client by ID",
        "/api/prowlarr/downloadclient/{id}",
        "id",
        "test_client_123",
    ),
    by_id(
        "Test Prowlarr Download Client",
        "/api/prowlarr/downloadclient/{id}/test",
        "id",
        "test_client_123",
    ),
    read("Get Prowlarr Indexers", "/api/prowlarr/indexer"),
    by_id("Get Prowlarr Indexer by ID", "/api/prowlarr/indexer/{id}", "id", "test_indexer_123"),
    by_id("Test Prowlarr Indexer", "/api/prowlarr/indexer/{id}/test", "id", "test_indexer_123"),
    read("Get Prowlarr Indexer Lookup", "/api/prowlarr/indexer/lookup"),
    read("Get Prowlarr Health", "/api/prowlarr/health"),
    read("Get Prowlarr Log", "/api/prowlarr/log"),
    essential("Get Prowlarr System Status", "/api/prowlarr/system/status"),
    command("Execute Prowlarr Command", "/api/prowlarr/command", "ApplicationCheck"),
];

const READARR: &[DefaultEndpoint] = &[
    essential("Get Readarr Base", "/api/readarr"),
    essential("Get Readarr Authors", "/api/readarr/author"),
    by_id("Get Readarr Author by ID", "/api/readarr/author/{id}", "id", "test_author_123"),
    read("Get Readarr Books", "/api/readarr/book"),
    by_id("Get Readarr Book by ID", "/api/readarr/book/{id}", "id", "test_book_123"),
    read("Get Readarr Queue", "/api/readarr/queue"),
    read("Get Readarr History", "/api/readarr/history"),
    read("Get Readarr Wanted Missing", "/api/readarr/wanted/missing"),
    essential("Get Readarr System Status", "/api/readarr/system/status"),
    read("Get Readarr Health", "/api/readarr/health"),
    read("Get Readarr Metadata Profile", "/api/readarr/metadataprofile"),
    read("Get Readarr Quality Profile", "/api/readarr/qualityprofile"),
    read("Get Readarr Root Folder", "/api/readarr/rootfolder"),
    command("Execute Readarr Command", "/api/readarr/command", "AuthorSearch"),
];

const READARR_AUDIOBOOKS: &[DefaultEndpoint] = &[
    essential("Get Readarr Audiobooks Base", "/api/readarr-audiobooks"),
    essential("Get Readarr Audiobooks Authors", "/api/readarr-audiobooks/author"),
    by_id(
        "Get Readarr Audiobooks Author by ID",
        "/api/readarr-audiobooks/author/{id}",
        "id",
        "test_author_123",
    ),
    read("Get Readarr Audiobooks Books", "/api/readarr-audiobooks/book"),
    by_id(
        "Get Readarr Audiobooks Book by ID",
        "/api/readarr-audiobooks/book/{id}",
        "id",
        "test_book_123",
    ),
    read("Get Readarr Audiobooks Queue", "/api/readarr-audiobooks/queue"),
    read("Get Readarr Audiobooks History", "/api/readarr-audiobooks/history"),
    read("Get Readarr Audiobooks Wanted Missing", "/api/readarr-audiobooks/wanted/missing"),
    essential("Get Readarr Audiobooks System Status", "/api/readarr-audiobooks/system/status"),
    read("Get Readarr Audiobooks Health", "/api/readarr-audiobooks/health"),
    read("Get Readarr Audiobooks Metadata Profile", "/api/readarr-audiobooks/metadataprofile"),
    read("Get Readarr Audiobooks Quality Profile", "/api/readarr-audiobooks/qualityprofile"),
    read("Get Readarr Audiobooks Root Folder", "/api/readarr-audiobooks/rootfolder"),
    command(
        "Execute Readarr Audiobooks Command",
        "/api/readarr-audiobooks/command",
        "AuthorSearch",
    ),
];

/// Services with a built-in catalog, in catalog order
pub const DEFAULT_SERVICES: &[&str] = &[
    "sabnzbd",
    "sonarr",
    "radarr",
    "prowlarr",
    "readarr",
    "readarr_audiobooks",
];

fn table(service: &str) -> &'static [DefaultEndpoint] {
    match service {
        "sabnzbd" => SABNZBD,
        "sonarr" => SONARR,
        "radarr" => RADARR,
        "prowlarr" => PROWLARR,
        "readarr" => READARR,
        "readarr_audiobooks" => READARR_AUDIOBOOKS,
        _ => &[],
    }
}

impl DefaultEndpoint {
    fn to_case(&self, service: &str) -> EndpointCase {
        let mut case = EndpointCase::new(self.name, service, self.method, self.path);
        if let Some((key, value)) = self.param {
            case = case.with_path_param(key, value);
        }
        if let Some(name) = self.command {
            case = case.with_body(json!({ "name": name }));
        }
        if self.row == Row::Destructive {
            case = case.destructive(SafetyMode::Mock);
        }
        case
    }
}

/// Full built-in catalog for one service; empty for unknown services
#[must_use]
pub fn default_cases(service: &str) -> Vec<EndpointCase> {
    table(service).iter().map(|e| e.to_case(service)).collect()
}

/// Essential subset (base, primary listing, status) used when discovery fails
#[must_use]
pub fn essential_cases(service: &str) -> Vec<EndpointCase> {
    table(service)
        .iter()
        .filter(|e| e.row == Row::Essential)
        .map(|e| e.to_case(service))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::classify::is_destructive;
    use crate::services::ServiceRegistry;
    use crate::types::is_placeholder;
    use std::collections::HashSet;

    fn all_default_cases() -> Vec<EndpointCase> {
        DEFAULT_SERVICES.iter().flat_map(|s| default_cases(s)).collect()
    }

    #[test]
    fn every_default_service_has_cases() {
        for service in DEFAULT_SERVICES {
            assert!(!default_cases(service).is_empty(), "{service}");
            assert_eq!(essential_cases(service).len(), 3, "{service}");
        }
        assert!(default_cases("lidarr").is_empty());
    }

    #[test]
    fn names_are_unique() {
        let cases = all_default_cases();
        let names: HashSet<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), cases.len());
    }

    #[test]
    fn paths_live_in_their_namespace() {
        let registry = ServiceRegistry::builtin();
        for case in all_default_cases() {
            let profile = registry.profile(&case.service);
            assert!(profile.owns_path(&case.path), "{} -> {}", case.service, case.path);
        }
    }

    #[test]
    fn destructive_rows_are_mocked_and_match_rules() {
        for case in all_default_cases() {
            if case.destructive {
                assert_eq!(case.safety_mode, SafetyMode::Mock, "{}", case.name);
            }
            // commands are curated as destructive without a keyword
            if is_destructive(case.method, &case.path) {
                assert!(case.destructive, "{} should be destructive", case.name);
            }
        }
    }

    #[test]
    fn command_rows_carry_a_body() {
        let sonarr = default_cases("sonarr");
        let cmd = sonarr.iter().find(|c| c.path.ends_with("/command")).unwrap();
        assert_eq!(cmd.method, HttpMethod::Post);
        assert_eq!(cmd.body, Some(json!({"name": "MissingEpisodeSearch"})));
    }

    #[test]
    fn id_rows_use_placeholders() {
        let cases = default_cases("sabnzbd");
        let item = cases.iter().find(|c| c.name == "Get SABnzbd Queue Item").unwrap();
        assert!(item.path_params.values().any(|v| is_placeholder(v)));
        assert_eq!(item.path_params.get("nzoId").map(String::as_str), Some("test_nzo_123"));
    }
}
