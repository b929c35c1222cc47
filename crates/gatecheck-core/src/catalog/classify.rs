//! Destructive-operation classification
//!
//! Keyword-driven and deliberately conservative: a safe operation marked
//! destructive only gets mocked, a mutating operation marked safe runs live.

use crate::types::HttpMethod;

/// Keywords that mark a path as mutating
pub const PATH_KEYWORDS: &[&str] = &[
    "delete", "remove", "pause", "resume", "cancel", "stop", "kill", "reset", "clear",
];

/// Keywords that mark an operation identifier as mutating
pub const OPERATION_KEYWORDS: &[&str] = &[
    "delete", "remove", "pause", "resume", "cancel", "stop", "kill", "reset", "clear", "disable",
    "shutdown",
];

/// Tags that mark an operation as destructive
pub const DESTRUCTIVE_TAGS: &[&str] = &["destructive", "admin", "system"];

/// Metadata of an operation being classified
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationMeta<'a> {
    /// `operationId`, if declared
    pub operation_id: Option<&'a str>,
    /// Declared tags
    pub tags: &'a [String],
}

/// Rule that fired for a destructive classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestructiveReason {
    /// Method is DELETE
    DeleteMethod,
    /// Path contains a mutating keyword
    PathKeyword(&'static str),
    /// Operation id contains a mutating keyword
    OperationKeyword(&'static str),
    /// Operation carries a destructive tag
    Tag(String),
}

impl std::fmt::Display for DestructiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestructiveReason::DeleteMethod => write!(f, "DELETE method"),
            DestructiveReason::PathKeyword(kw) => write!(f, "path keyword `{kw}`"),
            DestructiveReason::OperationKeyword(kw) => write!(f, "operation keyword `{kw}`"),
            DestructiveReason::Tag(tag) => write!(f, "tag `{tag}`"),
        }
    }
}

/// Classify an operation; `Some(reason)` means destructive
///
/// Rules are checked in order: method, path, operation id, tags.
#[must_use]
pub fn classify(method: HttpMethod, path: &str, meta: OperationMeta<'_>) -> Option<DestructiveReason> {
    if method == HttpMethod::Delete {
        return Some(DestructiveReason::DeleteMethod);
    }

    let path = path.to_ascii_lowercase();
    if let Some(kw) = first_keyword(&path, PATH_KEYWORDS) {
        return Some(DestructiveReason::PathKeyword(kw));
    }

    if let Some(op) = meta.operation_id {
        let op = op.to_ascii_lowercase();
        if let Some(kw) = first_keyword(&op, OPERATION_KEYWORDS) {
            return Some(DestructiveReason::OperationKeyword(kw));
        }
    }

    meta.tags
        .iter()
        .find(|tag| DESTRUCTIVE_TAGS.iter().any(|d| tag.eq_ignore_ascii_case(d)))
        .map(|tag| DestructiveReason::Tag(tag.clone()))
}

/// Method and path only, for catalog entries without operation metadata
#[inline]
#[must_use]
pub fn is_destructive(method: HttpMethod, path: &str) -> bool {
    classify(method, path, OperationMeta::default()).is_some()
}

fn first_keyword(haystack: &str, keywords: &[&'static str]) -> Option<&'static str> {
    keywords.iter().copied().find(|kw| haystack.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn delete_method_always_destructive() {
        assert_eq!(
            classify(HttpMethod::Delete, "/api/sonarr/series", OperationMeta::default()),
            Some(DestructiveReason::DeleteMethod)
        );
    }

    #[test]
    fn every_path_keyword_fires() {
        for kw in PATH_KEYWORDS {
            let path = format!("/api/sabnzbd/queue/{kw}");
            assert!(is_destructive(HttpMethod::Post, &path), "{kw} should be destructive");
        }
    }

    #[test]
    fn operation_only_keywords() {
        for kw in ["disable", "shutdown"] {
            assert!(!PATH_KEYWORDS.contains(&kw));
            let op = format!("System{}", kw.to_uppercase());
            let meta = OperationMeta {
                operation_id: Some(&op),
                tags: &[],
            };
            assert_eq!(
                classify(HttpMethod::Post, "/api/v3/system", meta),
                Some(DestructiveReason::OperationKeyword(kw))
            );
        }
    }

    #[test]
    fn tags_are_case_insensitive() {
        let tags = vec!["Health".to_string(), "ADMIN".to_string()];
        let meta = OperationMeta {
            operation_id: Some("GetThings"),
            tags: &tags,
        };
        assert_eq!(
            classify(HttpMethod::Get, "/api/v3/things", meta),
            Some(DestructiveReason::Tag("ADMIN".to_string()))
        );
    }

    #[test]
    fn plain_reads_are_safe() {
        let tags = vec!["Series".to_string()];
        let meta = OperationMeta {
            operation_id: Some("GetSeriesById"),
            tags: &tags,
        };
        assert_eq!(classify(HttpMethod::Get, "/api/v3/series/{id}", meta), None);
    }

    #[test]
    fn series_delete_operation_is_destructive() {
        let meta = OperationMeta {
            operation_id: Some("DeleteSeries"),
            tags: &[],
        };
        assert!(classify(HttpMethod::Get, "/series/{id}", meta).is_some());
    }

    proptest! {
        #[test]
        fn delete_wins_for_any_path(path in "/[a-z/{}]{0,40}") {
            prop_assert_eq!(
                classify(HttpMethod::Delete, &path, OperationMeta::default()),
                Some(DestructiveReason::DeleteMethod)
            );
        }

        #[test]
        fn keyword_anywhere_in_path_is_destructive(
            prefix in "/[a-z]{0,10}",
            idx in 0..PATH_KEYWORDS.len(),
            suffix in "[a-z/]{0,10}",
        ) {
            let path = format!("{prefix}{}{suffix}", PATH_KEYWORDS[idx]);
            prop_assert!(is_destructive(HttpMethod::Get, &path));
        }
    }
}
