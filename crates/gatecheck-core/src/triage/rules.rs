//! Triage rule tables and the pure functions evaluating them
//!
//! Keyword matching is case-insensitive throughout.

use super::{Priority, Severity};
use chrono::{Days, NaiveDate};

/// Path keywords that raise the priority score
pub const PATH_BOOSTS: &[(&str, u32)] = &[("queue", 20), ("series", 15), ("history", 10)];

/// Error keywords that raise the priority score
pub const ERROR_BOOSTS: &[(&str, u32)] = &[("timeout", 10), ("connection", 15)];

/// Minimum score per priority band, highest first
pub const PRIORITY_BANDS: &[(u8, Priority)] = &[(80, Priority::P0), (60, Priority::P1), (40, Priority::P2)];

/// Services with a dedicated specialist
pub const SPECIALISTS: &[(&str, &str)] = &[
    ("sabnzbd", "Backend Team - SABnzbd Specialist"),
    ("sonarr", "Backend Team - Sonarr Specialist"),
];

/// Path fragment to route file, first match wins
pub const ROUTE_FILES: &[(&str, &str)] = &[
    ("/queue/", "queue/route.ts"),
    ("/history/", "history/route.ts"),
    ("/system/", "system/status/route.ts"),
];

/// Location reported for services without a known module
pub const UNKNOWN_LOCATION: &str = "Unknown location";

fn mentions(text: &str, keyword: &str) -> bool {
    text.to_ascii_lowercase().contains(keyword)
}

/// Severity of a failure, first matching rule wins
#[must_use]
pub fn severity(http_status: Option<u16>, error: &str) -> Severity {
    match http_status {
        Some(code) if code >= 500 => Severity::Critical,
        Some(code) if code >= 400 => Severity::High,
        _ if mentions(error, "timeout") => Severity::Medium,
        _ if mentions(error, "connection") => Severity::High,
        _ => Severity::Medium,
    }
}

/// Priority score in `0..=100`
#[must_use]
pub fn priority_score(endpoint: &str, severity: Severity, error: &str) -> u8 {
    let endpoint = endpoint.to_ascii_lowercase();
    let error = error.to_ascii_lowercase();

    let path_boost: u32 = PATH_BOOSTS
        .iter()
        .filter(|(kw, _)| endpoint.contains(kw))
        .map(|(_, boost)| boost)
        .sum();
    let error_boost: u32 = ERROR_BOOSTS
        .iter()
        .filter(|(kw, _)| error.contains(kw))
        .map(|(_, boost)| boost)
        .sum();

    let total = severity.base_score() + path_boost + error_boost;
    u8::try_from(total.min(100)).unwrap_or(100)
}

/// Band a score into a priority
#[must_use]
pub fn priority_band(score: u8) -> Priority {
    PRIORITY_BANDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map_or(Priority::P3, |(_, p)| *p)
}

/// Who should pick the issue up
#[must_use]
pub fn assignee(service: &str, severity: Severity) -> String {
    if let Some((_, who)) = SPECIALISTS.iter().find(|(s, _)| *s == service) {
        return (*who).to_string();
    }
    match severity {
        Severity::Critical => "Senior Backend Developer",
        Severity::High => "Backend Developer",
        Severity::Medium | Severity::Low => "Backend Team - General",
    }
    .to_string()
}

/// Estimated hours to fix
///
/// Timeout and connection multipliers do not compound; timeout is checked first.
#[must_use]
pub fn effort_hours(severity: Severity, error: &str) -> f64 {
    let base = severity.base_effort_hours();
    if mentions(error, "timeout") {
        base * 1.2
    } else if mentions(error, "connection") {
        base * 1.5
    } else {
        base
    }
}

/// Due date for a priority, counted from `today`
#[must_use]
pub fn due_date(priority: Priority, today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(priority.turnaround_days()))
        .unwrap_or(NaiveDate::MAX)
}

/// Source file most likely handling an endpoint of the given module
#[must_use]
pub fn file_location(module: Option<&str>, endpoint: &str) -> String {
    let Some(module) = module else {
        return UNKNOWN_LOCATION.to_string();
    };
    let path = endpoint.split('?').next().unwrap_or(endpoint);
    let route = ROUTE_FILES
        .iter()
        .find(|(fragment, _)| path.contains(fragment))
        .map_or("route.ts", |(_, file)| *file);
    format!("{module}/{route}")
}

/// Advisory fix text pointing at `location`
#[must_use]
pub fn suggested_fix(http_status: Option<u16>, error: &str, service: &str, location: &str) -> String {
    match http_status {
        Some(404) => format!("Check if endpoint exists and is properly routed in {location}"),
        Some(500) => format!("Check server-side error logs and exception handling in {location}"),
        _ if mentions(error, "timeout") => {
            format!("Increase timeout or optimize endpoint performance in {location}")
        }
        _ if mentions(error, "connection") => {
            format!("Check {service} backend service connectivity and configuration")
        }
        _ if mentions(error, "authentication") => {
            format!("Verify API key and authentication implementation in {location}")
        }
        _ if mentions(error, "validation") => {
            format!("Add proper input validation and error handling in {location}")
        }
        _ => format!("Review endpoint implementation and error handling in {location}"),
    }
}
