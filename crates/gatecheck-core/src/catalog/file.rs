//! Explicit catalog files
//!
//! ```yaml
//! sonarr:
//!   endpoints:
//!     - name: Get Series
//!       path: /api/sonarr/series
//!       method: GET
//!       tests:
//!         status_code: 200
//!         required_fields: [id, title]
//! ```
//!
//! JSON files use the same shape. Service order is preserved.

use crate::catalog::classify::is_destructive;
use crate::error::CatalogError;
use crate::types::{EndpointCase, HttpMethod, SafetyMode};
use crate::validator::ExpectationSet;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed catalog file, grouped by service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CatalogFile {
    /// Service key to its endpoint list
    pub services: IndexMap<String, ServiceSection>,
}

/// One service's section of a catalog file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSection {
    /// Endpoint entries
    #[serde(default)]
    pub endpoints: Vec<FileEndpoint>,
}

/// One endpoint entry as written in a catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct FileEndpoint {
    /// Case name
    pub name: String,
    /// Gateway path template
    pub path: String,
    /// Method, any case
    #[serde(default = "default_method")]
    pub method: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Destructive flag; derived from method and path when omitted
    #[serde(default)]
    pub destructive: Option<bool>,
    /// Safety mode
    #[serde(default)]
    pub safe_mode: SafetyMode,
    /// Path parameters
    #[serde(default, deserialize_with = "scalar_map")]
    pub path_params: BTreeMap<String, String>,
    /// Query parameters
    #[serde(default, deserialize_with = "scalar_map")]
    pub query_params: BTreeMap<String, String>,
    /// Headers
    #[serde(default, deserialize_with = "scalar_map")]
    pub headers: BTreeMap<String, String>,
    /// JSON body
    #[serde(default)]
    pub body: Option<Value>,
    /// Expected status
    #[serde(default = "default_status")]
    pub expected_status: u16,
    /// Expectations
    #[serde(default)]
    pub tests: Option<ExpectationSet>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

/// Accept numbers and booleans where strings are expected
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, v)
        })
        .collect())
}

impl CatalogFile {
    /// Load a JSON or YAML catalog file
    ///
    /// # Errors
    /// Returns `CatalogError` if the file is unreadable, has an unknown
    /// extension or does not match the catalog shape
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Self::from_json(&text).map_err(|message| CatalogError::Malformed {
                path: path.to_path_buf(),
                message,
            }),
            Some("yaml" | "yml") => Self::from_yaml(&text).map_err(|message| CatalogError::Malformed {
                path: path.to_path_buf(),
                message,
            }),
            _ => Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Parse JSON text
    ///
    /// # Errors
    /// Returns the parser message
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// Returns the parser message
    pub fn from_yaml(text: &str) -> Result<Self, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// Convert every entry into a case, in file order
    ///
    /// # Errors
    /// Returns the offending entry if a method is not supported
    pub fn into_cases(self) -> Result<Vec<EndpointCase>, String> {
        let mut cases = Vec::new();
        for (service, section) in self.services {
            for entry in section.endpoints {
                cases.push(entry.into_case(&service)?);
            }
        }
        Ok(cases)
    }
}

impl FileEndpoint {
    fn into_case(self, service: &str) -> Result<EndpointCase, String> {
        let method: HttpMethod = self
            .method
            .parse()
            .map_err(|e| format!("{service}/{}: {e}", self.name))?;
        let destructive = self
            .destructive
            .unwrap_or_else(|| is_destructive(method, &self.path));

        let mut case = EndpointCase::new(self.name, service, method, self.path)
            .with_safety_mode(self.safe_mode)
            .with_expected_status(self.expected_status);
        case.destructive = destructive;
        case.path_params = self.path_params;
        case.query_params = self.query_params;
        case.headers = self.headers;
        case.body = self.body;
        case.expectations = self.tests.map(|mut tests| {
            tests.status_code.get_or_insert(self.expected_status);
            tests
        });
        if let Some(description) = self.description {
            case.description = description;
        }
        Ok(case)
    }
}

/// Load a catalog file and convert it into cases
///
/// # Errors
/// Any failure is fatal for the run
pub fn load_cases(path: &Path) -> Result<Vec<EndpointCase>, CatalogError> {
    CatalogFile::load(path)?
        .into_cases()
        .map_err(|message| CatalogError::Malformed {
            path: path.to_path_buf(),
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r"
sonarr:
  endpoints:
    - name: Get Series
      path: /api/sonarr/series
      tests:
        status_code: 200
        required_fields: [id]
        schema: ignored
    - name: Delete Series
      path: /api/sonarr/series/{id}
      method: delete
      path_params:
        id: 42
sabnzbd:
  endpoints:
    - name: Pause Queue
      path: /api/sabnzbd/queue/pause
      method: POST
      destructive: true
      safe_mode: skip
";

    #[test]
    fn yaml_keeps_service_order_and_defaults() {
        let cases = CatalogFile::from_yaml(YAML).unwrap().into_cases().unwrap();
        let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Get Series", "Delete Series", "Pause Queue"]);

        let first = &cases[0];
        assert_eq!(first.method, HttpMethod::Get);
        assert_eq!(first.expected_status, 200);
        assert_eq!(first.safety_mode, SafetyMode::Mock);
        assert!(!first.destructive);
        assert_eq!(
            first.expectations,
            Some(ExpectationSet::new().status(200).fields(["id"]))
        );
    }

    #[test]
    fn omitted_destructive_is_classified() {
        let cases = CatalogFile::from_yaml(YAML).unwrap().into_cases().unwrap();
        let delete = &cases[1];
        assert!(delete.destructive);
        assert_eq!(delete.path_params.get("id").map(String::as_str), Some("42"));

        let pause = &cases[2];
        assert!(pause.destructive);
        assert_eq!(pause.safety_mode, SafetyMode::Skip);
    }

    #[test]
    fn json_file_on_disk() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"radarr": {{"endpoints": [{{"name": "Movies", "path": "/api/radarr/movies", "expected_status": 204}}]}}}}"#
        )
        .unwrap();

        let cases = load_cases(file.path()).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].service, "radarr");
        assert_eq!(cases[0].expected_status, 204);
    }

    #[test]
    fn declared_status_joins_partial_tests() {
        let yaml = r"
radarr:
  endpoints:
    - name: Create Tag
      path: /api/radarr/tag
      method: POST
      expected_status: 201
      tests:
        required_fields: [id]
    - name: Tags
      path: /api/radarr/tag
      tests:
        status_code: 204
";
        let cases = CatalogFile::from_yaml(yaml).unwrap().into_cases().unwrap();
        assert_eq!(
            cases[0].expectations,
            Some(ExpectationSet::new().status(201).fields(["id"]))
        );
        assert_eq!(cases[1].expectations, Some(ExpectationSet::new().status(204)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = load_cases(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, CatalogError::Unreadable { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = load_cases(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedFormat(_)));
    }

    #[test]
    fn bad_method_is_malformed() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "sonarr:\n  endpoints:\n    - name: x\n      path: /x\n      method: TRACE").unwrap();
        let err = load_cases(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }
}
