//! Catalog source loading
//!
//! The catalog is a YAML document: either a list of query entries, or a
//! mapping whose `queries`, `data` or `items` key holds that list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_yaml::Value;
use sha2::{Digest, Sha256};

use super::normalizer::{normalize, scalar_text};
use super::types::QueryDefinition;
use crate::error::CatalogError;

const ROOT_KEYS: [&str; 3] = ["queries", "data", "items"];

/// Where catalog bytes come from
pub trait CatalogSource: Send + Sync {
    fn read(&self) -> Result<Vec<u8>, CatalogError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

impl<T: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<T> {
    fn read(&self) -> Result<Vec<u8>, CatalogError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Catalog stored in a YAML file on disk
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for YamlFileSource {
    fn read(&self) -> Result<Vec<u8>, CatalogError> {
        std::fs::read(&self.path).map_err(|source| CatalogError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory catalog text, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticSource {
    bytes: RwLock<Vec<u8>>,
}

impl StaticSource {
    pub fn new(yaml: impl Into<String>) -> Self {
        Self {
            bytes: RwLock::new(yaml.into().into_bytes()),
        }
    }

    pub fn replace(&self, yaml: impl Into<String>) {
        let mut guard = self.bytes.write().unwrap_or_else(|e| e.into_inner());
        *guard = yaml.into().into_bytes();
    }
}

impl CatalogSource for StaticSource {
    fn read(&self) -> Result<Vec<u8>, CatalogError> {
        Ok(self.bytes.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn describe(&self) -> String {
        "<in-memory>".to_string()
    }
}

/// Content hash of the catalog source, lowercase hex SHA-256
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Parse catalog bytes into query definitions with normalized parameters.
///
/// Entries that are not mappings or have no name are skipped; on duplicate
/// names the first entry wins.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<QueryDefinition>, CatalogError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_slice(bytes)?;
    let entries = match &document {
        Value::Sequence(items) => items.as_slice(),
        Value::Mapping(map) => ROOT_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_sequence))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    let mut seen = HashSet::new();
    let mut queries = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let Some(fields) = entry.as_mapping() else {
            tracing::warn!(position, "Skipping catalog entry that is not a mapping");
            continue;
        };
        let Some(name) = fields.get("name").and_then(scalar_text).filter(|n| !n.trim().is_empty())
        else {
            tracing::warn!(position, "Skipping catalog entry without a name");
            continue;
        };
        if !seen.insert(name.clone()) {
            tracing::warn!(query = %name, "Duplicate query name in catalog, keeping the first");
            continue;
        }

        queries.push(QueryDefinition {
            name,
            description: fields
                .get("description")
                .and_then(scalar_text)
                .unwrap_or_default(),
            parameters: normalize(fields.get("parameters")),
        });
    }

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ParamType;

    const CATALOG: &str = r#"
- name: agent hierarchy
  description: Reporting line of an agent
  parameters:
    - { name: agent_id, type: string }
- name: sales report
  description: Revenue by region
  parameters:
    region: { type: select, options: [EAST, WEST], required: true }
    day: { type: date }
"#;

    #[test]
    fn test_parse_list_root() {
        let queries = parse_catalog(CATALOG.as_bytes()).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].name, "agent hierarchy");
        assert!(queries[0].parameters[0].required);
        assert_eq!(queries[1].parameters[0].param_type, ParamType::Select);
        assert!(!queries[1].parameters[1].required);
    }

    #[test]
    fn test_parse_wrapped_roots() {
        for key in ROOT_KEYS {
            let doc = format!("{key}:\n  - name: q\n    description: d\n");
            let queries = parse_catalog(doc.as_bytes()).unwrap();
            assert_eq!(queries.len(), 1, "root key {key}");
        }
    }

    #[test]
    fn test_unrecognized_root_is_empty() {
        assert!(parse_catalog(b"other: [1, 2]").unwrap().is_empty());
        assert!(parse_catalog(b"42").unwrap().is_empty());
        assert!(parse_catalog(b"   \n").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(matches!(
            parse_catalog(b"- name: [unclosed"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_skips_malformed_and_duplicate_entries() {
        let doc = r#"
- not a mapping
- description: no name
- name: q
  description: first
- name: q
  description: second
"#;
        let queries = parse_catalog(doc.as_bytes()).unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].description, "first");
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let a = fingerprint(CATALOG.as_bytes());
        assert_eq!(a, fingerprint(CATALOG.as_bytes()));
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(b"- name: other"));
    }

    #[test]
    fn test_file_source_reports_missing_file() {
        let source = YamlFileSource::new("/nonexistent/rag.yaml");
        assert!(matches!(source.read(), Err(CatalogError::Read { .. })));
    }

    #[test]
    fn test_static_source_replace() {
        let source = StaticSource::new("- name: a");
        source.replace("- name: b");
        assert_eq!(source.read().unwrap(), b"- name: b");
    }
}
