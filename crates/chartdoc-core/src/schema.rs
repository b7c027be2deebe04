//! Type and description hints from `values.schema.json`
//!
//! Charts that ship a JSON Schema for their values often describe keys there
//! instead of in comments. Those descriptions are used for keys that carry
//! no `# --` comment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

use crate::comments::push_key;
use crate::error::Result;

/// Schema file looked up in the chart root
pub const SCHEMA_FILE: &str = "values.schema.json";

static INDEX_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").expect("valid regex"));

/// Hint for a single key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaHint {
    pub value_type: Option<String>,
    pub description: Option<String>,
}

/// Hints keyed by value path, with sequence indexes normalised to `[*]`
#[derive(Debug, Clone, Default)]
pub struct SchemaHints {
    hints: HashMap<String, SchemaHint>,
}

impl SchemaHints {
    /// Load hints from the chart root, if a schema is present
    ///
    /// A schema that cannot be read or parsed is logged and ignored.
    pub fn load(chart_root: &Path) -> Self {
        let path = chart_root.join(SCHEMA_FILE);
        if !path.is_file() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(hints) => {
                tracing::debug!("Read {} schema hints from {}", hints.len(), path.display());
                hints
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable schema {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build hints from JSON Schema text
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: JsonValue = serde_json::from_str(json)?;
        let mut hints = Self::default();
        hints.collect("", &schema);
        Ok(hints)
    }

    fn collect(&mut self, prefix: &str, node: &JsonValue) {
        if let Some(properties) = node.get("properties").and_then(JsonValue::as_object) {
            for (key, child) in properties {
                let path = push_key(prefix, key);
                let hint = SchemaHint {
                    value_type: child.get("type").and_then(schema_type),
                    description: child
                        .get("description")
                        .and_then(JsonValue::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty()),
                };
                if hint != SchemaHint::default() {
                    self.hints.insert(path.clone(), hint);
                }
                self.collect(&path, child);
            }
        }

        if let Some(items) = node.get("items") {
            let item_prefix = format!("{}[*]", prefix);
            self.collect(&item_prefix, items);
        }
    }

    /// Look up a hint for a concrete path such as `hosts[0].name`
    pub fn get(&self, path: &str) -> Option<&SchemaHint> {
        if let Some(hint) = self.hints.get(path) {
            return Some(hint);
        }
        let normalised = INDEX_SEGMENT.replace_all(path, "[*]");
        self.hints.get(normalised.as_ref())
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

/// Map a JSON Schema `type` onto the names used in value tables
fn schema_type(value: &JsonValue) -> Option<String> {
    let name = match value {
        JsonValue::String(s) => s.as_str(),
        JsonValue::Array(types) => types
            .iter()
            .filter_map(JsonValue::as_str)
            .find(|t| *t != "null")?,
        _ => return None,
    };

    let mapped = match name {
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "array" => "list",
        "object" => "object",
        "string" => "string",
        other => other,
    };
    Some(mapped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/schema#",
  "type": "object",
  "properties": {
    "replicaCount": { "type": "integer", "description": "Number of pods" },
    "image": {
      "type": "object",
      "properties": {
        "tag": { "type": ["string", "null"], "description": "  Image tag  " }
      }
    },
    "hosts": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "name": { "type": "string", "description": "Host name" }
        }
      }
    }
  }
}"#;

    #[test]
    fn test_hints_from_json() {
        let hints = SchemaHints::from_json(SCHEMA).unwrap();

        let replicas = hints.get("replicaCount").unwrap();
        assert_eq!(replicas.value_type.as_deref(), Some("int"));
        assert_eq!(replicas.description.as_deref(), Some("Number of pods"));

        let tag = hints.get("image.tag").unwrap();
        assert_eq!(tag.value_type.as_deref(), Some("string"));
        assert_eq!(tag.description.as_deref(), Some("Image tag"));

        assert_eq!(hints.get("image").unwrap().value_type.as_deref(), Some("object"));
    }

    #[test]
    fn test_item_hints_match_any_index() {
        let hints = SchemaHints::from_json(SCHEMA).unwrap();
        assert_eq!(
            hints.get("hosts[3].name").unwrap().description.as_deref(),
            Some("Host name")
        );
    }

    #[test]
    fn test_load_ignores_broken_schema() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SCHEMA_FILE), "{ not json").unwrap();
        assert!(SchemaHints::load(dir.path()).is_empty());
    }

    #[test]
    fn test_load_without_schema() {
        let dir = TempDir::new().unwrap();
        assert!(SchemaHints::load(dir.path()).is_empty());
    }
}
