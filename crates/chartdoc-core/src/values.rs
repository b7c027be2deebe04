//! Values documents with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::path::Path;

use crate::comments::CommentIndex;
use crate::error::{CoreError, Result};

/// Ordered values tree with deep merge capability
///
/// Mapping order follows the source documents, so rows can be emitted in
/// file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, "<values>")
    }

    fn parse(yaml: &str, origin: &str) -> Result<Self> {
        let mut value: YamlValue =
            serde_yaml::from_str(yaml).map_err(|e| CoreError::yaml(origin, e))?;
        value
            .apply_merge()
            .map_err(|e| CoreError::yaml(origin, e))?;
        match yaml_to_json(value) {
            JsonValue::Null => Ok(Self::new()),
            json @ JsonValue::Object(_) => Ok(Self(json)),
            _ => Err(CoreError::InvalidChart {
                message: format!("{} must contain a mapping at the top level", origin),
            }),
        }
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge, new keys appended
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Base values document plus ordered override documents, merged
#[derive(Debug, Clone, Default)]
pub struct ValuesSource {
    /// Merged values
    pub values: Values,

    /// Annotations from every loaded document, later ones taking precedence
    pub comments: CommentIndex,

    /// Files that were actually read, in merge order
    pub loaded_files: Vec<String>,
}

impl ValuesSource {
    /// Load `base_path` and then each override from `chart_root`
    ///
    /// A missing base document yields empty values. Missing overrides are
    /// skipped with a warning.
    pub fn load(chart_root: &Path, base_path: &Path, overrides: &[String]) -> Result<Self> {
        let mut source = Self {
            values: Values::new(),
            ..Default::default()
        };

        if base_path.is_file() {
            source.add_file(base_path)?;
        } else {
            tracing::debug!(
                "No values file {}, documenting no values",
                base_path.display()
            );
        }

        for name in overrides {
            let path = chart_root.join(name);
            if !path.is_file() {
                tracing::warn!(
                    "Values file {} not found in {}, skipping",
                    name,
                    chart_root.display()
                );
                continue;
            }
            source.add_file(&path)?;
        }

        Ok(source)
    }

    fn add_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let origin = path.display().to_string();
        let values = Values::parse(&content, &origin)?;
        self.values.merge(&values);
        self.comments.extend(CommentIndex::scan(&content));
        tracing::debug!("Merged values from {}", origin);
        self.loaded_files.push(origin);
        Ok(())
    }
}

/// Convert a YAML tree into an ordered JSON tree
///
/// Non-string mapping keys are stringified, tags are dropped.
pub fn yaml_to_json(value: YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    // NaN and infinities have no JSON form
                    .unwrap_or_else(|| JsonValue::String(n.to_string()))
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(key_to_string(k), yaml_to_json(v));
            }
            JsonValue::Object(out)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        other => serde_json::to_string(&yaml_to_json(other)).unwrap_or_default(),
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_merge_keeps_base_order_and_appends() {
        let mut base = Values::from_yaml("zeta: 1\nalpha: 2\n").unwrap();
        let overlay = Values::from_yaml("beta: 3\nzeta: 4\n").unwrap();
        base.merge(&overlay);

        let keys: Vec<&String> = base.inner().as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "beta"]);
        assert_eq!(base.get("zeta").unwrap(), 4);
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = Values::from_yaml("args: [a, b, c]\n").unwrap();
        base.merge(&Values::from_yaml("args: [z]\n").unwrap());
        assert_eq!(base.get("args").unwrap(), &serde_json::json!(["z"]));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let values = Values::from_yaml("# only a comment\n").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_scalar_document_is_rejected() {
        assert!(Values::from_yaml("just a string").is_err());
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let values = Values::from_yaml("ports:\n  80: http\n  true: yes\n").unwrap();
        assert_eq!(values.get("ports.80").unwrap(), "http");
        assert_eq!(values.get("ports.true").unwrap(), "yes");
    }

    #[test]
    fn test_floats_and_ints_are_distinct() {
        let values = Values::from_yaml("a: 1\nb: 1.5\n").unwrap();
        assert!(values.get("a").unwrap().is_i64());
        assert!(values.get("b").unwrap().is_f64());
    }

    #[test]
    fn test_source_merges_overrides_and_comments() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("values.yaml"),
            "# -- Number of replicas\nreplicas: 1\nimage: nginx\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("values-prod.yaml"),
            "# -- Replica count for production\nreplicas: 5\n",
        )
        .unwrap();

        let source = ValuesSource::load(
            dir.path(),
            &dir.path().join("values.yaml"),
            &["values-prod.yaml".to_string(), "missing.yaml".to_string()],
        )
        .unwrap();

        assert_eq!(source.values.get("replicas").unwrap(), 5);
        assert_eq!(source.values.get("image").unwrap(), "nginx");
        assert_eq!(source.loaded_files.len(), 2);
        assert_eq!(
            source.comments.get("replicas").unwrap().description,
            "Replica count for production"
        );
    }

    #[test]
    fn test_source_without_base_file() {
        let dir = TempDir::new().unwrap();
        let source = ValuesSource::load(dir.path(), &dir.path().join("values.yaml"), &[]).unwrap();
        assert!(source.values.is_empty());
        assert!(source.loaded_files.is_empty());
    }

    #[test]
    fn test_source_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("values.yaml"), "a: [unclosed\n").unwrap();
        let err = ValuesSource::load(dir.path(), &dir.path().join("values.yaml"), &[]).unwrap_err();
        assert!(matches!(err, CoreError::YamlParse { .. }));
    }
}
