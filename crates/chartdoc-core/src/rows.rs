//! Flattening values into documented rows
//!
//! Every leaf of the merged values tree becomes a [`ValueRow`] carrying its
//! key path, type, default and description. Comment annotations win over
//! schema hints, which win over inference from the value itself.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use crate::comments::{push_index, push_key, Annotation, CommentIndex};
use crate::schema::SchemaHints;
use crate::values::Values;

/// One documented configuration key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRow {
    /// Key path (`image.tag`, `hosts[0].name`)
    pub key: String,

    /// Type name (`string`, `int`, `float`, `bool`, `list`, `object`, or explicit)
    #[serde(rename = "type")]
    pub value_type: String,

    /// Default shown in documentation
    pub default: String,

    /// Default inferred from the value, in backticks
    pub auto_default: String,

    /// Description from comments
    pub description: String,

    /// Description from the values schema, used when there is no comment
    pub auto_description: String,

    /// Section from `@section`
    pub section: Option<String>,
}

impl ValueRow {
    /// Whether any description is available
    pub fn has_description(&self) -> bool {
        !self.description.is_empty() || !self.auto_description.is_empty()
    }
}

/// Row ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort by key path
    #[default]
    Alphabetical,
    /// Keep the order keys appear in the merged values documents
    File,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alphabetical" => Ok(Self::Alphabetical),
            "file" => Ok(Self::File),
            other => Err(format!(
                "invalid sort order '{}', expected 'alphabetical' or 'file'",
                other
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alphabetical => write!(f, "alphabetical"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Options for row extraction
#[derive(Debug, Clone, Default)]
pub struct RowOptions {
    pub sort_order: SortOrder,

    /// Drop rows that have neither a comment nor a schema description
    pub ignore_non_descriptions: bool,
}

/// Rows of one `@section`
#[derive(Debug, Clone, Serialize)]
pub struct ValueSection {
    pub name: String,
    pub rows: Vec<ValueRow>,
}

/// Rows grouped by section
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueSections {
    /// Rows without a section
    pub unsectioned: Vec<ValueRow>,

    /// Named sections in order of first appearance
    pub sections: Vec<ValueSection>,
}

/// Flatten merged values into documentation rows
pub fn extract_rows(
    values: &Values,
    comments: &CommentIndex,
    schema: &SchemaHints,
    options: &RowOptions,
) -> Vec<ValueRow> {
    let mut walker = Walker {
        comments,
        schema,
        rows: Vec::new(),
    };

    if let JsonValue::Object(map) = values.inner() {
        walker.walk_mapping("", map);
    }

    let mut rows = walker.rows;

    if options.ignore_non_descriptions {
        rows.retain(ValueRow::has_description);
    }

    if options.sort_order == SortOrder::Alphabetical {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    rows
}

/// Group rows by their `@section`, keeping row order within each group
pub fn group_sections(rows: &[ValueRow]) -> ValueSections {
    let mut grouped = ValueSections::default();

    for row in rows {
        match &row.section {
            None => grouped.unsectioned.push(row.clone()),
            Some(name) => match grouped.sections.iter_mut().find(|s| &s.name == name) {
                Some(section) => section.rows.push(row.clone()),
                None => grouped.sections.push(ValueSection {
                    name: name.clone(),
                    rows: vec![row.clone()],
                }),
            },
        }
    }

    grouped
}

/// Type name inferred from a value
pub fn infer_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(n) if n.is_f64() => "float",
        JsonValue::Number(_) => "int",
        JsonValue::String(_) | JsonValue::Null => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

/// Default rendered as compact JSON in backticks (`nil` for null)
pub fn format_default(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "`nil`".to_string(),
        other => format!("`{}`", other),
    }
}

struct Walker<'a> {
    comments: &'a CommentIndex,
    schema: &'a SchemaHints,
    rows: Vec<ValueRow>,
}

impl Walker<'_> {
    fn walk_mapping(&mut self, prefix: &str, map: &serde_json::Map<String, JsonValue>) {
        for (key, value) in map {
            let path = push_key(prefix, key);
            self.walk(path, value);
        }
    }

    fn walk(&mut self, path: String, value: &JsonValue) {
        let comments = self.comments;
        let annotation = comments.get(&path);
        if annotation.is_some_and(|a| a.ignored) {
            return;
        }
        let documented = annotation.is_some_and(Annotation::is_documented);

        match value {
            JsonValue::Object(map) if !map.is_empty() => {
                if documented {
                    self.push_row(&path, value, annotation);
                }
                self.walk_mapping(&path, map);
            }
            JsonValue::Array(items) if items.iter().any(JsonValue::is_object) => {
                if documented {
                    self.push_row(&path, value, annotation);
                }
                for (i, item) in items.iter().enumerate() {
                    let item_path = push_index(&path, i);
                    if item.is_object() {
                        self.walk(item_path, item);
                    } else if let Some(a) = comments.get(&item_path) {
                        // Loose scalars in a list of mappings only when documented
                        if a.is_documented() && !a.ignored {
                            self.push_row(&item_path, item, Some(a));
                        }
                    }
                }
            }
            _ => self.push_row(&path, value, annotation),
        }
    }

    fn push_row(&mut self, path: &str, value: &JsonValue, annotation: Option<&Annotation>) {
        let hint = self.schema.get(path);

        let value_type = annotation
            .and_then(|a| a.value_type.clone())
            .or_else(|| hint.and_then(|h| h.value_type.clone()))
            .unwrap_or_else(|| infer_type(value).to_string());

        let auto_default = format_default(value);
        let default = annotation
            .and_then(|a| a.default.clone())
            .unwrap_or_else(|| auto_default.clone());

        let description = annotation
            .map(|a| a.description.clone())
            .unwrap_or_default();

        let auto_description = if description.is_empty() {
            hint.and_then(|h| h.description.clone()).unwrap_or_default()
        } else {
            String::new()
        };

        self.rows.push(ValueRow {
            key: path.to_string(),
            value_type,
            default,
            auto_default,
            description,
            auto_description,
            section: annotation.and_then(|a| a.section.clone()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: &str = r#"
# -- Number of replicas
replicaCount: 1

image:
  # -- Image repository
  repository: nginx
  # -- (string) Image tag
  # @default -- The chart appVersion
  tag: ""
  pullPolicy: IfNotPresent

# -- Extra labels
podLabels: {}

tolerations: []

args:
  - --verbose
  - --port=8080

# @ignored
internal:
  secret: hunter2

# -- Resource requests
resources:
  limits:
    cpu: 100m

ingress:
  hosts:
    - host: chart-example.local
      # -- Path list
      paths: []

# -- Optional override
# @section -- Advanced
nameOverride: null

ratio: 0.5
debug: false
"#;

    fn rows(options: &RowOptions) -> Vec<ValueRow> {
        let values = Values::from_yaml(VALUES).unwrap();
        let comments = CommentIndex::scan(VALUES);
        extract_rows(&values, &comments, &SchemaHints::default(), options)
    }

    fn find<'a>(rows: &'a [ValueRow], key: &str) -> &'a ValueRow {
        rows.iter()
            .find(|r| r.key == key)
            .unwrap_or_else(|| panic!("no row for {}", key))
    }

    #[test]
    fn test_scalar_rows() {
        let rows = rows(&RowOptions::default());

        let replicas = find(&rows, "replicaCount");
        assert_eq!(replicas.value_type, "int");
        assert_eq!(replicas.default, "`1`");
        assert_eq!(replicas.description, "Number of replicas");

        let policy = find(&rows, "image.pullPolicy");
        assert_eq!(policy.value_type, "string");
        assert_eq!(policy.default, "`\"IfNotPresent\"`");
        assert!(policy.description.is_empty());

        assert_eq!(find(&rows, "ratio").value_type, "float");
        assert_eq!(find(&rows, "debug").value_type, "bool");
        assert_eq!(find(&rows, "debug").default, "`false`");
    }

    #[test]
    fn test_explicit_type_and_default() {
        let rows = rows(&RowOptions::default());
        let tag = find(&rows, "image.tag");

        assert_eq!(tag.value_type, "string");
        assert_eq!(tag.default, "The chart appVersion");
        assert_eq!(tag.auto_default, "`\"\"`");
    }

    #[test]
    fn test_collections() {
        let rows = rows(&RowOptions::default());

        assert_eq!(find(&rows, "podLabels").default, "`{}`");
        assert_eq!(find(&rows, "podLabels").value_type, "object");
        assert_eq!(find(&rows, "tolerations").default, "`[]`");
        assert_eq!(find(&rows, "tolerations").value_type, "list");

        let args = find(&rows, "args");
        assert_eq!(args.value_type, "list");
        assert_eq!(args.default, "`[\"--verbose\",\"--port=8080\"]`");
        assert!(!rows.iter().any(|r| r.key.starts_with("args[")));
    }

    #[test]
    fn test_documented_object_keeps_children() {
        let rows = rows(&RowOptions::default());

        let resources = find(&rows, "resources");
        assert_eq!(resources.value_type, "object");
        assert_eq!(resources.default, "`{\"limits\":{\"cpu\":\"100m\"}}`");
        assert_eq!(find(&rows, "resources.limits.cpu").default, "`\"100m\"`");

        // Undocumented non-empty objects have no row of their own
        assert!(!rows.iter().any(|r| r.key == "image"));
    }

    #[test]
    fn test_list_of_mappings_is_indexed() {
        let rows = rows(&RowOptions::default());

        assert_eq!(
            find(&rows, "ingress.hosts[0].host").default,
            "`\"chart-example.local\"`"
        );
        assert_eq!(find(&rows, "ingress.hosts[0].paths").description, "Path list");
        assert!(!rows.iter().any(|r| r.key == "ingress.hosts"));
    }

    #[test]
    fn test_merge_keys_are_resolved() {
        let yaml = r#"
defaults: &defaults
  # -- Shared timeout
  timeout: 30
svc:
  <<: *defaults
  # -- Service port
  port: 80
"#;
        let values = Values::from_yaml(yaml).unwrap();
        let comments = CommentIndex::scan(yaml);
        let rows = extract_rows(
            &values,
            &comments,
            &SchemaHints::default(),
            &RowOptions::default(),
        );

        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["defaults.timeout", "svc.port", "svc.timeout"]);
        assert_eq!(find(&rows, "svc.timeout").default, "`30`");
        assert_eq!(find(&rows, "svc.port").description, "Service port");
    }

    #[test]
    fn test_ignored_subtree() {
        let rows = rows(&RowOptions::default());
        assert!(!rows.iter().any(|r| r.key.starts_with("internal")));
    }

    #[test]
    fn test_null_default_and_section() {
        let rows = rows(&RowOptions::default());
        let name = find(&rows, "nameOverride");

        assert_eq!(name.value_type, "string");
        assert_eq!(name.default, "`nil`");
        assert_eq!(name.section.as_deref(), Some("Advanced"));
    }

    #[test]
    fn test_alphabetical_order() {
        let rows = rows(&RowOptions::default());
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_file_order() {
        let rows = rows(&RowOptions {
            sort_order: SortOrder::File,
            ..Default::default()
        });
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).take(4).collect();
        assert_eq!(
            keys,
            ["replicaCount", "image.repository", "image.tag", "image.pullPolicy"]
        );
    }

    #[test]
    fn test_ignore_non_descriptions() {
        let rows = rows(&RowOptions {
            ignore_non_descriptions: true,
            ..Default::default()
        });
        assert!(rows.iter().all(ValueRow::has_description));
        assert!(!rows.iter().any(|r| r.key == "image.pullPolicy"));
    }

    #[test]
    fn test_schema_hints_fill_gaps() {
        let values = Values::from_yaml("port: 80\n# -- From comment\nhost: x\n").unwrap();
        let comments = CommentIndex::scan("port: 80\n# -- From comment\nhost: x\n");
        let schema = SchemaHints::from_json(
            r#"{"properties": {
                "port": {"type": "integer", "description": "Service port"},
                "host": {"type": "string", "description": "Ignored, comment wins"}
            }}"#,
        )
        .unwrap();

        let rows = extract_rows(&values, &comments, &schema, &RowOptions::default());
        let port = find(&rows, "port");
        assert_eq!(port.auto_description, "Service port");
        assert!(port.description.is_empty());

        let host = find(&rows, "host");
        assert_eq!(host.description, "From comment");
        assert!(host.auto_description.is_empty());
    }

    #[test]
    fn test_group_sections() {
        let rows = rows(&RowOptions {
            sort_order: SortOrder::File,
            ..Default::default()
        });
        let grouped = group_sections(&rows);

        assert_eq!(grouped.sections.len(), 1);
        assert_eq!(grouped.sections[0].name, "Advanced");
        assert_eq!(grouped.sections[0].rows[0].key, "nameOverride");
        assert_eq!(grouped.unsectioned.len() + 1, rows.len());
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("file".parse::<SortOrder>().unwrap(), SortOrder::File);
        assert_eq!(
            "Alphabetical".parse::<SortOrder>().unwrap(),
            SortOrder::Alphabetical
        );
        assert!("random".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::File.to_string(), "file");
    }
}
