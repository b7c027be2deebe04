//! Documentation template filters
//!
//! These filters extend MiniJinja with the string handling Markdown tables
//! and shields.io badges need.

use minijinja::{Error, ErrorKind, Value};

/// Escape text for a shields.io badge path segment
///
/// Usage: {{ chart.version | badge_escape }}
#[must_use]
pub fn badge_escape(value: String) -> String {
    value
        .replace('-', "--")
        .replace('_', "__")
        .replace(' ', "_")
}

/// Make text safe inside a Markdown table cell
///
/// Pipes are escaped and line breaks become `<br>`.
///
/// Usage: {{ row.description | md_escape }}
#[must_use]
pub fn md_escape(value: String) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Convert a value to compact JSON
///
/// Usage: {{ chart.maintainers | tojson }}
pub fn tojson(value: Value) -> Result<String, Error> {
    let json_value: serde_json::Value = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    serde_json::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Indent text with a newline prefix (like Helm's nindent)
///
/// Usage: {{ row.description | nindent(2) }}
#[must_use]
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// Indent every non-empty line
///
/// Usage: {{ content | indent(4) }}
#[must_use]
pub fn indent(value: String, spaces: usize) -> String {
    let line_count = value.lines().count();
    let mut result = String::with_capacity(value.len() + spaces * line_count + line_count);

    let indent_str = " ".repeat(spaces);
    let mut first = true;

    for line in value.lines() {
        if !first {
            result.push('\n');
        }
        first = false;

        if !line.is_empty() {
            result.push_str(&indent_str);
        }
        result.push_str(line);
    }

    result
}

/// Trim prefix from a string
///
/// Usage: {{ chart.version | trimprefix("v") }}
#[must_use]
pub fn trimprefix(value: String, prefix: String) -> String {
    value.strip_prefix(&prefix).unwrap_or(&value).to_string()
}

/// Trim suffix from a string
///
/// Usage: {{ chart.home | trimsuffix("/") }}
#[must_use]
pub fn trimsuffix(value: String, suffix: String) -> String {
    value.strip_suffix(&suffix).unwrap_or(&value).to_string()
}

/// Fall back when a value is undefined, none, or an empty string or collection
///
/// Usage: {{ chart.description | default_if_empty("No description") }}
pub fn default_if_empty(value: Value, fallback: Value) -> Value {
    if is_empty(&value) { fallback } else { value }
}

fn is_empty(value: &Value) -> bool {
    if value.is_undefined() || value.is_none() {
        return true;
    }
    match value.as_str() {
        Some(s) => s.trim().is_empty(),
        None => value.len() == Some(0),
    }
}
