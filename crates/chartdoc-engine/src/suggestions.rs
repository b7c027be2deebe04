//! Fuzzy matching and context-aware suggestions for template errors
//!
//! Levenshtein distance (via `strsim`) picks close names for misspelled
//! filters, include targets and context keys.

use serde_json::Value as JsonValue;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// All filters available to documentation templates
pub const AVAILABLE_FILTERS: &[&str] = &[
    // Chartdoc filters
    "badge_escape",
    "md_escape",
    "tojson",
    "indent",
    "nindent",
    "trimprefix",
    "trimsuffix",
    "default_if_empty",
    // Built-in MiniJinja filters
    "default",
    "upper",
    "lower",
    "title",
    "capitalize",
    "replace",
    "trim",
    "join",
    "first",
    "last",
    "length",
    "reverse",
    "sort",
    "unique",
    "map",
    "select",
    "reject",
    "selectattr",
    "rejectattr",
    "batch",
    "slice",
    "dictsort",
    "items",
    "attr",
    "int",
    "float",
    "abs",
    "round",
    "string",
    "list",
    "bool",
    "safe",
    "escape",
    "e",
    "urlencode",
];

/// Top-level context variables always available in templates
pub const CONTEXT_VARIABLES: &[&str] = &["chart", "values", "sections", "generator"];

/// Suggestion result with confidence scoring
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(input: &str, candidates: &[&str], max_results: usize) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance <= MAX_SUGGESTION_DISTANCE && distance > 0).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    // Best matches first
    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

fn did_you_mean(matches: &[Suggestion]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }
    let list: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    Some(format!("Did you mean {}?", list.join(" or ")))
}

/// Suggest corrections for an unknown filter
pub fn suggest_unknown_filter(filter_name: &str) -> String {
    let matches = find_closest_matches(filter_name, AVAILABLE_FILTERS, 3);
    did_you_mean(&matches).unwrap_or_else(|| {
        format!(
            "Unknown filter `{}`. Documentation filters: md_escape, badge_escape, tojson, default_if_empty, indent",
            filter_name
        )
    })
}

/// Suggest corrections for an include of a template that does not exist
pub fn suggest_unknown_template(name: &str, known: &[&str]) -> String {
    let matches = find_closest_matches(name, known, 3);
    did_you_mean(&matches).unwrap_or_else(|| {
        format!(
            "No template named `{}`. Built-in snippets start with `chart.`, e.g. `chart.valuesSection`",
            name
        )
    })
}

/// Suggest corrections for an undefined variable such as `chart.nme`
///
/// `context` is the serialized template context; the path is followed until
/// it breaks and the keys available at that point are offered.
pub fn suggest_undefined_variable(expr: &str, context: &JsonValue) -> Option<String> {
    let parts: Vec<&str> = expr.split('.').map(str::trim).collect();
    let mut current = context;
    let mut valid: Vec<&str> = Vec::new();

    for part in &parts {
        match current.get(part) {
            Some(next) => {
                valid.push(part);
                current = next;
            }
            None => {
                let available: Vec<&str> = current
                    .as_object()
                    .map(|obj| obj.keys().map(String::as_str).collect())
                    .unwrap_or_default();
                if available.is_empty() {
                    return None;
                }

                let matches = find_closest_matches(part, &available, 3);
                if valid.is_empty() {
                    return Some(did_you_mean(&matches).unwrap_or_else(|| {
                        format!("Available variables: {}", CONTEXT_VARIABLES.join(", "))
                    }));
                }

                let prefix = valid.join(".");
                return Some(match matches.first() {
                    Some(best) => format!(
                        "Key `{}` not found. Did you mean `{}.{}`?",
                        part, prefix, best.text
                    ),
                    None => format!(
                        "Key `{}` not found in `{}`. Available keys: {}",
                        part,
                        prefix,
                        available.join(", ")
                    ),
                });
            }
        }
    }

    None
}

/// Extract a quoted name from an error message
///
/// MiniJinja quotes template names and some identifiers with either
/// backticks or double quotes.
pub fn extract_quoted(msg: &str) -> Option<String> {
    for quote in ['`', '"', '\''] {
        if let Some(start) = msg.find(quote) {
            let rest = &msg[start + 1..];
            if let Some(end) = rest.find(quote) {
                let name = &rest[..end];
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_suggestion() {
        let suggestion = suggest_unknown_filter("md_escpe");
        assert!(suggestion.contains("`md_escape`"));
    }

    #[test]
    fn test_filter_without_match() {
        let suggestion = suggest_unknown_filter("completely_unrelated");
        assert!(suggestion.starts_with("Unknown filter"));
    }

    #[test]
    fn test_template_suggestion() {
        let known = ["chart.valuesSection", "chart.valuesTable", "chart.header"];
        let suggestion = suggest_unknown_template("chart.valueSection", &known);
        assert_eq!(suggestion, "Did you mean `chart.valuesSection`?");
    }

    #[test]
    fn test_undefined_key_suggestion() {
        let context = json!({"chart": {"name": "x", "version": "1.0.0"}, "values": []});
        let suggestion = suggest_undefined_variable("chart.nmae", &context).unwrap();
        assert!(suggestion.contains("`chart.name`"));

        let suggestion = suggest_undefined_variable("chrt", &context).unwrap();
        assert!(suggestion.contains("`chart`"));
    }

    #[test]
    fn test_extract_quoted() {
        assert_eq!(
            extract_quoted("template not found: template \"chart.x\" does not exist"),
            Some("chart.x".to_string())
        );
        assert_eq!(extract_quoted("nothing here"), None);
    }
}
