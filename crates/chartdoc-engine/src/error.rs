//! Engine error types with source-mapped diagnostics

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use std::fmt::Display;
use thiserror::Error;

use crate::suggestions::{
    extract_quoted, suggest_undefined_variable, suggest_unknown_filter, suggest_unknown_template,
};

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownTemplate,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

impl TemplateErrorKind {
    /// Convert to a code string for diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownTemplate => "unknown_template",
            Self::SyntaxError => "syntax",
            Self::TypeError => "type",
            Self::InvalidOperation => "invalid_operation",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
///
/// The diagnostic code follows the kind, e.g.
/// `chartdoc::template::unknown_filter`.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Template source code
    pub src: NamedSource<String>,

    /// Error location in source
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    pub suggestion: Option<String>,
}

impl Diagnostic for TemplateError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(format!(
            "chartdoc::template::{}",
            self.kind.to_code_string()
        )))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some("error occurred here".to_string()),
            span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.suggestion
            .as_ref()
            .map(|s| Box::new(s) as Box<dyn Display + 'a>)
    }
}

/// What the renderer knows when turning a MiniJinja error into a diagnostic
pub struct ErrorContext<'a> {
    /// Serialized template context, for key suggestions
    pub context: Option<&'a serde_json::Value>,

    /// Every registered template name, for include suggestions
    pub templates: &'a [&'a str],
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(
        err: &minijinja::Error,
        template_name: &str,
        template_source: &str,
        known: &ErrorContext<'_>,
    ) -> Self {
        let (kind, message) = categorize_minijinja_error(err);
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));
        let suggestion = generate_suggestion(err, kind, known);

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Categorize a MiniJinja error into our error kinds
fn categorize_minijinja_error(err: &minijinja::Error) -> (TemplateErrorKind, String) {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    let kind = match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::TemplateNotFound => TemplateErrorKind::UnknownTemplate,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    };

    let message = match kind {
        TemplateErrorKind::UndefinedVariable => match extract_expression_from_display(&detailed) {
            Some(expr) => format!("undefined variable `{}`", expr),
            None => msg.replace("undefined value", "undefined variable"),
        },
        TemplateErrorKind::UnknownFilter => match extract_filter_name(&detailed, &msg) {
            Some(filter) => format!("unknown filter `{}`", filter),
            None => msg,
        },
        _ => msg
            .replace("invalid operation: ", "")
            .replace("syntax error: ", ""),
    };

    (kind, message)
}

/// The `{{ ... }}` expression on the line MiniJinja marks with `>`
fn error_line_expression(display: &str) -> Option<&str> {
    // MiniJinja format:
    //    8 >   typo: {{ chart.nmae }}
    //      i            ^^^^^^^^^^ undefined value
    let line = display.lines().find(|line| {
        let trimmed = line.trim_start();
        trimmed.contains(" > ") || trimmed.starts_with("> ")
    })?;
    let start = line.find("{{")?;
    let end = line[start..].find("}}")?;
    Some(&line[start + 2..start + end])
}

/// Extract the problematic expression from MiniJinja's detailed display
fn extract_expression_from_display(display: &str) -> Option<String> {
    let expr = error_line_expression(display)?;
    let head = expr.split('|').next().unwrap_or(expr).trim();
    (!head.is_empty()).then(|| head.to_string())
}

/// Extract the filter name from MiniJinja's detailed display
fn extract_filter_from_display(display: &str) -> Option<String> {
    let expr = error_line_expression(display)?;
    let pipe = expr.rfind('|')?;
    let name = expr[pipe + 1..]
        .trim()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Filter name from the marked source line, else from the message text
fn extract_filter_name(display: &str, msg: &str) -> Option<String> {
    extract_filter_from_display(display).or_else(|| {
        let words: Vec<&str> = msg.split_whitespace().collect();
        words.windows(2).find_map(|pair| {
            let name = pair[1].trim_matches(|c: char| !(c.is_alphanumeric() || c == '_'));
            (pair[0] == "filter" && !name.is_empty() && name != "is" && name != "unknown")
                .then(|| name.to_string())
        })
    })
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.lines().enumerate() {
        if index + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

/// Generate context-aware suggestions based on error kind
fn generate_suggestion(
    err: &minijinja::Error,
    kind: TemplateErrorKind,
    known: &ErrorContext<'_>,
) -> Option<String> {
    let msg = err.to_string();
    let detailed = format!("{:#}", err);

    match kind {
        TemplateErrorKind::UndefinedVariable => {
            let expr = extract_expression_from_display(&detailed)?;
            if expr == "value" || expr.starts_with("value.") {
                return Some(
                    "Did you mean `values`? Rows are exposed as the `values` list".to_string(),
                );
            }
            suggest_undefined_variable(&expr, known.context?)
        }
        TemplateErrorKind::UnknownFilter => {
            let name = extract_filter_name(&detailed, &msg)?;
            Some(suggest_unknown_filter(&name))
        }
        TemplateErrorKind::UnknownTemplate => {
            let name = extract_quoted(&msg)?;
            Some(suggest_unknown_template(&name, known.templates))
        }
        TemplateErrorKind::SyntaxError => Some(
            "Check the Jinja2 syntax: tags close with `%}`, expressions with `}}`".to_string(),
        ),
        TemplateErrorKind::TypeError => Some(
            "`values` is a list of rows; iterate it with `{% for row in values %}`".to_string(),
        ),
        _ => None,
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
