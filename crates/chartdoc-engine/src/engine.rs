//! Documentation engine based on MiniJinja

use chartdoc_core::ChartDoc;
use minijinja::Environment;

use crate::error::{ErrorContext, Result, TemplateError};
use crate::filters;
use crate::templates::{self, DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_NAME};

/// Name exposed to templates as `generator.name`
pub const GENERATOR_NAME: &str = "chartdoc";

/// Documentation engine builder
pub struct DocEngineBuilder {
    strict_mode: bool,
    generator_version: String,
}

impl Default for DocEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocEngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            generator_version: String::new(),
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Version shown in the generated footer
    pub fn generator_version(mut self, version: impl Into<String>) -> Self {
        self.generator_version = version.into();
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<DocEngine> {
        DocEngine::new(self.strict_mode, self.generator_version)
    }
}

/// The documentation engine
///
/// Holds an environment with every built-in snippet registered. Each render
/// works on a copy, so user templates never leak between charts.
pub struct DocEngine {
    env: Environment<'static>,
    generator_version: String,
}

impl DocEngine {
    /// Create an engine with built-in snippets registered
    pub fn new(strict_mode: bool, generator_version: String) -> Result<Self> {
        let mut env = Environment::new();

        if strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }
        env.set_keep_trailing_newline(true);
        env.set_debug(true);

        env.add_filter("badge_escape", filters::badge_escape);
        env.add_filter("md_escape", filters::md_escape);
        env.add_filter("tojson", filters::tojson);
        env.add_filter("indent", filters::indent);
        env.add_filter("nindent", filters::nindent);
        env.add_filter("trimprefix", filters::trimprefix);
        env.add_filter("trimsuffix", filters::trimsuffix);
        env.add_filter("default_if_empty", filters::default_if_empty);

        let builtin_names = templates::snippet_names();
        let known = ErrorContext {
            context: None,
            templates: &builtin_names,
        };

        let builtins = templates::snippets()
            .into_iter()
            .chain(std::iter::once((DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE.to_string())));
        for (name, source) in builtins {
            env.add_template_owned(name, source.clone())
                .map_err(|e| TemplateError::from_minijinja(&e, name, &source, &known))?;
        }

        Ok(Self {
            env,
            generator_version,
        })
    }

    /// Create a builder
    pub fn builder() -> DocEngineBuilder {
        DocEngineBuilder::new()
    }

    /// Render documentation for one chart
    ///
    /// Every `(name, source)` template is registered so they can include each
    /// other; the first one is rendered. With no templates the built-in
    /// document is rendered.
    pub fn render(&self, doc: &ChartDoc, templates: &[(String, String)]) -> Result<String> {
        let mut env = self.env.clone();

        let mut names = templates::snippet_names();
        names.extend(templates.iter().map(|(name, _)| name.as_str()));

        for (name, source) in templates {
            env.add_template_owned(name.clone(), source.clone())
                .map_err(|e| {
                    let known = ErrorContext {
                        context: None,
                        templates: &names,
                    };
                    TemplateError::from_minijinja(&e, name, source, &known)
                })?;
        }

        let entry = templates
            .first()
            .map(|(name, _)| name.as_str())
            .unwrap_or(DEFAULT_TEMPLATE_NAME);

        let ctx = minijinja::context! {
            chart => &doc.chart,
            values => &doc.values,
            sections => &doc.sections,
            generator => minijinja::context! {
                name => GENERATOR_NAME,
                version => &self.generator_version,
            },
        };

        let rendered = env
            .get_template(entry)
            .and_then(|tmpl| tmpl.render(&ctx))
            .map_err(|e| {
                // Errors raised inside an include point at that snippet
                let failing = e.name().unwrap_or(entry);
                let source = env
                    .get_template(failing)
                    .map(|t| t.source().to_string())
                    .unwrap_or_default();
                let context = serde_json::to_value(&ctx).ok();
                let known = ErrorContext {
                    context: context.as_ref(),
                    templates: &names,
                };
                TemplateError::from_minijinja(&e, failing, &source, &known)
            })?;

        tracing::debug!(
            "Rendered {} for chart {}",
            entry,
            doc.chart.name
        );

        if templates.is_empty() {
            Ok(tidy_blank_lines(&rendered))
        } else {
            Ok(rendered)
        }
    }
}

/// Collapse runs of blank lines left by empty sections
fn tidy_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, TemplateErrorKind};
    use chartdoc_core::{
        ChartManifest, CommentIndex, RowOptions, SchemaHints, Values, extract_rows,
    };

    const CHART: &str = r#"
apiVersion: v2
name: web-app
version: 1.2.0-rc_1
type: application
appVersion: "3.1"
description: A small web application
home: https://example.com/web-app
sources:
  - https://github.com/example/web-app
maintainers:
  - name: Jane
    email: jane@example.com
dependencies:
  - name: redis
    version: 17.x.x
    repository: https://charts.example.com
    alias: cache
"#;

    const VALUES: &str = r#"
# -- Number of replicas
replicaCount: 1
image:
  # -- Image repository
  repository: nginx
  # -- Pull policy | cached
  pullPolicy: IfNotPresent
# -- Extra labels
# @section -- Metadata
labels: {}
"#;

    fn doc() -> ChartDoc {
        let manifest = ChartManifest::from_yaml(CHART).unwrap();
        let values = Values::from_yaml(VALUES).unwrap();
        let comments = CommentIndex::scan(VALUES);
        let rows = extract_rows(
            &values,
            &comments,
            &SchemaHints::default(),
            &RowOptions::default(),
        );
        ChartDoc::new(manifest, rows)
    }

    fn engine() -> DocEngine {
        DocEngine::builder().generator_version("0.2.0").build().unwrap()
    }

    fn template(name: &str, source: &str) -> Vec<(String, String)> {
        vec![(name.to_string(), source.to_string())]
    }

    #[test]
    fn test_default_document() {
        let out = engine().render(&doc(), &[]).unwrap();

        assert!(out.starts_with("# web-app\n\n"));
        assert!(out.contains(
            "![Version: 1.2.0-rc_1](https://img.shields.io/badge/Version-1.2.0--rc__1-informational?style=flat-square)"
        ));
        assert!(out.contains("![AppVersion: 3.1]"));
        assert!(out.contains("A small web application"));
        assert!(out.contains("**Homepage:** <https://example.com/web-app>"));
        assert!(out.contains("| Jane | <jane@example.com> |  |"));
        assert!(out.contains("* <https://github.com/example/web-app>"));
        assert!(out.contains("| https://charts.example.com | redis(cache) | 17.x.x |"));
        assert!(out.contains("| replicaCount | int | `1` | Number of replicas |"));
        assert!(out.contains("| image.pullPolicy | string | `\"IfNotPresent\"` | Pull policy \\| cached |"));
        assert!(out.contains("Autogenerated from chart metadata using chartdoc v0.2.0"));
        assert!(!out.contains("deprecated"));
        assert!(!out.contains("\n\n\n"));
        assert!(out.ends_with("v0.2.0\n"));
    }

    #[test]
    fn test_user_template_with_includes() {
        let out = engine()
            .render(
                &doc(),
                &template(
                    "README.md.j2",
                    "{% include \"chart.header\" %}\n\n{% include \"chart.valuesSectionsTables\" %}\n",
                ),
            )
            .unwrap();

        assert!(out.starts_with("# web-app\n\n### Metadata\n\n| Key | Type | Default | Description |"));
        assert!(out.contains("| labels | object | `{}` | Extra labels |"));
        assert!(out.contains("### Other Values"));
        assert!(out.ends_with("|\n"));
    }

    #[test]
    fn test_first_template_is_rendered() {
        let templates = vec![
            (
                "main.j2".to_string(),
                "{% include \"extra.j2\" %}: {{ values | length }}".to_string(),
            ),
            ("extra.j2".to_string(), "rows".to_string()),
        ];
        let out = engine().render(&doc(), &templates).unwrap();
        assert_eq!(out, "rows: 4");
    }

    #[test]
    fn test_generator_context() {
        let out = engine()
            .render(&doc(), &template("t", "{{ generator.name }} {{ generator.version }}"))
            .unwrap();
        assert_eq!(out, "chartdoc 0.2.0");
    }

    #[test]
    fn test_unknown_include_suggests_snippet() {
        let err = engine()
            .render(&doc(), &template("t", "{% include \"chart.valueSection\" %}"))
            .unwrap_err();

        let EngineError::Template(err) = err else {
            panic!("expected template error");
        };
        assert_eq!(err.kind(), TemplateErrorKind::UnknownTemplate);
        assert_eq!(
            miette::Diagnostic::code(&err).map(|c| c.to_string()).as_deref(),
            Some("chartdoc::template::unknown_template")
        );
        assert_eq!(
            err.suggestion.as_deref(),
            Some("Did you mean `chart.valuesSection`?")
        );
    }

    #[test]
    fn test_undefined_key_in_strict_mode() {
        let err = engine()
            .render(&doc(), &template("t", "line\n{{ chart.nmae.x }}"))
            .unwrap_err();

        let EngineError::Template(err) = err else {
            panic!("expected template error");
        };
        assert_eq!(err.kind(), TemplateErrorKind::UndefinedVariable);
        assert!(err.span.is_some());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = engine()
            .render(&doc(), &template("t", "{% if chart.name %}unterminated"))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Template(ref e) if e.kind() == TemplateErrorKind::SyntaxError
        ));
    }

    #[test]
    fn test_lenient_mode_renders_missing_as_empty() {
        let engine = DocEngine::builder().strict(false).build().unwrap();
        let out = engine
            .render(&doc(), &template("t", "[{{ chart.missing }}]"))
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_tidy_blank_lines() {
        assert_eq!(tidy_blank_lines("\n# a\n\n\n\nb  \n\n"), "# a\n\nb\n");
    }
}
