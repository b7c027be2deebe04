//! Chartdoc Engine - Jinja2 rendering of chart documentation
//!
//! This crate provides a MiniJinja-based documentation engine with:
//! - Named built-in snippets (`chart.valuesTable`, `chart.badgesSection`, ...)
//! - Markdown and badge filters
//! - Human-readable error messages with suggestions

pub mod engine;
pub mod error;
pub mod filters;
pub mod suggestions;
pub mod templates;

pub use engine::{DocEngine, DocEngineBuilder, GENERATOR_NAME};
pub use error::{EngineError, TemplateError, TemplateErrorKind};
pub use suggestions::AVAILABLE_FILTERS;
pub use templates::{DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_NAME};
