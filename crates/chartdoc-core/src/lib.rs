//! Chartdoc Core - Chart discovery and values metadata extraction
//!
//! This crate provides the data side of documentation generation:
//! - `discovery`: Finding chart directories under a search root
//! - `chart`: The `Chart.yaml` manifest
//! - `values`: Layered values documents with deep merge
//! - `comments`: `# --` documentation comments keyed by value path
//! - `rows`: Flattening values into typed, described rows
//! - `context`: The per-chart documentation context

pub mod chart;
pub mod comments;
pub mod context;
pub mod discovery;
pub mod error;
pub mod rows;
pub mod schema;
pub mod values;

pub use chart::{ChartKind, ChartManifest, Dependency, LoadedChart, Maintainer};
pub use comments::{Annotation, CommentIndex};
pub use context::ChartDoc;
pub use discovery::{ChartDiscovery, IgnoreRules, find_chart_directories};
pub use error::{CoreError, Result};
pub use rows::{
    RowOptions, SortOrder, ValueRow, ValueSection, ValueSections, extract_rows, group_sections,
};
pub use schema::SchemaHints;
pub use values::{Values, ValuesSource};
