//! CLI error types with exit code handling
//!
//! Per-chart errors are reported and skipped by the generate command; only
//! run-level failures reach `main`.

use chartdoc_core::CoreError;
use chartdoc_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// The search root could not be walked
    #[error("Chart discovery failed: {source}")]
    #[diagnostic(code(chartdoc::cli::discovery))]
    Discovery {
        #[source]
        source: CoreError,
        #[help]
        help: Option<String>,
    },

    /// A chart manifest or values document could not be read
    #[error("Failed to read chart {chart}: {source}")]
    #[diagnostic(code(chartdoc::cli::chart))]
    Chart {
        chart: String,
        #[source]
        source: CoreError,
    },

    /// Template rendering failed
    #[error("Failed to render documentation for {chart}")]
    #[diagnostic(code(chartdoc::cli::template))]
    Render {
        chart: String,
        #[source]
        #[diagnostic_source]
        source: EngineError,
    },

    /// Reading a template or writing a document failed
    #[error("IO error on {path}: {source}")]
    #[diagnostic(code(chartdoc::cli::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Check mode found out-of-date documents
    #[error("{count} document(s) are out of date")]
    #[diagnostic(
        code(chartdoc::cli::stale),
        help("run chartdoc without --check to regenerate them")
    )]
    Stale { count: usize },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(chartdoc::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Stale { .. } => exit_codes::STALE_DOCS,
            _ => exit_codes::ERROR,
        }
    }

    /// Create a discovery error, with a hint for a missing root
    pub fn discovery(source: CoreError) -> Self {
        let help = matches!(source, CoreError::ChartNotFound { .. })
            .then(|| "check the --chart-search-root path".to_string());
        Self::Discovery { source, help }
    }

    /// Create an IO error for a path
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
