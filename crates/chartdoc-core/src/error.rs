//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Chart not found: {path}")]
    ChartNotFound { path: String },

    #[error("Invalid Chart.yaml: {message}")]
    InvalidChart { message: String },

    #[error("Failed to parse {file}: {source}")]
    YamlParse {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk {path}: {message}")]
    Walk { path: String, message: String },

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    IgnorePattern { pattern: String, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

impl CoreError {
    /// Wrap a YAML error with the file it came from
    pub fn yaml(file: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::YamlParse {
            file: file.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
