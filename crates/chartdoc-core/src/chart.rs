//! Chart manifest definition and loading

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Name of the manifest file that marks a chart directory
pub const CHART_FILE: &str = "Chart.yaml";

/// Legacy location of dependencies for `apiVersion: v1` charts
pub const REQUIREMENTS_FILE: &str = "requirements.yaml";

/// A Helm chart manifest (`Chart.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartManifest {
    /// API version (v1 or v2)
    #[serde(default)]
    pub api_version: String,

    /// Chart name (required)
    #[serde(default)]
    pub name: String,

    /// Chart version (required, SemVer expected)
    #[serde(default, with = "loose_string")]
    pub version: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Chart type
    #[serde(default, rename = "type")]
    pub kind: Option<ChartKind>,

    /// Application version
    #[serde(default, with = "loose_string_opt")]
    pub app_version: Option<String>,

    /// Kubernetes version constraint
    #[serde(default)]
    pub kube_version: Option<String>,

    /// Home URL
    #[serde(default)]
    pub home: Option<String>,

    /// Icon URL
    #[serde(default)]
    pub icon: Option<String>,

    /// Source URLs
    #[serde(default)]
    pub sources: Vec<String>,

    /// Keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Maintainers
    #[serde(default)]
    pub maintainers: Vec<Maintainer>,

    /// Dependencies
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Whether the chart is deprecated
    #[serde(default)]
    pub deprecated: bool,

    /// Annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Chart type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Application,
    Library,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Library => "library",
        }
    }
}

/// Maintainer information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Maintainer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Chart dependency
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Dependency name
    pub name: String,

    /// Version constraint
    #[serde(default, with = "loose_string")]
    pub version: String,

    /// Repository URL (may be empty for local subcharts)
    #[serde(default)]
    pub repository: String,

    /// Alias name
    #[serde(default)]
    pub alias: Option<String>,

    /// Condition path evaluated by Helm at install time
    #[serde(default)]
    pub condition: Option<String>,

    /// Tags for conditional inclusion
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Dependency {
    /// Get the effective name (alias if set, otherwise name)
    #[inline]
    pub fn effective_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl ChartManifest {
    /// Parse a manifest from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CoreError::yaml(CHART_FILE, e))
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "name".to_string(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "version".to_string(),
            });
        }
        Ok(())
    }

    /// Check if this is a library chart
    pub fn is_library(&self) -> bool {
        self.kind == Some(ChartKind::Library)
    }

    /// Check if the version parses as SemVer
    pub fn has_semver_version(&self) -> bool {
        semver::Version::parse(&self.version).is_ok()
    }
}

/// Contents of a legacy `requirements.yaml`
#[derive(Debug, Default, Deserialize)]
struct Requirements {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

/// A chart with its manifest read from disk
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Chart manifest
    pub manifest: ChartManifest,

    /// Root directory of the chart
    pub root: PathBuf,

    /// Base values file path (may not exist)
    pub values_path: PathBuf,
}

impl LoadedChart {
    /// Load a chart from a directory
    pub fn load<P: AsRef<Path>>(path: P, values_file: &str) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: root.display().to_string(),
            });
        }

        let chart_file = root.join(CHART_FILE);
        if !chart_file.is_file() {
            return Err(CoreError::InvalidChart {
                message: format!("{} not found in {}", CHART_FILE, root.display()),
            });
        }

        let content = std::fs::read_to_string(&chart_file)?;
        let mut manifest = ChartManifest::from_yaml(&content)?;
        manifest.validate()?;

        if !manifest.has_semver_version() {
            tracing::warn!(
                "Chart {} has a non-SemVer version '{}'",
                manifest.name,
                manifest.version
            );
        }

        if manifest.api_version == "v1" {
            let requirements = root.join(REQUIREMENTS_FILE);
            if requirements.is_file() {
                let content = std::fs::read_to_string(&requirements)?;
                let parsed: Option<Requirements> = serde_yaml::from_str(&content)
                    .map_err(|e| CoreError::yaml(REQUIREMENTS_FILE, e))?;
                manifest.dependencies = parsed.unwrap_or_default().dependencies;
                tracing::debug!(
                    "Read {} dependencies from {}",
                    manifest.dependencies.len(),
                    requirements.display()
                );
            }
        }

        let values_path = root.join(values_file);

        Ok(Self {
            manifest,
            root,
            values_path,
        })
    }
}

/// Strings that may be written as YAML numbers (`version: 1.0`)
mod loose_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        super::scalar_to_string(value).map_err(serde::de::Error::custom)
    }
}

mod loose_string_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }
        super::scalar_to_string(value)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

fn scalar_to_string(value: serde_yaml::Value) -> std::result::Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(format!("expected a string, found {:?}", other)),
    }
}
