//! Chart directory discovery
//!
//! Walks a search root and reports every directory holding a `Chart.yaml`.
//! Directories matched by the ignore file are pruned, so an ignored parent
//! hides every chart below it.

use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::chart::CHART_FILE;
use crate::error::{CoreError, Result};

/// Ignore file looked up in the search root
pub const DEFAULT_IGNORE_FILE: &str = ".chartdocignore";

const PATH_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    dir_only: bool,
    /// Matched against single path components instead of the whole path
    by_name: bool,
}

impl IgnoreRule {
    fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.by_name {
            rel.rsplit('/')
                .next()
                .is_some_and(|name| self.pattern.matches(name))
        } else {
            self.pattern.matches_with(rel, PATH_MATCH)
        }
    }
}

/// Glob patterns read from an ignore file
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    /// Parse ignore file contents
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let dir_only = line.ends_with('/');
            let body = line.trim_end_matches('/');
            let anchored = body.starts_with('/');
            let body = body.trim_start_matches('/');
            if body.is_empty() {
                continue;
            }

            let pattern = Pattern::new(body).map_err(|e| CoreError::IgnorePattern {
                pattern: line.to_string(),
                message: e.to_string(),
            })?;

            rules.push(IgnoreRule {
                pattern,
                dir_only,
                by_name: !anchored && !body.contains('/'),
            });
        }

        Ok(Self { rules })
    }

    /// Read rules from a file; a missing file means no rules
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let rules = Self::parse(&content)?;
        tracing::debug!("Loaded {} ignore rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Check a path relative to the search root
    pub fn is_ignored(&self, rel: &Path, is_dir: bool) -> bool {
        let rel = slash_path(rel);
        self.rules.iter().any(|rule| rule.matches(&rel, is_dir))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Chart finder rooted at a search directory
#[derive(Debug, Clone)]
pub struct ChartDiscovery {
    root: PathBuf,
    ignore_file_name: String,
}

impl ChartDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_file_name: DEFAULT_IGNORE_FILE.to_string(),
        }
    }

    /// Use a different ignore file name (relative to the root)
    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file_name = name.into();
        self
    }

    /// Find chart directories, relative to the root and sorted
    pub fn find(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: self.root.display().to_string(),
            });
        }

        let rules = IgnoreRules::load(&self.root.join(&self.ignore_file_name))?;
        let root = self.root.as_path();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| keep_entry(root, &rules, entry));

        let mut charts = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(CoreError::Walk {
                        path: root.display().to_string(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || entry.file_name() != CHART_FILE {
                continue;
            }

            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let rel = relative_to(root, dir);
            tracing::debug!("Found chart in {}", rel.display());
            charts.push(rel);
        }

        charts.sort();
        tracing::info!("Found {} chart(s) under {}", charts.len(), root.display());
        Ok(charts)
    }
}

/// Find every chart directory under `root`
pub fn find_chart_directories(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    ChartDiscovery::new(root.as_ref()).find()
}

fn keep_entry(root: &Path, rules: &IgnoreRules, entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let is_dir = entry.file_type().is_dir();
    if is_dir && entry.file_name() == ".git" {
        return false;
    }
    let rel = relative_to(root, entry.path());
    if rules.is_ignored(&rel, is_dir) {
        tracing::debug!("Ignoring {}", rel.display());
        return false;
    }
    true
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path.to_path_buf(),
    }
}

/// Render a relative path with `/` separators for glob matching
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chart(root: &Path, rel: &str) {
        let dir = root.join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CHART_FILE),
            "apiVersion: v2\nname: test\nversion: 0.1.0\n",
        )
        .unwrap();
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_finds_nested_charts_sorted() {
        let dir = TempDir::new().unwrap();
        chart(dir.path(), "charts/web");
        chart(dir.path(), "charts/api");
        chart(dir.path(), "charts/api/charts/db");
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();

        let found = find_chart_directories(dir.path()).unwrap();
        assert_eq!(
            found,
            paths(&["charts/api", "charts/api/charts/db", "charts/web"])
        );
    }

    #[test]
    fn test_root_chart_is_dot() {
        let dir = TempDir::new().unwrap();
        chart(dir.path(), "");
        chart(dir.path(), "charts/sub");

        let found = find_chart_directories(dir.path()).unwrap();
        assert_eq!(found, paths(&[".", "charts/sub"]));
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        chart(dir.path(), "charts/keep");
        chart(dir.path(), "charts/legacy");
        chart(dir.path(), "charts/legacy/charts/inner");
        chart(dir.path(), "vendor/thirdparty");
        chart(dir.path(), "charts/keep/tmp-chart");
        std::fs::write(
            dir.path().join(DEFAULT_IGNORE_FILE),
            "# generated\n\n/charts/legacy\nvendor/\ntmp-*\n",
        )
        .unwrap();

        let found = find_chart_directories(dir.path()).unwrap();
        assert_eq!(found, paths(&["charts/keep"]));
    }

    #[test]
    fn test_git_directory_is_skipped() {
        let dir = TempDir::new().unwrap();
        chart(dir.path(), ".git/modules/chart");
        chart(dir.path(), "app");

        let found = find_chart_directories(dir.path()).unwrap();
        assert_eq!(found, paths(&["app"]));
    }

    #[test]
    fn test_custom_ignore_file_name() {
        let dir = TempDir::new().unwrap();
        chart(dir.path(), "a");
        chart(dir.path(), "b");
        std::fs::write(dir.path().join(".docsignore"), "b\n").unwrap();

        let found = ChartDiscovery::new(dir.path())
            .with_ignore_file(".docsignore")
            .find()
            .unwrap();
        assert_eq!(found, paths(&["a"]));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = find_chart_directories(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, CoreError::ChartNotFound { .. }));
    }

    #[test]
    fn test_dir_only_rules_skip_files() {
        let rules = IgnoreRules::parse("build/\n").unwrap();
        assert!(rules.is_ignored(Path::new("x/build"), true));
        assert!(!rules.is_ignored(Path::new("x/build"), false));
    }

    #[test]
    fn test_path_rules_do_not_cross_separators() {
        let rules = IgnoreRules::parse("charts/*\n").unwrap();
        assert!(rules.is_ignored(Path::new("charts/a"), true));
        assert!(!rules.is_ignored(Path::new("charts/a/b"), true));
        assert!(!rules.is_ignored(Path::new("other/charts/a"), true));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreRules::parse("[unclosed\n").unwrap_err();
        assert!(matches!(err, CoreError::IgnorePattern { .. }));
    }
}
