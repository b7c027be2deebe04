//! Generate command - document every chart under the search root

use chartdoc_core::{
    ChartDiscovery, ChartDoc, LoadedChart, RowOptions, SchemaHints, ValuesSource, extract_rows,
};
use chartdoc_engine::DocEngine;
use console::style;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};
use crate::output::{self, OutputMode, Outcome};

/// Settings for one run, resolved from flags and environment
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub search_root: PathBuf,
    pub template_files: Vec<String>,
    pub values_file: String,
    pub custom_values_files: Vec<String>,
    pub output_file: String,
    pub ignore_file: String,
    pub rows: RowOptions,
    pub mode: OutputMode,
}

/// Counts reported at the end of a run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub written: usize,
    pub unchanged: usize,
    pub printed: usize,
    pub stale: usize,
    pub skipped: usize,
}

impl Summary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Printed => self.printed += 1,
            Outcome::Written => self.written += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Stale { .. } => self.stale += 1,
        }
    }
}

pub fn run(options: &GenerateOptions) -> Result<Summary> {
    let root = absolute_root(&options.search_root)?;

    let charts = ChartDiscovery::new(&root)
        .with_ignore_file(&options.ignore_file)
        .find()
        .map_err(CliError::discovery)?;

    let engine = DocEngine::builder()
        .generator_version(env!("CARGO_PKG_VERSION"))
        .build()
        .map_err(|e| CliError::internal(format!("built-in templates failed to load: {}", e)))?;

    let process = |rel: &PathBuf| (rel.clone(), document_chart(&engine, &root, rel, options));

    // Printed documents must not interleave
    let results: Vec<(PathBuf, Result<Outcome>)> = if options.mode == OutputMode::DryRun {
        charts.iter().map(process).collect()
    } else {
        charts.par_iter().map(process).collect()
    };

    let mut summary = Summary::default();

    for (rel, result) in results {
        match result {
            Ok(outcome) => {
                if let Outcome::Stale { diff } = &outcome {
                    print!("{}", diff);
                }
                summary.record(&outcome);
            }
            Err(err) => {
                summary.skipped += 1;
                tracing::warn!("Skipping chart {}: {}", rel.display(), err);
                if let CliError::Render { source, .. } = err {
                    eprintln!("{:?}", miette::Report::new(source));
                }
            }
        }
    }

    print_summary(&summary, options.mode);

    if options.mode == OutputMode::Check && summary.stale > 0 {
        return Err(CliError::Stale {
            count: summary.stale,
        });
    }

    Ok(summary)
}

/// Run the full pipeline for one chart directory
fn document_chart(
    engine: &DocEngine,
    root: &Path,
    rel: &Path,
    options: &GenerateOptions,
) -> Result<Outcome> {
    let chart_dir = root.join(rel);
    let chart_name = rel.display().to_string();
    let chart_err = |source| CliError::Chart {
        chart: chart_name.clone(),
        source,
    };

    let chart = LoadedChart::load(&chart_dir, &options.values_file).map_err(chart_err)?;
    let source = ValuesSource::load(
        &chart.root,
        &chart.values_path,
        &options.custom_values_files,
    )
    .map_err(chart_err)?;
    tracing::debug!(
        "Chart {} values from [{}]",
        chart_name,
        source.loaded_files.join(", ")
    );
    let schema = SchemaHints::load(&chart.root);

    let rows = extract_rows(&source.values, &source.comments, &schema, &options.rows);
    tracing::debug!("Chart {} has {} value rows", chart_name, rows.len());
    let doc = ChartDoc::new(chart.manifest, rows);

    let templates = load_templates(root, &chart_dir, &options.template_files)?;
    if templates.is_empty() {
        tracing::debug!("No template files for {}, using the built-in document", chart_name);
    }

    let rendered = engine
        .render(&doc, &templates)
        .map_err(|source| CliError::Render {
            chart: chart_name.clone(),
            source,
        })?;

    output::emit(options.mode, &chart_dir.join(&options.output_file), &rendered)
}

/// Resolve a template path
///
/// Absolute paths are used as-is, `./` paths are relative to the chart and
/// anything else is relative to the search root.
pub fn resolve_template(root: &Path, chart_dir: &Path, template: &str) -> PathBuf {
    let path = Path::new(template);
    if path.is_absolute() {
        path.to_path_buf()
    } else if let Some(rest) = template.strip_prefix("./") {
        chart_dir.join(rest)
    } else {
        root.join(path)
    }
}

/// Read every existing template file as `(name, source)`; missing ones are skipped
fn load_templates(
    root: &Path,
    chart_dir: &Path,
    templates: &[String],
) -> Result<Vec<(String, String)>> {
    let mut loaded = Vec::new();

    for template in templates {
        let path = resolve_template(root, chart_dir, template);
        if !path.is_file() {
            tracing::debug!("Template {} not found, skipping", path.display());
            continue;
        }
        let source = std::fs::read_to_string(&path).map_err(|e| CliError::io(&path, e))?;
        loaded.push((template.clone(), source));
    }

    Ok(loaded)
}

fn absolute_root(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| CliError::io(Path::new("."), e))?;
    if root == Path::new(".") {
        return Ok(cwd);
    }
    Ok(cwd.join(root))
}

fn print_summary(summary: &Summary, mode: OutputMode) {
    let skipped = if summary.skipped > 0 {
        style(format!("{} skipped", summary.skipped)).yellow().to_string()
    } else {
        "0 skipped".to_string()
    };

    let line = match mode {
        OutputMode::DryRun => format!("{} printed, {}", summary.printed, skipped),
        OutputMode::Write => format!(
            "{} written, {} unchanged, {}",
            summary.written, summary.unchanged, skipped
        ),
        OutputMode::Check => format!(
            "{} up to date, {} out of date, {}",
            summary.unchanged, summary.stale, skipped
        ),
    };

    let marker = if summary.skipped == 0 && summary.stale == 0 {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    eprintln!("{} {}", marker.bold(), line);
}
