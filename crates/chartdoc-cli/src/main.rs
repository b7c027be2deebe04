//! Chartdoc CLI - Reference documentation for Helm charts

use chartdoc_core::{RowOptions, SortOrder};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;
mod output;

use commands::generate::{self, GenerateOptions};
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(name = "chartdoc")]
#[command(version)]
#[command(
    about = "Generate Markdown documentation for Helm charts from Chart.yaml and values.yaml comments",
    long_about = None
)]
struct Cli {
    /// Directory to search recursively for charts
    #[arg(
        short = 'c',
        long,
        env = "CHARTDOC_CHART_SEARCH_ROOT",
        default_value = "."
    )]
    chart_search_root: PathBuf,

    /// Template files; `./` paths are relative to each chart, others to the search root
    #[arg(
        short = 't',
        long,
        env = "CHARTDOC_TEMPLATE_FILES",
        default_value = "./README.md.j2",
        value_delimiter = ','
    )]
    template_files: Vec<String>,

    /// Base values file, relative to each chart
    #[arg(
        short = 'f',
        long,
        env = "CHARTDOC_VALUES_FILE",
        default_value = "values.yaml"
    )]
    values_file: String,

    /// Extra values files merged over the base, in order
    #[arg(long, env = "CHARTDOC_CUSTOM_VALUES_FILE", value_delimiter = ',')]
    custom_values_file: Vec<String>,

    /// Output file written in each chart directory
    #[arg(
        short = 'o',
        long,
        env = "CHARTDOC_OUTPUT_FILE",
        default_value = "README.md"
    )]
    output_file: String,

    /// Ignore file at the search root
    #[arg(
        short = 'i',
        long,
        env = "CHARTDOC_IGNORE_FILE",
        default_value = ".chartdocignore"
    )]
    ignore_file: String,

    /// Order of value rows: alphabetical or file
    #[arg(
        short = 's',
        long,
        env = "CHARTDOC_SORT_VALUES_ORDER",
        default_value = "alphabetical"
    )]
    sort_values_order: SortOrder,

    /// Leave out values without a description
    #[arg(long, env = "CHARTDOC_IGNORE_NON_DESCRIPTIONS")]
    ignore_non_descriptions: bool,

    /// Print documents to stdout instead of writing files
    #[arg(short = 'd', long, env = "CHARTDOC_DRY_RUN")]
    dry_run: bool,

    /// Fail when a document on disk is out of date, writing nothing
    #[arg(long, env = "CHARTDOC_CHECK", conflicts_with = "dry_run")]
    check: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(
        short = 'l',
        long,
        env = "CHARTDOC_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,
}

impl Cli {
    fn generate_options(&self) -> GenerateOptions {
        let mode = if self.dry_run {
            OutputMode::DryRun
        } else if self.check {
            OutputMode::Check
        } else {
            OutputMode::Write
        };

        GenerateOptions {
            search_root: self.chart_search_root.clone(),
            template_files: self.template_files.clone(),
            values_file: self.values_file.clone(),
            custom_values_files: self.custom_values_file.clone(),
            output_file: self.output_file.clone(),
            ignore_file: self.ignore_file.clone(),
            rows: RowOptions {
                sort_order: self.sort_values_order,
                ignore_non_descriptions: self.ignore_non_descriptions,
            },
            mode,
        }
    }
}

/// Log to stderr so dry-run output stays clean
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(&cli.log_level);
    tracing::debug!("{:?}", cli);

    if let Err(err) = generate::run(&cli.generate_options()) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
