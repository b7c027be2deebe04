//! Where rendered documents go

use similar::TextDiff;
use std::io::Write;
use std::path::Path;

use crate::error::{CliError, Result};

/// How rendered documents are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write the output file when its content changed
    Write,
    /// Print every document to stdout
    DryRun,
    /// Compare with the file on disk, writing nothing
    Check,
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Printed,
    Written,
    Unchanged,
    /// The file on disk differs; carries a unified diff
    Stale { diff: String },
}

/// Emit `content` for the document at `path`
pub fn emit(mode: OutputMode, path: &Path, content: &str) -> Result<Outcome> {
    match mode {
        OutputMode::DryRun => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|e| CliError::io(Path::new("<stdout>"), e))?;
            Ok(Outcome::Printed)
        }
        OutputMode::Write => {
            if read_existing(path)?.as_deref() == Some(content) {
                tracing::debug!("{} is up to date", path.display());
                return Ok(Outcome::Unchanged);
            }
            std::fs::write(path, content).map_err(|e| CliError::io(path, e))?;
            tracing::info!("Wrote {}", path.display());
            Ok(Outcome::Written)
        }
        OutputMode::Check => {
            let existing = read_existing(path)?.unwrap_or_default();
            if existing == content {
                return Ok(Outcome::Unchanged);
            }
            let name = path.display().to_string();
            let diff = TextDiff::from_lines(existing.as_str(), content)
                .unified_diff()
                .context_radius(3)
                .header(&name, &name)
                .to_string();
            Ok(Outcome::Stale { diff })
        }
    }
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CliError::io(path, e)),
    }
}
