//! Input discovery
//!
//! Resolves a directory or glob pattern into the sorted list of Parquet files
//! a merge reads from, and walks directory trees for conversion.

use crate::error::{Error, Result};
use crate::types::PARQUET_EXTENSION;
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `input` to absolute `.parquet` paths, sorted and deduplicated.
///
/// A directory is searched recursively; anything else is treated as a glob
/// pattern and matched only at the level it names.
pub fn discover_inputs(input: &str) -> Result<Vec<PathBuf>> {
    let root = Path::new(input);
    let files = if root.is_dir() {
        find_files(root, PARQUET_EXTENSION)?
    } else {
        expand(input, MatchOptions::new(), PARQUET_EXTENSION)?
    };
    if files.is_empty() {
        return Err(Error::NoInputs {
            input: input.to_string(),
        });
    }
    Ok(files)
}

/// Drop any input that resolves to `output`.
///
/// Fails when nothing is left, which happens when the only match is a file
/// written by an earlier run over the same location.
pub fn exclude_output(files: Vec<PathBuf>, output: &Path) -> Result<Vec<PathBuf>> {
    let output_key = comparison_key(output);
    let before = files.len();
    let kept: Vec<PathBuf> = files
        .into_iter()
        .filter(|f| comparison_key(f) != output_key)
        .collect();

    if kept.len() < before {
        tracing::info!(output = %output.display(), "excluding output file from inputs");
    }
    if kept.is_empty() {
        return Err(Error::AllInputsAreOutput {
            output: output.to_path_buf(),
        });
    }
    Ok(kept)
}

/// Every file below `dir` (recursively) with extension `extension`,
/// compared case-insensitively. Sorted, absolute, deduplicated.
pub fn find_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!(
        "{}/**/*.{}",
        escaped.trim_end_matches('/'),
        Pattern::escape(extension)
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    expand(&pattern, options, extension)
}

/// Files in `dir` named `{prefix}-*.parquet`, sorted by name
pub fn list_partitions(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}-*.{PARQUET_EXTENSION}",
        Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/'),
        Pattern::escape(prefix)
    );
    expand(&pattern, MatchOptions::new(), PARQUET_EXTENSION)
}

fn expand(pattern: &str, options: MatchOptions, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in glob::glob_with(pattern, options)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path while matching '{pattern}'");
                continue;
            }
        };
        if path.is_file() && has_extension(&path, extension) {
            files.insert(absolute(&path)?);
        }
    }
    Ok(files.into_iter().collect())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Canonical form when the file exists, absolute form otherwise
fn comparison_key(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
