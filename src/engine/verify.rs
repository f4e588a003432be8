//! Post-split verification
//!
//! Re-reads the footers of the partitions a split produced.

use crate::error::Result;
use crate::source::{list_partitions, SourceFile};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Footer row count and on-disk size of one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedPartition {
    /// File name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Rows in the footer
    pub rows: usize,
    /// File size in bytes
    pub size_bytes: u64,
}

/// All verified partitions and their total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Partitions in the order they were produced
    pub partitions: Vec<VerifiedPartition>,
    /// Sum of partition rows
    pub total_rows: usize,
}

/// Read back the footer of each partition in `paths`
pub fn verify_partitions(paths: &[PathBuf]) -> Result<VerificationReport> {
    let mut partitions = Vec::new();
    for path in paths {
        let path = path.clone();
        let rows = SourceFile::open(&path)?.num_rows();
        let size_bytes = fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!(rows, size_bytes, "verified {name}");
        partitions.push(VerifiedPartition {
            name,
            path,
            rows,
            size_bytes,
        });
    }

    let total_rows = partitions.iter().map(|p| p.rows).sum();
    Ok(VerificationReport {
        partitions,
        total_rows,
    })
}

/// Files matching `{prefix}-*.parquet` in `dir` that are not among `produced`
pub fn stale_partitions(dir: &Path, prefix: &str, produced: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let produced: HashSet<OsString> = produced
        .iter()
        .filter_map(|p| p.file_name().map(ToOwned::to_owned))
        .collect();
    Ok(list_partitions(dir, prefix)?
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|name| !produced.contains(name)))
        .collect())
}
