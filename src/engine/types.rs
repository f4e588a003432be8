//! Engine types
//!
//! Reports returned by merge and split runs.

use super::verify::VerificationReport;
use crate::output::{CodecChoice, WriteSummary};
use serde::Serialize;
use std::path::PathBuf;

/// A column that kept its original type because the cast failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastFallback {
    /// Column name
    pub column: String,
    /// Type found in the chunk
    pub from: String,
    /// Target type
    pub to: String,
    /// Cast error message
    pub reason: String,
}

/// An input that was skipped part-way through a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Input file
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Result of a merge run
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Output file
    pub output: PathBuf,
    /// Inputs left after excluding the output path
    pub files_matched: usize,
    /// Inputs that contributed at least one row group without failing
    pub files_written: usize,
    /// Row groups written to the output
    pub row_groups: usize,
    /// Rows written to the output
    pub rows: usize,
    /// Output codec and what was detected on the first input
    pub codec: CodecChoice,
    /// Inputs that failed
    pub failures: Vec<FileFailure>,
    /// Columns that could not be cast
    pub cast_fallbacks: Vec<CastFallback>,
}

impl MergeReport {
    pub(crate) fn new(output: PathBuf, files_matched: usize, codec: CodecChoice) -> Self {
        Self {
            output,
            files_matched,
            files_written: 0,
            row_groups: 0,
            rows: 0,
            codec,
            failures: Vec::new(),
            cast_fallbacks: Vec::new(),
        }
    }

    /// One-line summary as printed by the CLI
    pub fn summary_line(&self) -> String {
        format!(
            "Wrote {} (from {}/{} files, {} row-groups, {} rows).",
            self.output.display(),
            self.files_written,
            self.files_matched,
            self.row_groups,
            self.rows
        )
    }
}

/// One written partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    /// Zero-based partition index
    pub index: usize,
    /// Partition file
    pub path: PathBuf,
    /// Rows written
    pub rows: usize,
    /// Row groups in the footer
    pub row_groups: usize,
}

impl PartitionSummary {
    pub(crate) fn from_write(index: usize, summary: WriteSummary) -> Self {
        Self {
            index,
            path: summary.path,
            rows: summary.rows,
            row_groups: summary.row_groups,
        }
    }
}

/// Result of a split run
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    /// Input file
    pub input: PathBuf,
    /// Rows according to the input footer
    pub input_rows: usize,
    /// Rows each partition takes
    pub target_rows: usize,
    /// Upper bound on partitions, if any
    pub max_partitions: Option<usize>,
    /// Output codec and what was detected on the input
    pub codec: CodecChoice,
    /// Partitions in index order
    pub partitions: Vec<PartitionSummary>,
    /// Re-read row counts, when verification was requested
    pub verification: Option<VerificationReport>,
}

impl SplitReport {
    /// Rows written over all partitions
    pub fn rows_written(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }

    /// Number of partitions written
    pub fn files_written(&self) -> usize {
        self.partitions.len()
    }
}
