//! CLI commands and argument parsing

use crate::types::{Codec, ConvertTarget, TimestampUnit};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Merge and split Parquet datasets
#[derive(Parser, Debug)]
#[command(name = "parquet-reshape")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Report format
    #[arg(long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge many Parquet files into one
    Merge {
        /// Directory (searched recursively) or glob pattern
        #[arg(long)]
        input: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Columns to keep, in output order
        #[arg(short, long, num_args = 1..)]
        columns: Option<Vec<String>>,

        /// Rewrite every timestamp column to this unit
        #[arg(long)]
        coerce_timestamps: Option<TimestampUnit>,

        /// Output codec (default: detected from the first input)
        #[arg(long, ignore_case = true)]
        compression: Option<Codec>,

        /// Maximum rows per output row group
        #[arg(long)]
        row_group_size: Option<usize>,

        /// Fail on the first value that cannot be cast
        #[arg(long)]
        strict_casts: bool,
    },

    /// Split one Parquet file into many
    Split {
        /// File to split
        #[arg(long)]
        input: PathBuf,

        /// Directory for the partitions
        #[arg(long)]
        output_dir: PathBuf,

        /// Number of partitions
        #[arg(long, conflicts_with = "rows_per_file", required_unless_present = "rows_per_file")]
        parts: Option<usize>,

        /// Rows per partition
        #[arg(long)]
        rows_per_file: Option<usize>,

        /// Partition file name prefix
        #[arg(long, default_value = "part")]
        prefix: String,

        /// Output codec (default: detected from the input)
        #[arg(long, ignore_case = true)]
        compression: Option<Codec>,

        /// Re-read the partitions and report their row counts
        #[arg(long)]
        verify: bool,

        /// Buffered rows per flush, also the row-group size
        #[arg(long, default_value = "1000000")]
        row_group_size: usize,

        /// Rows per streamed input batch
        #[arg(long, default_value = "65536")]
        batch_size: usize,
    },

    /// Convert a directory tree between CSV and Parquet
    Convert {
        /// Input directory
        #[arg(long)]
        in_dir: PathBuf,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "parquet")]
        to: ConvertTarget,

        /// Parquet codec
        #[arg(long, default_value = "zstd", ignore_case = true)]
        compression: Codec,

        /// Compression level (zstd only)
        #[arg(long, default_value = "22")]
        level: i32,

        /// DuckDB threads
        #[arg(long, default_value = "4")]
        threads: usize,

        /// Replace existing outputs
        #[arg(long)]
        overwrite: bool,

        /// Skip malformed CSV rows
        #[arg(long)]
        ignore_errors: bool,

        /// DuckDB spill directory
        #[arg(long)]
        temp_directory: Option<PathBuf>,
    },
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report on one line
    Json,
    /// Human-readable summary
    Pretty,
}
