//! Configuration types for merge, split and convert runs
//!
//! There are no config files: the CLI fills these structs from its arguments
//! and every run calls `validate()` before touching the filesystem.

use crate::error::{Error, Result};
use crate::schema::CastPolicy;
use crate::types::{Codec, ConvertTarget, TimestampUnit};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Merge Config
// ============================================================================

/// Configuration for merging many Parquet files into one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Directory (searched recursively) or glob pattern
    pub input: String,

    /// Output file
    pub output: PathBuf,

    /// Columns to keep, in output order
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Rewrite every timestamp column to this unit
    #[serde(default)]
    pub coerce_timestamps: Option<TimestampUnit>,

    /// Output codec; detected from the first input when unset
    #[serde(default)]
    pub compression: Option<Codec>,

    /// Slice chunks into row groups of at most this many rows
    #[serde(default)]
    pub row_group_size: Option<usize>,

    /// What to do with columns that cannot be cast
    #[serde(default)]
    pub cast_policy: CastPolicy,
}

impl MergeConfig {
    /// Create a config with defaults for everything but input and output
    pub fn new(input: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            columns: None,
            coerce_timestamps: None,
            compression: None,
            row_group_size: None,
            cast_policy: CastPolicy::default(),
        }
    }

    /// Restrict output to these columns
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Coerce timestamps to `unit`
    #[must_use]
    pub fn with_coerce_timestamps(mut self, unit: TimestampUnit) -> Self {
        self.coerce_timestamps = Some(unit);
        self
    }

    /// Force the output codec
    #[must_use]
    pub fn with_compression(mut self, codec: Codec) -> Self {
        self.compression = Some(codec);
        self
    }

    /// Fix the row-group size
    #[must_use]
    pub fn with_row_group_size(mut self, rows: usize) -> Self {
        self.row_group_size = Some(rows);
        self
    }

    /// Set the cast policy
    #[must_use]
    pub fn with_cast_policy(mut self, policy: CastPolicy) -> Self {
        self.cast_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            return Err(Error::invalid_value("input", "must not be empty"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::invalid_value("output", "must not be empty"));
        }
        if self.row_group_size == Some(0) {
            return Err(Error::invalid_value("row_group_size", "must be >= 1"));
        }
        if let Some(columns) = &self.columns {
            if let Some(name) = columns.iter().find(|c| c.is_empty()) {
                return Err(Error::invalid_value(
                    "columns",
                    format!("empty column name in {name:?}"),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// How split distributes rows over output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// A fixed number of partitions of (nearly) equal size
    Parts(usize),
    /// A fixed number of rows per partition; the last one may be shorter
    RowsPerFile(usize),
}

/// Row capacity per partition and the cap on the partition count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityPlan {
    /// Rows each partition takes before the next one opens
    pub target_rows: usize,
    /// Upper bound on partitions; the last one absorbs any remainder
    pub max_partitions: Option<usize>,
}

impl Partitioning {
    /// Build from the two mutually exclusive CLI options
    pub fn from_options(parts: Option<usize>, rows_per_file: Option<usize>) -> Result<Self> {
        match (parts, rows_per_file) {
            (Some(_), Some(_)) => Err(Error::config(
                "use either --parts or --rows-per-file, not both",
            )),
            (None, None) => Err(Error::config("one of --parts or --rows-per-file is required")),
            (Some(0), None) => Err(Error::invalid_value("parts", "must be >= 1")),
            (None, Some(0)) => Err(Error::invalid_value("rows_per_file", "must be >= 1")),
            (Some(n), None) => Ok(Partitioning::Parts(n)),
            (None, Some(r)) => Ok(Partitioning::RowsPerFile(r)),
        }
    }

    /// Capacity for a file of `total_rows` rows
    pub fn plan(self, total_rows: usize) -> CapacityPlan {
        match self {
            Partitioning::Parts(n) => CapacityPlan {
                target_rows: total_rows.div_ceil(n.max(1)).max(1),
                max_partitions: Some(n.max(1)),
            },
            Partitioning::RowsPerFile(r) => CapacityPlan {
                target_rows: r.max(1),
                max_partitions: None,
            },
        }
    }

    fn validate(self) -> Result<()> {
        match self {
            Partitioning::Parts(0) => Err(Error::invalid_value("parts", "must be >= 1")),
            Partitioning::RowsPerFile(0) => {
                Err(Error::invalid_value("rows_per_file", "must be >= 1"))
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Split Config
// ============================================================================

/// Configuration for splitting one Parquet file into many
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// File to split
    pub input: PathBuf,

    /// Directory the partitions are written to
    pub output_dir: PathBuf,

    /// Parts or rows-per-file
    pub partitioning: Partitioning,

    /// Partition file name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Output codec; detected from the input when unset
    #[serde(default)]
    pub compression: Option<Codec>,

    /// Buffered rows that trigger a flush, also the requested row-group size
    #[serde(default = "default_flush_rows")]
    pub flush_rows: usize,

    /// Rows per streamed input batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Re-read the partitions afterwards
    #[serde(default)]
    pub verify: bool,
}

fn default_prefix() -> String {
    "part".to_string()
}

fn default_flush_rows() -> usize {
    1_000_000
}

fn default_batch_size() -> usize {
    64 * 1024
}

impl SplitConfig {
    /// Create a config with default prefix, flush threshold and batch size
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        partitioning: Partitioning,
    ) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            partitioning,
            prefix: default_prefix(),
            compression: None,
            flush_rows: default_flush_rows(),
            batch_size: default_batch_size(),
            verify: false,
        }
    }

    /// Set the file name prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Force the output codec
    #[must_use]
    pub fn with_compression(mut self, codec: Codec) -> Self {
        self.compression = Some(codec);
        self
    }

    /// Set the flush threshold
    #[must_use]
    pub fn with_flush_rows(mut self, rows: usize) -> Self {
        self.flush_rows = rows;
        self
    }

    /// Set the streaming batch size
    #[must_use]
    pub fn with_batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows;
        self
    }

    /// Enable the verification pass
    #[must_use]
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.partitioning.validate()?;
        if self.prefix.is_empty() {
            return Err(Error::invalid_value("prefix", "must not be empty"));
        }
        if self.prefix.contains(['/', '\\']) {
            return Err(Error::invalid_value(
                "prefix",
                format!("'{}' must not contain path separators", self.prefix),
            ));
        }
        if self.flush_rows == 0 {
            return Err(Error::invalid_value("row_group_size", "must be >= 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be >= 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Convert Config
// ============================================================================

/// Configuration for mirroring a directory tree between CSV and Parquet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Directory searched recursively for source files
    pub in_dir: PathBuf,

    /// Root of the mirrored output tree
    pub out_dir: PathBuf,

    /// Conversion direction
    #[serde(default)]
    pub target: ConvertTarget,

    /// Parquet codec (CSV → Parquet only)
    #[serde(default = "default_convert_codec")]
    pub compression: Codec,

    /// Compression level, applied to zstd only
    #[serde(default = "default_level")]
    pub level: i32,

    /// DuckDB worker threads
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Replace existing destination files
    #[serde(default)]
    pub overwrite: bool,

    /// Skip malformed CSV rows instead of failing the file
    #[serde(default)]
    pub ignore_errors: bool,

    /// Spill directory for DuckDB
    #[serde(default)]
    pub temp_directory: Option<PathBuf>,
}

fn default_convert_codec() -> Codec {
    Codec::Zstd
}

fn default_level() -> i32 {
    22
}

fn default_threads() -> usize {
    4
}

impl ConvertConfig {
    /// Create a config with DuckDB defaults
    pub fn new(in_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            in_dir: in_dir.into(),
            out_dir: out_dir.into(),
            target: ConvertTarget::default(),
            compression: default_convert_codec(),
            level: default_level(),
            threads: default_threads(),
            overwrite: false,
            ignore_errors: false,
            temp_directory: None,
        }
    }

    /// Set the conversion direction
    #[must_use]
    pub fn with_target(mut self, target: ConvertTarget) -> Self {
        self.target = target;
        self
    }

    /// Set codec and level
    #[must_use]
    pub fn with_compression(mut self, codec: Codec, level: i32) -> Self {
        self.compression = codec;
        self.level = level;
        self
    }

    /// Set the DuckDB thread count
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Replace existing outputs
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Skip malformed CSV rows
    #[must_use]
    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// Set the spill directory
    #[must_use]
    pub fn with_temp_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_directory = Some(dir.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.in_dir.is_dir() {
            return Err(Error::invalid_value(
                "in_dir",
                format!("{} is not a directory", self.in_dir.display()),
            ));
        }
        if self.threads == 0 {
            return Err(Error::invalid_value("threads", "must be >= 1"));
        }
        if self.compression == Codec::Zstd && !(1..=22).contains(&self.level) {
            return Err(Error::invalid_value(
                "level",
                format!("zstd level must be within 1..=22, got {}", self.level),
            ));
        }
        Ok(())
    }
}
