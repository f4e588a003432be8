//! Execution engine module
//!
//! Streaming merge and split on top of the shared materializer.
//!
//! # Overview
//!
//! The engine module provides:
//! - [`merge`] - many Parquet files into one, tolerating schema drift
//! - [`split`] - one Parquet file into balanced partitions
//! - [`materialize_batch`] - align a chunk with the target schema
//! - [`verify_partitions`] - re-read partition footers after a split

mod buffer;
mod materialize;
mod merge;
mod split;
mod types;
mod verify;

pub use buffer::ChunkBuffer;
pub use materialize::{materialize_batch, Materialized};
pub use merge::{merge, merge_files};
pub use split::{partition_file_name, split};
pub use types::{CastFallback, FileFailure, MergeReport, PartitionSummary, SplitReport};
pub use verify::{stale_partitions, verify_partitions, VerificationReport, VerifiedPartition};

#[cfg(test)]
mod tests;
