//! Output module
//!
//! Handles Parquet file writing and output codec selection.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing Arrow RecordBatches to Parquet with controlled row-group sizes
//! - Guaranteed footer finalization on every exit path
//! - Choosing the output codec from an override or the input file

mod codec;
mod writer;

pub use codec::{detect_codec, resolve_codec, select_codec, CodecChoice};
pub use writer::{write_batches_to_parquet, ParquetWriter, ParquetWriterConfig, WriteSummary};
