// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]

//! # parquet-reshape
//!
//! Streaming merge (many → one) and split (one → many) of Parquet datasets,
//! tolerant of schema drift across input files.
//!
//! ## Features
//!
//! - **Schema Unification**: superset of all input columns with type widening
//! - **Column Projection**: keep a subset of columns, null-filling absent ones
//! - **Timestamp Coercion**: rewrite every timestamp column to one unit
//! - **Balanced Splits**: fixed part count or fixed rows per file
//! - **Bounded Memory**: one row group or one batch in memory at a time
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parquet_reshape::config::{MergeConfig, Partitioning, SplitConfig};
//! use parquet_reshape::engine::{merge, split};
//!
//! fn main() -> parquet_reshape::Result<()> {
//!     let report = merge(&MergeConfig::new("data/", "merged.parquet"))?;
//!     println!("{}", report.summary_line());
//!
//!     let config = SplitConfig::new("merged.parquet", "parts/", Partitioning::Parts(8));
//!     let report = split(&config)?;
//!     println!("{} partitions", report.files_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┬──────────────┬───────────────┬────────────┐
//! │   Source   │    Schema    │    Engine     │   Output   │
//! ├────────────┼──────────────┼───────────────┼────────────┤
//! │ Discovery  │ Unify        │ Materialize   │ Writer     │
//! │ Footers    │ Project      │ Merge         │ Codec      │
//! │ Row groups │ Coerce       │ Split/Verify  │            │
//! └────────────┴──────────────┴───────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// Target schema computation
pub mod schema;

/// Input discovery and reading
pub mod source;

/// Parquet output
pub mod output;

/// Streaming merge and split
pub mod engine;

/// CSV/Parquet conversion via DuckDB
pub mod convert;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use engine::{merge, split, MergeReport, SplitReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
