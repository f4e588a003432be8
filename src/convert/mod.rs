//! Whole-file format conversion via DuckDB
//!
//! Mirrors a directory tree of CSV files to Parquet, or Parquet files to CSV.

mod engine;

pub use engine::{convert, mirror_path, sql_quote, ConvertEngine, ConvertReport, FileStatus};
