//! CLI module
//!
//! Command-line interface for reshaping Parquet datasets.
//!
//! # Commands
//!
//! - `merge` - Many Parquet files into one
//! - `split` - One Parquet file into many
//! - `convert` - CSV <-> Parquet directory trees via DuckDB

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
