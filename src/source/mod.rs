//! Source module
//!
//! Finding input files and reading them one row group or one bounded batch
//! at a time.

mod discovery;
mod reader;

pub use discovery::{discover_inputs, exclude_output, find_files, list_partitions};
pub use reader::{open_sources, SourceFile};
