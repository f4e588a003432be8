//! Error types for parquet-reshape
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for parquet-reshape
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    // ============================================================================
    // Discovery Errors
    // ============================================================================
    #[error("No parquet files matched '{input}'")]
    NoInputs { input: String },

    #[error("All inputs resolve to the output path {}; nothing to do", output.display())]
    AllInputsAreOutput { output: PathBuf },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Failed to read schema of {}: {message}", path.display())]
    SchemaRead { path: PathBuf, message: String },

    #[error("No readable Parquet schemas found in inputs")]
    NoReadableSchemas,

    #[error("Cannot unify column '{field}': incompatible types {left} and {right}")]
    SchemaUnification {
        field: String,
        left: String,
        right: String,
    },

    #[error("Cannot cast column '{column}' from {from} to {to}: {message}")]
    Cast {
        column: String,
        from: String,
        to: String,
        message: String,
    },

    // ============================================================================
    // Redistribution Errors
    // ============================================================================
    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("{} rejected batch: {message}", path.display())]
    BatchRejected { path: PathBuf, message: String },

    // ============================================================================
    // Serialization Errors
    // ============================================================================
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    // ============================================================================
    // Conversion Errors
    // ============================================================================
    #[error("Failed to convert {}: {message}", path.display())]
    Convert { path: PathBuf, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a schema read error
    pub fn schema_read(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::SchemaRead {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a conversion error
    pub fn convert(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self::Convert {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Whether a merge can continue with the next input after this error.
    ///
    /// Reading an input and a writer refusing a batch before touching the
    /// file are per-file. Any failure inside the output writer is fatal.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Error::SchemaRead { .. }
                | Error::BatchRejected { .. }
                | Error::Arrow(_)
                | Error::Parquet(_)
                | Error::Io(_)
        )
    }
}

/// Result type alias for parquet-reshape
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
