//! DuckDB-backed conversion engine
//!
//! Each file is forwarded whole to a `COPY (SELECT * ...) TO ...` statement
//! on one in-memory connection; no rows pass through this process.

use crate::config::ConvertConfig;
use crate::engine::FileFailure;
use crate::error::{Error, Result};
use crate::source::find_files;
use crate::types::{Codec, ConvertTarget};
use duckdb::Connection;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of a conversion run
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    /// Source files found
    pub total: usize,
    /// Files written
    pub converted: usize,
    /// Files whose destination already existed
    pub skipped: usize,
    /// Files that failed
    pub failed: usize,
    /// Wall-clock seconds
    pub elapsed_secs: f64,
    /// Why each failed file failed
    pub failures: Vec<FileFailure>,
}

impl ConvertReport {
    /// One-line summary as printed by the CLI
    pub fn summary_line(&self) -> String {
        format!(
            "Converted {}/{} files ({} skipped, {} failed) in {:.2}s.",
            self.converted, self.total, self.skipped, self.failed, self.elapsed_secs
        )
    }
}

/// Outcome of a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// Destination written
    Converted,
    /// Destination existed and overwrite is off
    Skipped,
}

/// Conversion engine using DuckDB
pub struct ConvertEngine {
    /// DuckDB connection
    conn: Connection,
    config: ConvertConfig,
}

impl ConvertEngine {
    /// Open an in-memory connection configured for `config`
    pub fn new(config: ConvertConfig) -> Result<Self> {
        config.validate()?;
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        let engine = Self { conn, config };
        engine.configure()?;
        Ok(engine)
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA threads={};", self.config.threads))
            .map_err(|e| Error::config(format!("Failed to set DuckDB threads: {e}")))?;

        if let Some(dir) = &self.config.temp_directory {
            fs::create_dir_all(dir)?;
            self.conn
                .execute_batch(&format!("PRAGMA temp_directory='{}';", sql_quote(dir)))
                .map_err(|e| Error::config(format!("Failed to set DuckDB temp directory: {e}")))?;
        }
        Ok(())
    }

    /// The COPY statement that converts `src` into `dst`
    pub fn copy_statement(&self, src: &Path, dst: &Path) -> String {
        let src = sql_quote(src);
        let dst = sql_quote(dst);
        match self.config.target {
            ConvertTarget::Parquet => {
                let level = if self.config.compression == Codec::Zstd {
                    format!(", COMPRESSION_LEVEL {}", self.config.level)
                } else {
                    String::new()
                };
                format!(
                    "COPY (SELECT * FROM read_csv_auto('{src}', ignore_errors={})) \
                     TO '{dst}' (FORMAT PARQUET, COMPRESSION {}{level});",
                    self.config.ignore_errors,
                    self.config.compression.duckdb_name()
                )
            }
            ConvertTarget::Csv => format!(
                "COPY (SELECT * FROM read_parquet('{src}')) \
                 TO '{dst}' (FORMAT CSV, HEADER TRUE, DELIMITER ',');"
            ),
        }
    }

    /// Convert one file, creating the destination's parent directories
    pub fn convert_file(&self, src: &Path, dst: &Path) -> Result<FileStatus> {
        if dst.exists() && !self.config.overwrite {
            tracing::debug!("skipping {}, destination exists", dst.display());
            return Ok(FileStatus::Skipped);
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        self.conn
            .execute_batch(&self.copy_statement(src, dst))
            .map_err(|e| Error::convert(src, e))?;
        Ok(FileStatus::Converted)
    }

    /// Convert every matching file under the input directory
    pub fn run(&self) -> Result<ConvertReport> {
        let start = Instant::now();
        let in_dir = std::path::absolute(&self.config.in_dir)?;
        let files = find_files(&in_dir, self.config.target.source_extension())?;
        tracing::info!(
            "converting {} {} files from {}",
            files.len(),
            self.config.target.source_extension(),
            in_dir.display()
        );

        let mut report = ConvertReport {
            total: files.len(),
            converted: 0,
            skipped: 0,
            failed: 0,
            elapsed_secs: 0.0,
            failures: Vec::new(),
        };

        for src in &files {
            let result = mirror_path(
                &in_dir,
                &self.config.out_dir,
                src,
                self.config.target.target_extension(),
            )
            .and_then(|dst| self.convert_file(src, &dst));

            match result {
                Ok(FileStatus::Converted) => {
                    tracing::info!("converted {}", src.display());
                    report.converted += 1;
                }
                Ok(FileStatus::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("{e}");
                    report.failed += 1;
                    report.failures.push(FileFailure {
                        path: src.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(report)
    }
}

/// Convert the tree described by `config`
pub fn convert(config: ConvertConfig) -> Result<ConvertReport> {
    ConvertEngine::new(config)?.run()
}

/// Quote a path for use inside a single-quoted SQL string literal
pub fn sql_quote(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

/// Destination of `src` under `out_dir`, keeping its path relative to
/// `in_dir` and swapping the extension
pub fn mirror_path(in_dir: &Path, out_dir: &Path, src: &Path, extension: &str) -> Result<PathBuf> {
    let relative = src
        .strip_prefix(in_dir)
        .map_err(|_| Error::convert(src, format!("not under {}", in_dir.display())))?;
    Ok(out_dir.join(relative).with_extension(extension))
}
