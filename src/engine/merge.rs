//! Many files into one
//!
//! Inputs are visited in sorted path order, one row group at a time. Each
//! chunk is materialized against the target schema and appended to a single
//! writer, so memory stays bounded by the largest input row group.

use super::materialize::materialize_batch;
use super::types::{CastFallback, FileFailure, MergeReport};
use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::output::{select_codec, ParquetWriter, ParquetWriterConfig};
use crate::schema::{build_target_schema, TargetSchema};
use crate::source::{discover_inputs, exclude_output, open_sources, SourceFile};
use arrow::datatypes::SchemaRef;
use std::fs;
use std::path::PathBuf;

/// What one input contributed
struct FileOutcome {
    row_groups: usize,
    rows: usize,
    fallbacks: Vec<CastFallback>,
}

/// Discover inputs for `config.input` and merge them into `config.output`
pub fn merge(config: &MergeConfig) -> Result<MergeReport> {
    config.validate()?;
    let files = discover_inputs(&config.input)?;
    let files = exclude_output(files, &config.output)?;
    merge_files(&files, config)
}

/// Merge an already discovered, sorted list of inputs
pub fn merge_files(files: &[PathBuf], config: &MergeConfig) -> Result<MergeReport> {
    let sources = open_sources(files)?;
    let schemas: Vec<SchemaRef> = sources.iter().map(SourceFile::schema).collect();
    let target = build_target_schema(
        &schemas,
        config.columns.as_deref(),
        config.coerce_timestamps,
    )?;
    tracing::debug!(columns = ?target.column_names(), "target schema");

    let first = files.first().ok_or(Error::NoReadableSchemas)?;
    let codec = select_codec(first, config.compression);
    tracing::info!(
        codec = %codec.codec,
        detected = ?codec.detected,
        "merging {} files into {}",
        files.len(),
        config.output.display()
    );

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // chunks are flushed explicitly, so the writer's own limit only applies
    // when a fixed size was requested
    let writer_config = ParquetWriterConfig::new()
        .with_codec(codec.codec)
        .with_row_group_size(config.row_group_size.unwrap_or(usize::MAX));
    let mut writer = ParquetWriter::new(&config.output, target.arrow_schema(), &writer_config)?;

    let mut report = MergeReport::new(config.output.clone(), files.len(), codec);
    let columns = target.column_names();

    for source in &sources {
        match merge_file(source, &target, &columns, config, &mut writer) {
            Ok(outcome) => {
                tracing::info!(
                    row_groups = outcome.row_groups,
                    rows = outcome.rows,
                    "merged {}",
                    source.path().display()
                );
                if outcome.row_groups > 0 {
                    report.files_written += 1;
                }
                report.cast_fallbacks.extend(outcome.fallbacks);
            }
            Err(e) if e.is_per_file() => {
                tracing::warn!("skipping rest of {}: {e}", source.path().display());
                report.failures.push(FileFailure {
                    path: source.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let summary = writer.close()?;
    report.row_groups = summary.row_groups;
    report.rows = summary.rows;
    Ok(report)
}

fn merge_file(
    source: &SourceFile,
    target: &TargetSchema,
    columns: &[String],
    config: &MergeConfig,
    writer: &mut ParquetWriter,
) -> Result<FileOutcome> {
    let mut outcome = FileOutcome {
        row_groups: 0,
        rows: 0,
        fallbacks: Vec::new(),
    };

    for index in 0..source.num_row_groups() {
        let chunk = source.read_row_group(index, columns)?;
        let materialized = materialize_batch(&chunk, target, config.cast_policy)?;
        let rows = materialized.batch.num_rows();
        tracing::debug!(row_group = index, rows, "read {}", source.path().display());

        match config.row_group_size {
            Some(limit) if rows > limit => {
                writer.write_chunked(std::slice::from_ref(&materialized.batch), Some(limit))?;
                outcome.row_groups += rows.div_ceil(limit);
            }
            _ => {
                writer.write_row_group(&materialized.batch)?;
                if rows > 0 {
                    outcome.row_groups += 1;
                }
            }
        }
        outcome.rows += rows;
        outcome.fallbacks.extend(materialized.fallbacks);
    }
    Ok(outcome)
}
