//! Parquet source files
//!
//! A [`SourceFile`] holds the parsed footer of one input so its schema,
//! row-group layout and codec can be inspected without touching column data.
//! Row data is only read through [`SourceFile::read_row_group`] (one row group
//! at a time) or [`SourceFile::batches`] (bounded batches).

use crate::error::{Error, Result};
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions, RecordBatchReader};
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReader,
    ParquetRecordBatchReaderBuilder,
};
use parquet::arrow::ProjectionMask;
use parquet::basic::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One input Parquet file
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    metadata: ArrowReaderMetadata,
}

impl SourceFile {
    /// Open a file and parse its footer
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| Error::schema_read(&path, e))?;
        let metadata = ArrowReaderMetadata::load(&file, ArrowReaderOptions::default())
            .map_err(|e| Error::schema_read(&path, e))?;
        Ok(Self { path, metadata })
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arrow schema embedded in (or derived from) the footer
    pub fn schema(&self) -> SchemaRef {
        self.metadata.schema().clone()
    }

    /// Number of row groups
    pub fn num_row_groups(&self) -> usize {
        self.metadata.metadata().num_row_groups()
    }

    /// Total number of rows according to the footer
    pub fn num_rows(&self) -> usize {
        usize::try_from(self.metadata.metadata().file_metadata().num_rows()).unwrap_or(0)
    }

    /// Number of rows in one row group
    pub fn row_group_rows(&self, index: usize) -> usize {
        usize::try_from(self.metadata.metadata().row_group(index).num_rows()).unwrap_or(0)
    }

    /// Codec of the first column chunk of the first row group, if any
    pub fn first_column_compression(&self) -> Option<Compression> {
        self.metadata
            .metadata()
            .row_groups()
            .first()
            .and_then(|rg| rg.columns().first())
            .map(|column| column.compression())
    }

    /// Read one row group as a single batch, restricted to `columns`.
    ///
    /// Names that this file does not have are ignored; the materializer fills
    /// them in later.
    pub fn read_row_group(&self, index: usize, columns: &[String]) -> Result<RecordBatch> {
        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone());

        let schema = self.metadata.schema();
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|name| schema.index_of(name).ok())
            .collect();
        let rows = self.row_group_rows(index);
        if indices.is_empty() {
            // none of the requested columns exist here; only the row count matters
            return Ok(RecordBatch::try_new_with_options(
                Arc::new(Schema::empty()),
                vec![],
                &RecordBatchOptions::new().with_row_count(Some(rows)),
            )?);
        }
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);

        let reader = builder
            .with_row_groups(vec![index])
            .with_projection(mask)
            .with_batch_size(rows.max(1))
            .build()?;

        let projected = reader.schema();
        let mut batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        match batches.len() {
            0 => Ok(RecordBatch::new_empty(projected)),
            1 => Ok(batches.remove(0)),
            _ => Ok(concat_batches(&projected, &batches)?),
        }
    }

    /// Stream the whole file in batches of at most `batch_size` rows
    pub fn batches(&self, batch_size: usize) -> Result<ParquetRecordBatchReader> {
        let file = File::open(&self.path)?;
        let reader =
            ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone())
                .with_batch_size(batch_size.max(1))
                .build()?;
        Ok(reader)
    }
}

/// Open every path, skipping (with a warning) the ones whose footer cannot be read.
///
/// Fails only when no file is readable.
pub fn open_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        match SourceFile::open(path) {
            Ok(source) => sources.push(source),
            Err(e) => tracing::warn!("skipping {} due to schema read error: {e}", path.display()),
        }
    }
    if sources.is_empty() {
        return Err(Error::NoReadableSchemas);
    }
    Ok(sources)
}
