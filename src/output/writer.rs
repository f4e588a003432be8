//! Parquet file writer
//!
//! Wraps `ArrowWriter` as a scoped resource: [`ParquetWriter::close`] writes
//! the footer and reports what was written, and a writer dropped without
//! being closed (an early `?` return) still finalizes its footer.

use crate::error::{Error, Result};
use crate::types::Codec;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    codec: Codec,
    row_group_size: usize,
    dictionary_enabled: bool,
    statistics_enabled: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            codec: Codec::Uncompressed,
            row_group_size: 1024 * 1024, // 1M rows
            dictionary_enabled: true,
            statistics_enabled: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the largest row group the writer will buffer before closing it
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary_enabled = enabled;
        self
    }

    /// Enable or disable statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics_enabled = enabled;
        self
    }

    /// Get the codec
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Get row group size
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn build_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_compression(self.codec.into())
            .set_max_row_group_size(self.row_group_size)
            .set_dictionary_enabled(self.dictionary_enabled);

        if !self.statistics_enabled {
            builder = builder.set_statistics_enabled(EnabledStatistics::None);
        }

        builder.build()
    }
}

/// What a closed writer put on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Output file
    pub path: PathBuf,
    /// Rows written
    pub rows: usize,
    /// Row groups in the footer
    pub row_groups: usize,
}

/// Parquet file writer
pub struct ParquetWriter {
    path: PathBuf,
    schema: SchemaRef,
    /// `None` once closed
    writer: Option<ArrowWriter<File>>,
    rows_written: usize,
}

impl ParquetWriter {
    /// Create the file and a writer for `schema`
    pub fn new(
        path: impl AsRef<Path>,
        schema: SchemaRef,
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.display()),
        })?;

        let props = config.build_properties();
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props)).map_err(|e| {
            Error::Output {
                message: format!("Failed to create Parquet writer: {e}"),
            }
        })?;

        Ok(Self {
            path,
            schema,
            writer: Some(writer),
            rows_written: 0,
        })
    }

    /// Append a batch to the row group in progress
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.check_schema(batch)?;
        let writer = self.inner()?;
        writer.write(batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Close the row group in progress, if it has any rows
    pub fn flush(&mut self) -> Result<()> {
        self.inner()?.flush().map_err(|e| Error::Output {
            message: format!("Failed to flush row group: {e}"),
        })
    }

    /// Write a batch as its own row group
    pub fn write_row_group(&mut self, batch: &RecordBatch) -> Result<()> {
        self.write(batch)?;
        self.flush()
    }

    /// Write batches as consecutive row groups of `row_group_size` rows
    /// (the last one may be shorter). Without a size, all batches form one
    /// row group, split only by the configured maximum.
    pub fn write_chunked(
        &mut self,
        batches: &[RecordBatch],
        row_group_size: Option<usize>,
    ) -> Result<()> {
        let Some(limit) = row_group_size.filter(|size| *size > 0) else {
            for batch in batches {
                self.write(batch)?;
            }
            return self.flush();
        };

        let mut in_group = 0;
        for batch in batches {
            let mut offset = 0;
            while offset < batch.num_rows() {
                let take = (limit - in_group).min(batch.num_rows() - offset);
                self.write(&batch.slice(offset, take))?;
                in_group += take;
                offset += take;
                if in_group == limit {
                    self.flush()?;
                    in_group = 0;
                }
            }
        }
        self.flush()
    }

    /// Get the number of rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the writer and finalize the file
    pub fn close(mut self) -> Result<WriteSummary> {
        let writer = self.inner_owned()?;
        let metadata = writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(WriteSummary {
            path: self.path.clone(),
            rows: self.rows_written,
            row_groups: metadata.row_groups.len(),
        })
    }

    fn inner(&mut self) -> Result<&mut ArrowWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::output(format!("{} is already closed", self.path.display())))
    }

    fn inner_owned(&mut self) -> Result<ArrowWriter<File>> {
        self.writer
            .take()
            .ok_or_else(|| Error::output(format!("{} is already closed", self.path.display())))
    }

    /// Names and types must line up with the writer schema
    fn check_schema(&self, batch: &RecordBatch) -> Result<()> {
        let batch_schema = batch.schema();
        let expected = self.schema.fields();
        let actual = batch_schema.fields();

        let mismatch = expected
            .iter()
            .zip(actual.iter())
            .find(|(e, a)| e.name() != a.name() || e.data_type() != a.data_type());

        if let Some((e, a)) = mismatch {
            return Err(Error::BatchRejected {
                path: self.path.clone(),
                message: format!(
                    "column '{}' is {:?} where '{}' is expected as {:?}",
                    a.name(),
                    a.data_type(),
                    e.name(),
                    e.data_type()
                ),
            });
        }
        if expected.len() != actual.len() {
            return Err(Error::BatchRejected {
                path: self.path.clone(),
                message: format!("batch has {} columns, expected {}", actual.len(), expected.len()),
            });
        }
        Ok(())
    }
}

impl Drop for ParquetWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            match writer.close() {
                Ok(_) => tracing::debug!(
                    path = %self.path.display(),
                    rows = self.rows_written,
                    "finalized writer on early exit"
                ),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    "failed to finalize Parquet footer: {e}"
                ),
            }
        }
    }
}

/// Write multiple RecordBatches to a Parquet file
pub fn write_batches_to_parquet(
    path: impl AsRef<Path>,
    batches: &[RecordBatch],
    config: Option<&ParquetWriterConfig>,
) -> Result<WriteSummary> {
    if batches.is_empty() {
        return Err(Error::Output {
            message: "No batches to write".to_string(),
        });
    }

    let default_config = ParquetWriterConfig::default();
    let config = config.unwrap_or(&default_config);

    let mut writer = ParquetWriter::new(path, batches[0].schema(), config)?;
    for batch in batches {
        writer.write_row_group(batch)?;
    }
    writer.close()
}
