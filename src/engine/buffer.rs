//! Chunk buffer used by split
//!
//! Collects slices headed for the active partition until enough rows are
//! pending to form full row groups.

use crate::error::Result;
use crate::output::ParquetWriter;
use arrow::record_batch::RecordBatch;

/// Pending slices for the active writer
#[derive(Debug)]
pub struct ChunkBuffer {
    batches: Vec<RecordBatch>,
    rows: usize,
    threshold: usize,
}

impl ChunkBuffer {
    /// Create a buffer that wants flushing at `threshold` rows
    pub fn new(threshold: usize) -> Self {
        Self {
            batches: Vec::new(),
            rows: 0,
            threshold: threshold.max(1),
        }
    }

    /// Add a slice
    pub fn push(&mut self, batch: RecordBatch) {
        if batch.num_rows() == 0 {
            return;
        }
        self.rows += batch.num_rows();
        self.batches.push(batch);
    }

    /// Rows pending
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Whether the threshold has been reached
    pub fn should_flush(&self) -> bool {
        self.rows >= self.threshold
    }

    /// Write everything pending into `writer` in row groups of the threshold size
    pub fn flush_into(&mut self, writer: &mut ParquetWriter) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let flushed = self.rows;
        writer.write_chunked(&self.batches, Some(self.threshold))?;
        tracing::debug!(rows = flushed, path = %writer.path().display(), "flushed buffer");
        self.batches.clear();
        self.rows = 0;
        Ok(flushed)
    }
}
