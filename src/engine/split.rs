//! One file into many
//!
//! The input is streamed in bounded batches. Each batch is cut into slices
//! that fit the active partition's remaining capacity; slices are buffered
//! and flushed into the partition writer in threshold-sized row groups.

use super::buffer::ChunkBuffer;
use super::materialize::materialize_batch;
use super::types::{PartitionSummary, SplitReport};
use super::verify::{stale_partitions, verify_partitions};
use crate::config::{CapacityPlan, SplitConfig};
use crate::error::{Error, Result, ResultExt};
use crate::output::{select_codec, ParquetWriter, ParquetWriterConfig};
use crate::schema::{CastPolicy, TargetSchema};
use crate::source::SourceFile;
use crate::types::PARQUET_EXTENSION;
use arrow::record_batch::RecordBatch;
use std::fs;
use std::path::{Path, PathBuf};

/// Split `config.input` into partitions under `config.output_dir`
pub fn split(config: &SplitConfig) -> Result<SplitReport> {
    config.validate()?;
    let source = SourceFile::open(&config.input)?;
    let input_rows = source.num_rows();
    let plan = config.partitioning.plan(input_rows);
    let codec = select_codec(&config.input, config.compression);
    tracing::info!(
        input_rows,
        target_rows = plan.target_rows,
        max_partitions = ?plan.max_partitions,
        codec = %codec.codec,
        "splitting {}",
        config.input.display()
    );

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create {}", config.output_dir.display())
    })?;
    let target = TargetSchema::from_arrow(&source.schema())?;
    let writer_config = ParquetWriterConfig::new()
        .with_codec(codec.codec)
        .with_row_group_size(config.flush_rows);

    let mut redistributor = Redistributor::new(config, plan, target, writer_config);
    for batch in source.batches(config.batch_size)? {
        redistributor.push(&batch?)?;
    }
    let (partitions, routed) = redistributor.finish()?;

    if let Some(cap) = plan.max_partitions {
        if partitions.len() > cap {
            return Err(Error::invariant(format!(
                "wrote {} partitions but at most {cap} were planned",
                partitions.len()
            )));
        }
    }
    let written: usize = partitions.iter().map(|p| p.rows).sum();
    if routed != input_rows || written != input_rows {
        return Err(Error::invariant(format!(
            "input has {input_rows} rows but {routed} were routed and {written} written"
        )));
    }

    let paths: Vec<PathBuf> = partitions.iter().map(|p| p.path.clone()).collect();
    for stale in stale_partitions(&config.output_dir, &config.prefix, &paths)? {
        tracing::warn!("{} was not written by this run", stale.display());
    }

    let verification = if config.verify {
        let verification = verify_partitions(&paths)?;
        if verification.total_rows != input_rows {
            return Err(Error::invariant(format!(
                "partitions hold {} rows on disk but the input has {input_rows}",
                verification.total_rows
            )));
        }
        Some(verification)
    } else {
        None
    };

    Ok(SplitReport {
        input: config.input.clone(),
        input_rows,
        target_rows: plan.target_rows,
        max_partitions: plan.max_partitions,
        codec,
        partitions,
        verification,
    })
}

/// File name of partition `index`
pub fn partition_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index:05}.{PARQUET_EXTENSION}")
}

struct ActivePartition {
    index: usize,
    writer: ParquetWriter,
    /// Rows routed here, buffered or written
    rows: usize,
}

/// Routes slices of the input stream to successive partitions
struct Redistributor<'a> {
    output_dir: &'a Path,
    prefix: &'a str,
    plan: CapacityPlan,
    target: TargetSchema,
    writer_config: ParquetWriterConfig,
    buffer: ChunkBuffer,
    active: Option<ActivePartition>,
    closed: Vec<PartitionSummary>,
    routed: usize,
}

impl<'a> Redistributor<'a> {
    fn new(
        config: &'a SplitConfig,
        plan: CapacityPlan,
        target: TargetSchema,
        writer_config: ParquetWriterConfig,
    ) -> Self {
        Self {
            output_dir: &config.output_dir,
            prefix: &config.prefix,
            plan,
            target,
            writer_config,
            buffer: ChunkBuffer::new(config.flush_rows),
            active: None,
            closed: Vec::new(),
            routed: 0,
        }
    }

    /// Whether `index` is the last partition the cap allows
    fn at_cap(&self, index: usize) -> bool {
        self.plan
            .max_partitions
            .is_some_and(|cap| index + 1 >= cap)
    }

    fn push(&mut self, batch: &RecordBatch) -> Result<()> {
        let batch = materialize_batch(batch, &self.target, CastPolicy::Strict)?.batch;
        let total = batch.num_rows();
        let mut offset = 0;

        while offset < total {
            if self.active.is_none() {
                self.open_next()?;
            }
            let Some(index) = self.active.as_ref().map(|a| a.index) else {
                return Err(Error::invariant("no active partition after opening one"));
            };
            let absorbing = self.at_cap(index);
            let Some(active) = self.active.as_mut() else {
                return Err(Error::invariant("no active partition after opening one"));
            };
            let remaining = total - offset;
            let take = if absorbing {
                remaining
            } else {
                remaining.min(self.plan.target_rows.saturating_sub(active.rows))
            };
            if take == 0 {
                return Err(Error::invariant(format!(
                    "partition {} is full but still open",
                    active.index
                )));
            }

            self.buffer.push(batch.slice(offset, take));
            active.rows += take;
            self.routed += take;
            offset += take;

            if !absorbing && active.rows >= self.plan.target_rows {
                self.close_active()?;
            } else if self.buffer.should_flush() {
                self.buffer.flush_into(&mut active.writer)?;
            }
        }
        Ok(())
    }

    fn open_next(&mut self) -> Result<()> {
        let index = self.closed.len();
        let path: PathBuf = self.output_dir.join(partition_file_name(self.prefix, index));
        let writer = ParquetWriter::new(&path, self.target.arrow_schema(), &self.writer_config)?;
        tracing::debug!(index, absorbing = self.at_cap(index), "opened {}", path.display());
        self.active = Some(ActivePartition {
            index,
            writer,
            rows: 0,
        });
        Ok(())
    }

    fn close_active(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };
        self.buffer.flush_into(&mut active.writer)?;
        let summary = active.writer.close()?;
        if summary.rows != active.rows {
            return Err(Error::invariant(format!(
                "partition {} was routed {} rows but wrote {}",
                active.index, active.rows, summary.rows
            )));
        }
        tracing::info!(
            rows = summary.rows,
            row_groups = summary.row_groups,
            "wrote {}",
            summary.path.display()
        );
        self.closed
            .push(PartitionSummary::from_write(active.index, summary));
        Ok(())
    }

    /// Close the last partition; an empty input still yields one empty file
    fn finish(mut self) -> Result<(Vec<PartitionSummary>, usize)> {
        if self.active.is_none() && self.closed.is_empty() {
            self.open_next()?;
        }
        self.close_active()?;
        Ok((self.closed, self.routed))
    }
}
