//! Tests for engine module

use super::*;
use crate::config::{MergeConfig, Partitioning, SplitConfig};
use crate::error::Error;
use crate::output::{write_batches_to_parquet, ParquetWriter, ParquetWriterConfig};
use crate::schema::{CastPolicy, TargetField, TargetSchema};
use crate::source::SourceFile;
use crate::types::Codec;
use arrow::array::{Array, Int32Array, Int64Array, StringArray, TimestampSecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn int_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]))
}

fn int_batch(start: i64, len: usize) -> RecordBatch {
    let values: Vec<i64> = (start..start + len as i64).collect();
    RecordBatch::try_new(int_schema(), vec![Arc::new(Int64Array::from(values))]).unwrap()
}

/// Write `groups` row groups of consecutive integers starting at `start`
fn write_ints(path: &Path, start: i64, groups: &[usize]) {
    let mut next = start;
    let batches: Vec<RecordBatch> = groups
        .iter()
        .map(|&len| {
            let batch = int_batch(next, len);
            next += len as i64;
            batch
        })
        .collect();
    write_batches_to_parquet(path, &batches, None).unwrap();
}

fn read_ints(path: &Path) -> Vec<i64> {
    let source = SourceFile::open(path).unwrap();
    let mut values = Vec::new();
    for batch in source.batches(1024).unwrap() {
        let batch = batch.unwrap();
        let column = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        values.extend(column.values().iter().copied());
    }
    values
}

fn partition_rows(report: &SplitReport) -> Vec<usize> {
    report.partitions.iter().map(|p| p.rows).collect()
}

// ============================================================================
// Materializer Tests
// ============================================================================

#[test]
fn test_materialize_reorders_and_fills_missing() {
    let batch = RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("b", DataType::Utf8, true),
            Field::new("a", DataType::Int32, false),
        ])),
        vec![
            Arc::new(StringArray::from(vec!["x", "y", "z"])),
            Arc::new(Int32Array::from(vec![1, 2, 3])),
        ],
    )
    .unwrap();
    let target = TargetSchema::new(vec![
        TargetField::Typed(Arc::new(Field::new("a", DataType::Int32, false))),
        TargetField::Typed(Arc::new(Field::new("c", DataType::Float64, true))),
        TargetField::Typed(Arc::new(Field::new("b", DataType::Utf8, true))),
        TargetField::Placeholder("d".to_string()),
    ])
    .unwrap();

    let out = materialize_batch(&batch, &target, CastPolicy::default()).unwrap();
    assert!(out.fallbacks.is_empty());
    assert_eq!(out.batch.num_rows(), 3);

    let names: Vec<String> = out
        .batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(names, vec!["a", "c", "b", "d"]);
    assert_eq!(out.batch.column(1).data_type(), &DataType::Float64);
    assert_eq!(out.batch.column(1).null_count(), 3);
    assert_eq!(out.batch.column(3).data_type(), &DataType::Null);
    assert_eq!(out.batch.column(3).len(), 3);
}

#[test]
fn test_materialize_casts_to_wider_type() {
    let batch = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new("a", DataType::Int32, false)])),
        vec![Arc::new(Int32Array::from(vec![7, -1]))],
    )
    .unwrap();
    let target = TargetSchema::from_arrow(&int_schema_named("a")).unwrap();

    let out = materialize_batch(&batch, &target, CastPolicy::Strict).unwrap();
    let column = out
        .batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(column.values().to_vec(), vec![7, -1]);
}

fn int_schema_named(name: &str) -> Schema {
    Schema::new(vec![Field::new(name, DataType::Int64, true)])
}

fn unparsable_batch() -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new("a", DataType::Utf8, true)])),
        vec![Arc::new(StringArray::from(vec!["12", "not a number"]))],
    )
    .unwrap()
}

#[test]
fn test_materialize_fallback_keeps_original_column() {
    let target = TargetSchema::from_arrow(&int_schema_named("a")).unwrap();

    let out = materialize_batch(&unparsable_batch(), &target, CastPolicy::CastOrKeepOriginal)
        .unwrap();
    assert_eq!(out.fallbacks.len(), 1);
    assert_eq!(out.fallbacks[0].column, "a");
    assert_eq!(out.fallbacks[0].to, "Int64");
    assert_eq!(out.batch.column(0).data_type(), &DataType::Utf8);
    // nothing was nulled
    assert_eq!(out.batch.column(0).null_count(), 0);
}

#[test]
fn test_materialize_strict_fails_on_bad_cast() {
    let target = TargetSchema::from_arrow(&int_schema_named("a")).unwrap();
    let err = materialize_batch(&unparsable_batch(), &target, CastPolicy::Strict).unwrap_err();
    assert!(matches!(err, Error::Cast { ref column, .. } if column == "a"));
    assert!(!err.is_per_file());
}

#[test]
fn test_materialize_empty_projection_keeps_row_count() {
    let batch = RecordBatch::try_new_with_options(
        Arc::new(Schema::empty()),
        vec![],
        &arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(5)),
    )
    .unwrap();
    let target = TargetSchema::new(vec![TargetField::Placeholder("ghost".to_string())]).unwrap();

    let out = materialize_batch(&batch, &target, CastPolicy::default()).unwrap();
    assert_eq!(out.batch.num_rows(), 5);
    assert_eq!(out.batch.column(0).data_type(), &DataType::Null);
    assert_eq!(out.batch.column(0).len(), 5);
}

#[test]
fn test_materialize_timestamp_unit_change() {
    let batch = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Second, Some("UTC".into())),
            true,
        )])),
        vec![Arc::new(
            TimestampSecondArray::from(vec![1_700_000_000]).with_timezone("UTC"),
        )],
    )
    .unwrap();
    let target = TargetSchema::from_arrow(&Schema::new(vec![Field::new(
        "ts",
        DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
        true,
    )]))
    .unwrap();

    let out = materialize_batch(&batch, &target, CastPolicy::Strict).unwrap();
    assert_eq!(
        out.batch.column(0).data_type(),
        &DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()))
    );
}

// ============================================================================
// Buffer Tests
// ============================================================================

#[test]
fn test_chunk_buffer_threshold() {
    let mut buffer = ChunkBuffer::new(10);
    assert!(buffer.is_empty());
    buffer.push(int_batch(0, 4));
    buffer.push(int_batch(4, 0));
    assert_eq!(buffer.rows(), 4);
    assert!(!buffer.should_flush());
    buffer.push(int_batch(4, 6));
    assert!(buffer.should_flush());
}

#[test]
fn test_chunk_buffer_flush_into_writer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("buffered.parquet");
    let mut writer = ParquetWriter::new(&path, int_schema(), &ParquetWriterConfig::default()).unwrap();

    let mut buffer = ChunkBuffer::new(5);
    buffer.push(int_batch(0, 3));
    buffer.push(int_batch(3, 9));
    assert_eq!(buffer.flush_into(&mut writer).unwrap(), 12);
    assert!(buffer.is_empty());
    assert_eq!(buffer.flush_into(&mut writer).unwrap(), 0);

    writer.close().unwrap();
    let source = SourceFile::open(&path).unwrap();
    let sizes: Vec<usize> = (0..source.num_row_groups())
        .map(|i| source.row_group_rows(i))
        .collect();
    assert_eq!(sizes, vec![5, 5, 2]);
    assert_eq!(read_ints(&path), (0..12).collect::<Vec<_>>());
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_preserves_file_and_row_order() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    write_ints(&input.join("b.parquet"), 100, &[2, 3]);
    write_ints(&input.join("a.parquet"), 0, &[4]);

    let output = dir.path().join("out/merged.parquet");
    let config = MergeConfig::new(input.to_str().unwrap(), &output);
    let report = merge(&config).unwrap();

    assert_eq!(report.files_matched, 2);
    assert_eq!(report.files_written, 2);
    assert_eq!(report.row_groups, 3);
    assert_eq!(report.rows, 9);
    assert!(report.failures.is_empty());
    assert_eq!(
        read_ints(&output),
        vec![0, 1, 2, 3, 100, 101, 102, 103, 104]
    );
    assert_eq!(
        report.summary_line(),
        format!(
            "Wrote {} (from 2/2 files, 3 row-groups, 9 rows).",
            output.display()
        )
    );
}

#[test]
fn test_merge_fixed_row_group_size_slices_chunks() {
    let dir = tempdir().unwrap();
    write_ints(&dir.path().join("a.parquet"), 0, &[10]);
    write_ints(&dir.path().join("b.parquet"), 10, &[3]);

    let output = dir.path().join("merged.parquet");
    let config = MergeConfig::new(dir.path().to_str().unwrap(), &output).with_row_group_size(4);
    let report = merge(&config).unwrap();

    let source = SourceFile::open(&output).unwrap();
    let sizes: Vec<usize> = (0..source.num_row_groups())
        .map(|i| source.row_group_rows(i))
        .collect();
    assert_eq!(sizes, vec![4, 4, 2, 3]);
    assert_eq!(report.row_groups, 4);
    assert_eq!(report.rows, 13);
}

#[test]
fn test_merge_uses_codec_of_first_input() {
    let dir = tempdir().unwrap();
    let config = ParquetWriterConfig::new().with_codec(Codec::Snappy);
    write_batches_to_parquet(dir.path().join("a.parquet"), &[int_batch(0, 5)], Some(&config))
        .unwrap();
    write_ints(&dir.path().join("b.parquet"), 5, &[5]);

    let output = dir.path().join("merged.parquet");
    let report = merge(&MergeConfig::new(dir.path().to_str().unwrap(), &output)).unwrap();
    assert_eq!(report.codec.codec, Codec::Snappy);
    assert_eq!(report.codec.detected, Some(Codec::Snappy));

    let report = merge(
        &MergeConfig::new(dir.path().to_str().unwrap(), &output).with_compression(Codec::Zstd),
    )
    .unwrap();
    assert_eq!(report.codec.codec, Codec::Zstd);
    assert_eq!(
        SourceFile::open(&output)
            .unwrap()
            .first_column_compression()
            .and_then(Codec::from_parquet),
        Some(Codec::Zstd)
    );
}

#[test]
fn test_merge_continues_past_failing_file() {
    let dir = tempdir().unwrap();

    // seconds that overflow once widened to nanoseconds
    let seconds = Arc::new(Schema::new(vec![Field::new(
        "ts",
        DataType::Timestamp(TimeUnit::Second, None),
        true,
    )]));
    let overflowing = RecordBatch::try_new(
        seconds,
        vec![Arc::new(TimestampSecondArray::from(vec![i64::MAX / 10]))],
    )
    .unwrap();
    write_batches_to_parquet(dir.path().join("a.parquet"), &[overflowing], None).unwrap();

    let nanos = Arc::new(Schema::new(vec![Field::new(
        "ts",
        DataType::Timestamp(TimeUnit::Nanosecond, None),
        true,
    )]));
    let fine = RecordBatch::try_new(
        nanos,
        vec![Arc::new(arrow::array::TimestampNanosecondArray::from(vec![
            1, 2, 3,
        ]))],
    )
    .unwrap();
    write_batches_to_parquet(dir.path().join("b.parquet"), &[fine], None).unwrap();

    let output = dir.path().join("merged.parquet");
    let report = merge(&MergeConfig::new(dir.path().to_str().unwrap(), &output)).unwrap();
    assert_eq!(report.files_matched, 2);
    assert_eq!(report.files_written, 1);
    assert_eq!(report.rows, 3);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("a.parquet"));
    assert!(report.failures[0].reason.contains("rejected batch"));

    // the same input is fatal under the strict policy
    let strict = MergeConfig::new(dir.path().to_str().unwrap(), &output)
        .with_cast_policy(CastPolicy::Strict);
    assert!(matches!(merge(&strict).unwrap_err(), Error::Cast { .. }));
}

// /dev/full accepts the open and fails every write with ENOSPC
#[cfg(target_os = "linux")]
#[test]
fn test_merge_output_write_failure_is_fatal() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let dir = tempdir().unwrap();
    write_ints(&dir.path().join("a.parquet"), 0, &[100_000]);
    write_ints(&dir.path().join("b.parquet"), 100_000, &[10]);
    let files = vec![dir.path().join("a.parquet"), dir.path().join("b.parquet")];

    let err = merge_files(&files, &MergeConfig::new("unused", full)).unwrap_err();
    assert!(matches!(err, Error::Output { .. }));
    assert!(!err.is_per_file());
    // the first input's row group fails, and the second is never attempted
    assert!(err.to_string().contains("Failed to flush row group"));
}

#[test]
fn test_merge_conflicting_types_is_fatal() {
    let dir = tempdir().unwrap();
    write_ints(&dir.path().join("a.parquet"), 0, &[2]);
    let text = RecordBatch::try_new(
        Arc::new(Schema::new(vec![Field::new("n", DataType::Utf8, false)])),
        vec![Arc::new(StringArray::from(vec!["x"]))],
    )
    .unwrap();
    write_batches_to_parquet(dir.path().join("b.parquet"), &[text], None).unwrap();

    let output = dir.path().join("merged.parquet");
    let err = merge(&MergeConfig::new(dir.path().to_str().unwrap(), &output)).unwrap_err();
    assert!(matches!(err, Error::SchemaUnification { ref field, .. } if field == "n"));
    assert!(!output.exists());
}

// ============================================================================
// Split Tests
// ============================================================================

#[test]
fn test_split_parts_last_partition_absorbs_remainder() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    write_ints(&input, 0, &[4, 3, 3]);

    let config = SplitConfig::new(&input, dir.path().join("parts"), Partitioning::Parts(3))
        .with_batch_size(3);
    let report = split(&config).unwrap();

    assert_eq!(report.input_rows, 10);
    assert_eq!(report.target_rows, 4);
    assert_eq!(partition_rows(&report), vec![4, 4, 2]);
    assert_eq!(report.rows_written(), 10);

    let mut values = Vec::new();
    for partition in &report.partitions {
        values.extend(read_ints(&partition.path));
    }
    assert_eq!(values, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_split_more_parts_than_rows() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    write_ints(&input, 0, &[3]);

    let config = SplitConfig::new(&input, dir.path().join("parts"), Partitioning::Parts(10));
    let report = split(&config).unwrap();
    assert_eq!(partition_rows(&report), vec![1, 1, 1]);
}

#[test]
fn test_split_rows_per_file_exact_multiple_has_no_trailing_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    write_ints(&input, 0, &[8]);

    let out = dir.path().join("parts");
    let config = SplitConfig::new(&input, &out, Partitioning::RowsPerFile(4)).with_verify(true);
    let report = split(&config).unwrap();

    assert_eq!(partition_rows(&report), vec![4, 4]);
    let verification = report.verification.unwrap();
    assert_eq!(verification.total_rows, 8);
    assert_eq!(verification.partitions.len(), 2);
    assert_eq!(verification.partitions[0].name, "part-00000.parquet");
    assert!(verification.partitions[0].size_bytes > 0);
}

#[test]
fn test_split_verification_ignores_partitions_from_earlier_runs() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    write_ints(&input, 0, &[100]);
    let out = dir.path().join("parts");

    split(&SplitConfig::new(&input, &out, Partitioning::Parts(4))).unwrap();
    let report = split(&SplitConfig::new(&input, &out, Partitioning::Parts(2)).with_verify(true))
        .unwrap();

    assert_eq!(partition_rows(&report), vec![50, 50]);
    let verification = report.verification.unwrap();
    assert_eq!(verification.total_rows, 100);
    let names: Vec<&str> = verification
        .partitions
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["part-00000.parquet", "part-00001.parquet"]);

    // leftovers are reported, not counted
    let produced: Vec<_> = report.partitions.iter().map(|p| p.path.clone()).collect();
    let stale = stale_partitions(&out, "part", &produced).unwrap();
    assert_eq!(stale.len(), 2);
    assert!(stale[0].ends_with("part-00002.parquet"));
    assert!(stale[1].ends_with("part-00003.parquet"));
}

#[test]
fn test_split_empty_input_writes_one_empty_partition() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.parquet");
    let writer = ParquetWriter::new(&input, int_schema(), &ParquetWriterConfig::default()).unwrap();
    writer.close().unwrap();

    let config = SplitConfig::new(&input, dir.path().join("parts"), Partitioning::Parts(4));
    let report = split(&config).unwrap();
    assert_eq!(partition_rows(&report), vec![0]);
    assert!(report.partitions[0].path.ends_with("part-00000.parquet"));
    assert_eq!(SourceFile::open(&report.partitions[0].path).unwrap().num_rows(), 0);
}

#[test]
fn test_split_flush_threshold_sets_row_groups() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    write_ints(&input, 0, &[25]);

    let config = SplitConfig::new(&input, dir.path().join("parts"), Partitioning::RowsPerFile(12))
        .with_prefix("chunk")
        .with_flush_rows(5)
        .with_batch_size(7);
    let report = split(&config).unwrap();

    assert_eq!(partition_rows(&report), vec![12, 12, 1]);
    assert!(report.partitions[2].path.ends_with("chunk-00002.parquet"));
    for partition in &report.partitions {
        let source = SourceFile::open(&partition.path).unwrap();
        for index in 0..source.num_row_groups() {
            assert!(source.row_group_rows(index) <= 5);
        }
    }
}

#[test]
fn test_split_keeps_input_codec() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.parquet");
    let config = ParquetWriterConfig::new().with_codec(Codec::Gzip);
    write_batches_to_parquet(&input, &[int_batch(0, 6)], Some(&config)).unwrap();

    let report = split(&SplitConfig::new(
        &input,
        dir.path().join("parts"),
        Partitioning::Parts(2),
    ))
    .unwrap();
    assert_eq!(report.codec.codec, Codec::Gzip);
    assert_eq!(report.codec.detected, Some(Codec::Gzip));
}

#[test]
fn test_split_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let config = SplitConfig::new(
        dir.path().join("input.parquet"),
        dir.path(),
        Partitioning::Parts(0),
    );
    assert!(matches!(
        split(&config).unwrap_err(),
        Error::InvalidConfigValue { .. }
    ));
}
