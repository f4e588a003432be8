//! Row batch materialization
//!
//! Lines a chunk up with the target schema: columns in target order, absent
//! columns filled with nulls, mismatched types cast.

use super::types::CastFallback;
use crate::error::{Error, Result};
use crate::schema::{CastPolicy, TargetSchema};
use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::{can_cast_types, cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;

/// A materialized chunk and the casts that fell back
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Chunk in target layout
    pub batch: RecordBatch,
    /// Columns left in their original type
    pub fallbacks: Vec<CastFallback>,
}

/// Build a chunk whose columns match `target` in order, name and type.
///
/// The row count is preserved. Under [`CastPolicy::CastOrKeepOriginal`] a
/// failed cast keeps the original column and is reported as a fallback, so
/// the returned schema differs from `target` in exactly those columns.
pub fn materialize_batch(
    batch: &RecordBatch,
    target: &TargetSchema,
    policy: CastPolicy,
) -> Result<Materialized> {
    let rows = batch.num_rows();
    let source = batch.schema();
    let mut fields = Vec::with_capacity(target.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(target.len());
    let mut fallbacks = Vec::new();

    for target_field in target.fields() {
        let wanted = target_field.to_arrow();

        let Ok(index) = source.index_of(target_field.name()) else {
            tracing::trace!(column = target_field.name(), "filling absent column with nulls");
            columns.push(new_null_array(wanted.data_type(), rows));
            fields.push(Arc::new(wanted.as_ref().clone().with_nullable(true)));
            continue;
        };

        let column = batch.column(index);
        let from = column.data_type();
        let to = wanted.data_type();
        if from == to {
            columns.push(column.clone());
            fields.push(wanted);
            continue;
        }

        match cast_column(column, to) {
            Ok(cast) => {
                columns.push(cast);
                fields.push(wanted);
            }
            Err(reason) => match policy {
                CastPolicy::Strict => {
                    return Err(Error::Cast {
                        column: target_field.name().to_string(),
                        from: from.to_string(),
                        to: to.to_string(),
                        message: reason,
                    });
                }
                CastPolicy::CastOrKeepOriginal => {
                    tracing::warn!(
                        column = target_field.name(),
                        from = %from,
                        to = %to,
                        policy = policy.as_str(),
                        "cast failed, keeping original type: {reason}"
                    );
                    fallbacks.push(CastFallback {
                        column: target_field.name().to_string(),
                        from: from.to_string(),
                        to: to.to_string(),
                        reason,
                    });
                    fields.push(Arc::new(Field::new(
                        target_field.name(),
                        from.clone(),
                        true,
                    )));
                    columns.push(column.clone());
                }
            },
        }
    }

    let schema = Arc::new(Schema::new_with_metadata(
        fields,
        target.arrow_schema().metadata().clone(),
    ));
    let batch = RecordBatch::try_new_with_options(
        schema,
        columns,
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )?;
    Ok(Materialized { batch, fallbacks })
}

fn cast_column(column: &ArrayRef, to: &DataType) -> std::result::Result<ArrayRef, String> {
    if !can_cast_types(column.data_type(), to) {
        return Err(format!("no cast from {} to {to}", column.data_type()));
    }
    // overflow and unparsable values are errors, not nulls
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(column, to, &options).map_err(|e| e.to_string())
}
