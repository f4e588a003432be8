//! Superschema computation across heterogeneous inputs

use super::types::{TargetField, TargetSchema};
use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::collections::{HashMap, HashSet};

/// Combine per-file schemas into one superschema.
///
/// Fields are ordered by first appearance. A field missing from any input
/// becomes nullable, nullability is otherwise OR-ed, and the metadata of the
/// first occurrence is kept. Conflicting types are widened with
/// [`widen_types`]; a conflict with no widening fails the whole unification.
pub fn unify_schemas(schemas: &[SchemaRef]) -> Result<Schema> {
    if schemas.is_empty() {
        return Err(Error::NoReadableSchemas);
    }

    let mut fields: Vec<Field> = Vec::new();
    let mut occurrences: Vec<usize> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for schema in schemas {
        for field in schema.fields() {
            if let Some(&i) = index.get(field.name()) {
                let existing = &fields[i];
                let data_type =
                    widen_types(field.name(), existing.data_type(), field.data_type())?;
                let nullable = existing.is_nullable() || field.is_nullable();
                fields[i] = existing
                    .clone()
                    .with_data_type(data_type)
                    .with_nullable(nullable);
                occurrences[i] += 1;
            } else {
                index.insert(field.name().clone(), fields.len());
                fields.push(field.as_ref().clone());
                occurrences.push(1);
            }
        }
    }

    let fields: Vec<Field> = fields
        .into_iter()
        .zip(occurrences)
        .map(|(field, seen)| {
            if seen < schemas.len() {
                field.with_nullable(true)
            } else {
                field
            }
        })
        .collect();

    Ok(Schema::new(fields))
}

/// Restrict and reorder a superschema to the requested columns.
///
/// Requested names missing from the superschema become placeholders. With no
/// request (or an empty one) every superschema field is kept in order.
pub fn project_schema(unified: &Schema, columns: Option<&[String]>) -> Result<TargetSchema> {
    let Some(columns) = columns.filter(|c| !c.is_empty()) else {
        return TargetSchema::new(
            unified
                .fields()
                .iter()
                .map(|f| TargetField::Typed(f.clone()))
                .collect(),
        );
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(Error::invalid_value(
                "columns",
                format!("column '{name}' requested more than once"),
            ));
        }
        match unified.field_with_name(name) {
            Ok(field) => fields.push(TargetField::Typed(std::sync::Arc::new(field.clone()))),
            Err(_) => {
                tracing::debug!(column = %name, "requested column not found in any input; filling with nulls");
                fields.push(TargetField::Placeholder(name.clone()));
            }
        }
    }
    TargetSchema::new(fields)
}

/// Promote two types of the same column to a common type.
///
/// The rule is symmetric and associative over the cases it accepts:
/// nulls defer to the other side, timestamps with the same timezone take the
/// finer unit, integers of one signedness take the wider width, mixed
/// signedness goes to `Int64` (or `Float64` when `UInt64` is involved), any
/// float goes to `Float64`, and string/binary widths take the large variant.
/// Everything else is a conflict.
pub fn widen_types(field: &str, left: &DataType, right: &DataType) -> Result<DataType> {
    if left == right {
        return Ok(left.clone());
    }

    let widened = match (left, right) {
        (DataType::Null, other) | (other, DataType::Null) => Some(other.clone()),
        (DataType::Timestamp(lu, ltz), DataType::Timestamp(ru, rtz)) if ltz == rtz => {
            Some(DataType::Timestamp(finer_unit(*lu, *ru), ltz.clone()))
        }
        (DataType::Date32, DataType::Date64) | (DataType::Date64, DataType::Date32) => {
            Some(DataType::Date64)
        }
        (DataType::Utf8, DataType::LargeUtf8) | (DataType::LargeUtf8, DataType::Utf8) => {
            Some(DataType::LargeUtf8)
        }
        (DataType::Binary, DataType::LargeBinary) | (DataType::LargeBinary, DataType::Binary) => {
            Some(DataType::LargeBinary)
        }
        (l, r) if l.is_numeric() && r.is_numeric() => widen_numeric(l, r),
        _ => None,
    };

    widened.ok_or_else(|| Error::SchemaUnification {
        field: field.to_string(),
        left: format!("{left:?}"),
        right: format!("{right:?}"),
    })
}

fn finer_unit(left: TimeUnit, right: TimeUnit) -> TimeUnit {
    fn rank(unit: TimeUnit) -> u8 {
        match unit {
            TimeUnit::Second => 0,
            TimeUnit::Millisecond => 1,
            TimeUnit::Microsecond => 2,
            TimeUnit::Nanosecond => 3,
        }
    }
    if rank(left) >= rank(right) {
        left
    } else {
        right
    }
}

/// (signed, bit width) of an integer type
fn int_kind(data_type: &DataType) -> Option<(bool, u8)> {
    match data_type {
        DataType::Int8 => Some((true, 8)),
        DataType::Int16 => Some((true, 16)),
        DataType::Int32 => Some((true, 32)),
        DataType::Int64 => Some((true, 64)),
        DataType::UInt8 => Some((false, 8)),
        DataType::UInt16 => Some((false, 16)),
        DataType::UInt32 => Some((false, 32)),
        DataType::UInt64 => Some((false, 64)),
        _ => None,
    }
}

fn int_type(signed: bool, bits: u8) -> DataType {
    match (signed, bits) {
        (true, 8) => DataType::Int8,
        (true, 16) => DataType::Int16,
        (true, 32) => DataType::Int32,
        (true, _) => DataType::Int64,
        (false, 8) => DataType::UInt8,
        (false, 16) => DataType::UInt16,
        (false, 32) => DataType::UInt32,
        (false, _) => DataType::UInt64,
    }
}

fn is_float(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Float16 | DataType::Float32 | DataType::Float64
    )
}

fn widen_numeric(left: &DataType, right: &DataType) -> Option<DataType> {
    // decimals only unify with themselves (handled by the equality check)
    let plain = |dt: &DataType| is_float(dt) || int_kind(dt).is_some();
    if !plain(left) || !plain(right) {
        return None;
    }

    if is_float(left) || is_float(right) {
        return Some(DataType::Float64);
    }

    let (lsigned, lbits) = int_kind(left)?;
    let (rsigned, rbits) = int_kind(right)?;

    if lsigned == rsigned {
        return Some(int_type(lsigned, lbits.max(rbits)));
    }

    let unsigned_bits = if lsigned { rbits } else { lbits };
    if unsigned_bits == 64 {
        Some(DataType::Float64)
    } else {
        Some(DataType::Int64)
    }
}
