//! Schema unification, projection and coercion tests

use super::*;
use crate::error::Error;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use test_case::test_case;

fn schema(fields: Vec<Field>) -> SchemaRef {
    Arc::new(Schema::new(fields))
}

fn ts(unit: TimeUnit, tz: Option<&str>) -> DataType {
    DataType::Timestamp(unit, tz.map(Into::into))
}

fn names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

fn by_name(schema: &Schema) -> HashMap<String, (DataType, bool)> {
    schema
        .fields()
        .iter()
        .map(|f| (f.name().clone(), (f.data_type().clone(), f.is_nullable())))
        .collect()
}

// ============================================================================
// Unification Tests
// ============================================================================

#[test]
fn test_unify_superset_in_first_appearance_order() {
    let a = schema(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("ts", ts(TimeUnit::Microsecond, None), true),
    ]);
    let b = schema(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Float64, true),
    ]);
    let c = schema(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("ts", ts(TimeUnit::Microsecond, None), true),
        Field::new("value", DataType::Float64, true),
    ]);

    let unified = unify_schemas(&[a, b, c]).unwrap();
    assert_eq!(names(&unified), vec!["id", "ts", "value"]);
}

#[test]
fn test_unify_marks_partially_present_fields_nullable() {
    let a = schema(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
    ]);
    let b = schema(vec![Field::new("id", DataType::Int64, false)]);

    let unified = unify_schemas(&[a, b]).unwrap();
    assert!(!unified.field_with_name("id").unwrap().is_nullable());
    assert!(unified.field_with_name("name").unwrap().is_nullable());
}

#[test]
fn test_unify_is_order_independent() {
    let a = schema(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("ts", ts(TimeUnit::Millisecond, Some("UTC")), true),
    ]);
    let b = schema(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("label", DataType::Utf8, true),
    ]);
    let c = schema(vec![
        Field::new("ts", ts(TimeUnit::Nanosecond, Some("UTC")), false),
        Field::new("label", DataType::LargeUtf8, true),
    ]);

    let orders = [
        vec![a.clone(), b.clone(), c.clone()],
        vec![c.clone(), b.clone(), a.clone()],
        vec![b.clone(), a.clone(), c.clone()],
        vec![c.clone(), a.clone(), b.clone()],
    ];
    let expected = by_name(&unify_schemas(&orders[0]).unwrap());
    for order in &orders[1..] {
        assert_eq!(by_name(&unify_schemas(order).unwrap()), expected);
    }
    assert_eq!(expected["id"], (DataType::Int64, true));
    assert_eq!(expected["ts"], (ts(TimeUnit::Nanosecond, Some("UTC")), true));
    assert_eq!(expected["label"], (DataType::LargeUtf8, true));
}

#[test]
fn test_unify_rejects_incompatible_types() {
    let a = schema(vec![Field::new("id", DataType::Int64, false)]);
    let b = schema(vec![Field::new("id", DataType::Utf8, false)]);

    let err = unify_schemas(&[a, b]).unwrap_err();
    assert!(matches!(err, Error::SchemaUnification { ref field, .. } if field == "id"));
}

#[test]
fn test_unify_requires_a_schema() {
    assert!(matches!(
        unify_schemas(&[]).unwrap_err(),
        Error::NoReadableSchemas
    ));
}

#[test]
fn test_unify_keeps_first_metadata() {
    let mut meta = HashMap::new();
    meta.insert("origin".to_string(), "sensor".to_string());
    let a = schema(vec![Field::new("v", DataType::Int32, true).with_metadata(meta.clone())]);
    let b = schema(vec![Field::new("v", DataType::Int64, true)]);

    let unified = unify_schemas(&[a, b]).unwrap();
    let field = unified.field_with_name("v").unwrap();
    assert_eq!(field.data_type(), &DataType::Int64);
    assert_eq!(field.metadata(), &meta);
}

// ============================================================================
// Widening Rule Tests
// ============================================================================

#[test_case(DataType::Null, DataType::Utf8, DataType::Utf8; "null defers")]
#[test_case(DataType::Int8, DataType::Int32, DataType::Int32; "signed widening")]
#[test_case(DataType::UInt16, DataType::UInt8, DataType::UInt16; "unsigned widening")]
#[test_case(DataType::Int16, DataType::UInt32, DataType::Int64; "mixed signedness")]
#[test_case(DataType::Int64, DataType::UInt64, DataType::Float64; "uint64 mixed")]
#[test_case(DataType::Float32, DataType::Int64, DataType::Float64; "float with int")]
#[test_case(DataType::Float16, DataType::Float32, DataType::Float64; "floats")]
#[test_case(DataType::Utf8, DataType::LargeUtf8, DataType::LargeUtf8; "strings")]
#[test_case(DataType::Binary, DataType::LargeBinary, DataType::LargeBinary; "binaries")]
#[test_case(DataType::Date32, DataType::Date64, DataType::Date64; "dates")]
fn test_widen_types(left: DataType, right: DataType, expected: DataType) {
    assert_eq!(widen_types("c", &left, &right).unwrap(), expected);
    assert_eq!(widen_types("c", &right, &left).unwrap(), expected);
}

#[test]
fn test_widen_timestamps_takes_finer_unit_and_keeps_tz() {
    let widened = widen_types(
        "ts",
        &ts(TimeUnit::Second, Some("Europe/Paris")),
        &ts(TimeUnit::Microsecond, Some("Europe/Paris")),
    )
    .unwrap();
    assert_eq!(widened, ts(TimeUnit::Microsecond, Some("Europe/Paris")));
}

#[test_case(DataType::Int64, DataType::Utf8; "numeric to string")]
#[test_case(DataType::Boolean, DataType::Int8; "bool to numeric")]
#[test_case(DataType::Decimal128(10, 2), DataType::Float64; "decimal to float")]
#[test_case(DataType::Date32, DataType::Timestamp(TimeUnit::Second, None); "date to timestamp")]
fn test_widen_conflicts(left: DataType, right: DataType) {
    assert!(widen_types("c", &left, &right).is_err());
    assert!(widen_types("c", &right, &left).is_err());
}

#[test]
fn test_widen_rejects_timezone_mismatch() {
    let result = widen_types(
        "ts",
        &ts(TimeUnit::Millisecond, Some("UTC")),
        &ts(TimeUnit::Millisecond, None),
    );
    assert!(result.is_err());
}

#[test]
fn test_widen_is_associative_over_integers() {
    let types = [
        DataType::Int8,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt64,
        DataType::Float32,
    ];
    for a in &types {
        for b in &types {
            for c in &types {
                let left = widen_types("x", &widen_types("x", a, b).unwrap(), c).unwrap();
                let right = widen_types("x", a, &widen_types("x", b, c).unwrap()).unwrap();
                assert_eq!(left, right, "({a:?}, {b:?}, {c:?})");
            }
        }
    }
}

// ============================================================================
// Projection Tests
// ============================================================================

#[test]
fn test_project_reorders_and_adds_placeholders() {
    let unified = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("ts", ts(TimeUnit::Millisecond, None), true),
        Field::new("value", DataType::Float64, true),
    ]);
    let columns = vec![
        "value".to_string(),
        "missing".to_string(),
        "id".to_string(),
    ];

    let target = project_schema(&unified, Some(columns.as_slice())).unwrap();
    assert_eq!(target.column_names(), columns);
    assert_eq!(target.placeholder_names(), vec!["missing"]);

    let arrow = target.arrow_schema();
    let missing = arrow.field_with_name("missing").unwrap();
    assert_eq!(missing.data_type(), &DataType::Null);
    assert!(missing.is_nullable());
    assert_eq!(
        arrow.field_with_name("value").unwrap().data_type(),
        &DataType::Float64
    );
}

#[test]
fn test_project_without_columns_keeps_everything() {
    let unified = Schema::new(vec![
        Field::new("a", DataType::Int32, true),
        Field::new("b", DataType::Utf8, true),
    ]);

    let all = project_schema(&unified, None).unwrap();
    let empty = project_schema(&unified, Some(&[][..])).unwrap();
    assert_eq!(all.column_names(), vec!["a", "b"]);
    assert_eq!(all, empty);
    assert!(all.placeholder_names().is_empty());
}

#[test]
fn test_project_rejects_duplicates() {
    let unified = Schema::new(vec![Field::new("a", DataType::Int32, true)]);
    let columns = vec!["a".to_string(), "a".to_string()];
    assert!(project_schema(&unified, Some(columns.as_slice())).is_err());
}

#[test]
fn test_target_schema_rejects_duplicate_names() {
    let result = TargetSchema::new(vec![
        TargetField::Placeholder("x".to_string()),
        TargetField::Placeholder("x".to_string()),
    ]);
    assert!(result.is_err());
}

// ============================================================================
// Coercion Tests
// ============================================================================

fn coercion_fixture() -> TargetSchema {
    TargetSchema::new(vec![
        TargetField::Typed(Arc::new(Field::new(
            "created",
            ts(TimeUnit::Nanosecond, Some("UTC")),
            false,
        ))),
        TargetField::Typed(Arc::new(Field::new(
            "updated",
            ts(TimeUnit::Second, None),
            true,
        ))),
        TargetField::Typed(Arc::new(Field::new("id", DataType::Int64, false))),
        TargetField::Placeholder("later".to_string()),
    ])
    .unwrap()
}

#[test]
fn test_coerce_rewrites_timestamp_units() {
    let coerced = coerce_timestamps(&coercion_fixture(), Some(TimestampUnit::Us));
    let arrow = coerced.arrow_schema();

    let created = arrow.field_with_name("created").unwrap();
    assert_eq!(
        created.data_type(),
        &ts(TimeUnit::Microsecond, Some("UTC"))
    );
    assert!(!created.is_nullable());

    let updated = arrow.field_with_name("updated").unwrap();
    assert_eq!(updated.data_type(), &ts(TimeUnit::Microsecond, None));
    assert!(updated.is_nullable());

    assert_eq!(
        arrow.field_with_name("id").unwrap().data_type(),
        &DataType::Int64
    );
    assert!(coerced.field("later").unwrap().is_placeholder());
}

#[test]
fn test_coerce_is_idempotent() {
    let once = coerce_timestamps(&coercion_fixture(), Some(TimestampUnit::Ms));
    let twice = coerce_timestamps(&once, Some(TimestampUnit::Ms));
    assert_eq!(once, twice);
}

#[test]
fn test_coerce_without_unit_is_noop() {
    let fixture = coercion_fixture();
    assert_eq!(coerce_timestamps(&fixture, None), fixture);
}

#[test]
fn test_build_target_schema() {
    let a = schema(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("ts", ts(TimeUnit::Nanosecond, None), true),
    ]);
    let b = schema(vec![Field::new("id", DataType::Int64, false)]);
    let columns = vec!["ts".to_string(), "id".to_string()];

    let target = build_target_schema(&[a, b], Some(columns.as_slice()), Some(TimestampUnit::Ms)).unwrap();
    let arrow = target.arrow_schema();
    assert_eq!(names(&arrow), vec!["ts", "id"]);
    assert_eq!(
        arrow.field(0).data_type(),
        &ts(TimeUnit::Millisecond, None)
    );
    assert_eq!(arrow.field(1).data_type(), &DataType::Int64);
}

#[test_case(CastPolicy::CastOrKeepOriginal, "cast-or-keep-original")]
#[test_case(CastPolicy::Strict, "strict")]
fn test_cast_policy_name_matches_serde(policy: CastPolicy, expected: &str) {
    assert_eq!(policy.as_str(), expected);
    assert_eq!(serde_json::to_value(policy).unwrap(), expected);
}
