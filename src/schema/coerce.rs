//! Timestamp unit coercion and the cast policy used during materialization

use super::types::{TargetField, TargetSchema};
use crate::types::TimestampUnit;
use arrow::datatypes::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do when a column cannot be cast to its target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastPolicy {
    /// Keep the column in its original type and report a fallback.
    /// The chunk then no longer matches the writer schema and the write fails.
    #[default]
    CastOrKeepOriginal,
    /// Fail the run with a cast error
    Strict,
}

impl CastPolicy {
    /// Policy name as shown in logs
    pub fn as_str(self) -> &'static str {
        match self {
            CastPolicy::CastOrKeepOriginal => "cast-or-keep-original",
            CastPolicy::Strict => "strict",
        }
    }
}

/// Rewrite every timestamp column to `unit`, keeping timezone, nullability
/// and field metadata. Non-timestamp columns and placeholders pass through.
pub fn coerce_timestamps(schema: &TargetSchema, unit: Option<TimestampUnit>) -> TargetSchema {
    let Some(unit) = unit else {
        return schema.clone();
    };
    let unit = TimeUnit::from(unit);

    schema.map_fields(|field| match field {
        TargetField::Typed(f) => match f.data_type() {
            DataType::Timestamp(current, tz) if *current != unit => TargetField::Typed(Arc::new(
                f.as_ref()
                    .clone()
                    .with_data_type(DataType::Timestamp(unit, tz.clone())),
            )),
            _ => field.clone(),
        },
        TargetField::Placeholder(_) => field.clone(),
    })
}
