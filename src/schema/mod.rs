//! Schema module
//!
//! Computes the target schema every streamed chunk is materialized against.
//!
//! # Features
//!
//! - **Unification**: superset of fields across inputs with type widening
//! - **Projection**: restrict/reorder to requested columns, placeholders for absent ones
//! - **Coercion**: rewrite timestamp columns to a single unit
//! - **Cast policy**: what happens when a chunk column cannot be cast

mod coerce;
mod types;
mod unify;

pub use coerce::{coerce_timestamps, CastPolicy};
pub use types::{TargetField, TargetSchema};
pub use unify::{project_schema, unify_schemas, widen_types};

use crate::error::Result;
use crate::types::TimestampUnit;
use arrow::datatypes::SchemaRef;

/// Unify, project and coerce in one step
pub fn build_target_schema(
    schemas: &[SchemaRef],
    columns: Option<&[String]>,
    coerce: Option<TimestampUnit>,
) -> Result<TargetSchema> {
    let unified = unify_schemas(schemas)?;
    let projected = project_schema(&unified, columns)?;
    Ok(coerce_timestamps(&projected, coerce))
}

#[cfg(test)]
mod tests;
