//! Target schema types

use crate::error::{Error, Result};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One column of the output layout
#[derive(Debug, Clone, PartialEq)]
pub enum TargetField {
    /// A column with a known type, taken from at least one input
    Typed(FieldRef),
    /// A requested column that no input provides; materialized as all nulls
    Placeholder(String),
}

impl TargetField {
    /// Column name
    pub fn name(&self) -> &str {
        match self {
            TargetField::Typed(field) => field.name(),
            TargetField::Placeholder(name) => name,
        }
    }

    /// Whether this column has a deferred (null) type
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TargetField::Placeholder(_))
    }

    /// Arrow field used when writing. Placeholders become nullable `Null` columns.
    pub fn to_arrow(&self) -> FieldRef {
        match self {
            TargetField::Typed(field) => field.clone(),
            TargetField::Placeholder(name) => Arc::new(Field::new(name, DataType::Null, true)),
        }
    }
}

/// The unified, optionally projected and coerced schema every chunk is
/// materialized against.
///
/// Computed once per run and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSchema {
    fields: Vec<TargetField>,
    arrow: SchemaRef,
}

impl TargetSchema {
    /// Build a target schema, rejecting duplicate column names
    pub fn new(fields: Vec<TargetField>) -> Result<Self> {
        Self::with_metadata(fields, HashMap::new())
    }

    /// Pass-through target for a single file: every column typed, schema metadata kept
    pub fn from_arrow(schema: &Schema) -> Result<Self> {
        let fields = schema
            .fields()
            .iter()
            .map(|field| TargetField::Typed(field.clone()))
            .collect();
        Self::with_metadata(fields, schema.metadata().clone())
    }

    fn with_metadata(fields: Vec<TargetField>, metadata: HashMap<String, String>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(Error::config(format!(
                    "duplicate column '{}' in target schema",
                    field.name()
                )));
            }
        }
        Ok(Self::build(fields, metadata))
    }

    fn build(fields: Vec<TargetField>, metadata: HashMap<String, String>) -> Self {
        let arrow_fields: Vec<FieldRef> = fields.iter().map(TargetField::to_arrow).collect();
        let arrow = Arc::new(Schema::new_with_metadata(arrow_fields, metadata));
        Self { fields, arrow }
    }

    /// Rebuild with the same names in the same order
    pub(crate) fn map_fields(&self, f: impl Fn(&TargetField) -> TargetField) -> Self {
        let fields = self.fields.iter().map(f).collect();
        Self::build(fields, self.arrow.metadata().clone())
    }

    /// Fields in output order
    pub fn fields(&self) -> &[TargetField] {
        &self.fields
    }

    /// Arrow schema handed to writers and used to assemble chunks
    pub fn arrow_schema(&self) -> SchemaRef {
        self.arrow.clone()
    }

    /// Column names in output order
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name().to_string()).collect()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&TargetField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Names of columns that no input provides
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_placeholder())
            .map(TargetField::name)
            .collect()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
