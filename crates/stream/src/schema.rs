//! Column projection and type narrowing.

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ProjectionMask;
use parquet::schema::types::SchemaDescriptor;
use std::sync::Arc;

use wxresolve_core::columns;

use crate::{StreamError, StreamResult};

/// Root columns of a file that the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Root column indices in file order
    pub indices: Vec<usize>,
    /// Whether the optional model column is present
    pub has_model: bool,
}

impl ColumnSelection {
    /// Resolve required and optional columns against a Parquet schema.
    ///
    /// Lookups are by exact root name; nested leaves sharing a prefix are
    /// never selected.
    pub fn resolve(schema: &SchemaDescriptor) -> StreamResult<Self> {
        let roots = schema.root_schema().get_fields();
        let position = |name: &str| roots.iter().position(|field| field.name() == name);

        let mut indices = Vec::with_capacity(columns::REQUIRED.len() + columns::OPTIONAL.len());
        for name in columns::REQUIRED {
            let index = position(name).ok_or_else(|| StreamError::MissingColumn {
                column: name.to_string(),
            })?;
            indices.push(index);
        }

        let mut has_model = false;
        for name in columns::OPTIONAL {
            if let Some(index) = position(name) {
                indices.push(index);
                has_model |= name == columns::MODEL;
            }
        }

        indices.sort_unstable();
        Ok(Self { indices, has_model })
    }

    /// Projection mask selecting only these roots.
    pub fn mask(&self, schema: &SchemaDescriptor) -> ProjectionMask {
        ProjectionMask::roots(schema, self.indices.iter().copied())
    }
}

/// Narrowed type for a column in low-memory mode, `None` to keep as read.
pub fn narrow_type(column: &str) -> Option<DataType> {
    match column {
        columns::LAT | columns::LON | columns::QOD_SCORE | columns::TEMPERATURE => {
            Some(DataType::Float32)
        }
        columns::POL_SCORE => Some(DataType::Int8),
        columns::NAME
        | columns::MODEL
        | columns::CELL_ID
        | columns::PUBLIC_KEY
        | columns::PACKET
        | columns::SIGNATURE => Some(dictionary_utf8()),
        _ => None,
    }
}

pub(crate) fn dictionary_utf8() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

/// Downcast numeric columns and dictionary-encode low-cardinality strings.
pub fn narrow_batch(batch: &RecordBatch) -> StreamResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        match narrow_type(field.name()) {
            Some(target) if column.data_type() != &target => {
                arrays.push(cast(column.as_ref(), &target)?);
                fields.push(Field::new(field.name(), target, true));
            }
            _ => {
                arrays.push(column.clone());
                fields.push(field.as_ref().clone());
            }
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Look up a projected column by name.
pub(crate) fn column<'a>(batch: &'a RecordBatch, name: &str) -> StreamResult<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StreamError::MissingColumn {
            column: name.to_string(),
        })
}

/// Cast a column, reporting the column name when the type cannot convert.
pub(crate) fn cast_column(
    batch: &RecordBatch,
    name: &str,
    target: &DataType,
) -> StreamResult<ArrayRef> {
    let array = column(batch, name)?;
    if array.data_type() == target {
        return Ok(array.clone());
    }
    cast(array.as_ref(), target).map_err(|_| StreamError::UnsupportedColumnType {
        column: name.to_string(),
        data_type: array.data_type().to_string(),
    })
}
