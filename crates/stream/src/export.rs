//! Conversion between telemetry records and Arrow batches.

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use wxresolve_core::{columns, DeviceRecord};

use crate::schema::cast_column;
use crate::{StreamError, StreamResult};

/// Arrow schema of the telemetry input, model column included.
pub fn telemetry_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(columns::NAME, DataType::Utf8, true),
        Field::new(columns::MODEL, DataType::Utf8, true),
        Field::new(columns::CELL_ID, DataType::Utf8, true),
        Field::new(columns::PUBLIC_KEY, DataType::Utf8, true),
        Field::new(columns::PACKET, DataType::Utf8, true),
        Field::new(columns::SIGNATURE, DataType::Utf8, true),
        Field::new(columns::LAT, DataType::Float64, true),
        Field::new(columns::LON, DataType::Float64, true),
        Field::new(columns::QOD_SCORE, DataType::Float64, true),
        Field::new(columns::POL_SCORE, DataType::Int64, true),
        Field::new(columns::TEMPERATURE, DataType::Float64, true),
    ]))
}

/// Build a batch with [`telemetry_schema`] from records.
pub fn records_to_batch(records: &[DeviceRecord]) -> StreamResult<RecordBatch> {
    let strings = |get: fn(&DeviceRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(records.iter().map(get)))
    };
    let floats = |get: fn(&DeviceRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(records.iter().map(get)))
    };

    let columns: Vec<ArrayRef> = vec![
        strings(|r| &r.name),
        Arc::new(StringArray::from(
            records.iter().map(|r| r.model.as_deref()).collect::<Vec<_>>(),
        )),
        strings(|r| &r.cell_id),
        strings(|r| &r.public_key),
        strings(|r| &r.packet),
        strings(|r| &r.signature),
        floats(|r| r.lat),
        floats(|r| r.lon),
        floats(|r| r.qod_score),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.pol_score))),
        floats(|r| r.temperature),
    ];
    Ok(RecordBatch::try_new(telemetry_schema(), columns)?)
}

/// Write records as a Parquet file in the telemetry layout.
///
/// `max_row_group_size` bounds the rows per row group, which is the unit of
/// low-memory ingestion.
pub fn write_parquet<P: AsRef<Path>>(
    path: P,
    records: &[DeviceRecord],
    max_row_group_size: usize,
) -> StreamResult<()> {
    let batch = records_to_batch(records)?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(max_row_group_size.max(1))
        .build();
    let mut writer = ArrowWriter::try_new(File::create(path)?, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Materialize a projected batch into records.
///
/// Null strings become empty strings and null numbers become NaN, so they
/// fail membership, quality and verification downstream.
pub fn batch_to_records(batch: &RecordBatch) -> StreamResult<Vec<DeviceRecord>> {
    let text = |name: &str| cast_column(batch, name, &DataType::Utf8);
    let name = text(columns::NAME)?;
    let cell_id = text(columns::CELL_ID)?;
    let public_key = text(columns::PUBLIC_KEY)?;
    let packet = text(columns::PACKET)?;
    let signature = text(columns::SIGNATURE)?;
    let model = match batch.column_by_name(columns::MODEL) {
        Some(_) => Some(text(columns::MODEL)?),
        None => None,
    };

    let float = |name: &str| cast_column(batch, name, &DataType::Float64);
    let lat = float(columns::LAT)?;
    let lon = float(columns::LON)?;
    let qod = float(columns::QOD_SCORE)?;
    let temperature = float(columns::TEMPERATURE)?;
    let pol = cast_column(batch, columns::POL_SCORE, &DataType::Int64)?;

    let name = utf8(&name, columns::NAME)?;
    let cell_id = utf8(&cell_id, columns::CELL_ID)?;
    let public_key = utf8(&public_key, columns::PUBLIC_KEY)?;
    let packet = utf8(&packet, columns::PACKET)?;
    let signature = utf8(&signature, columns::SIGNATURE)?;
    let model = model
        .as_ref()
        .map(|array| utf8(array, columns::MODEL))
        .transpose()?;
    let lat = f64s(&lat, columns::LAT)?;
    let lon = f64s(&lon, columns::LON)?;
    let qod = f64s(&qod, columns::QOD_SCORE)?;
    let temperature = f64s(&temperature, columns::TEMPERATURE)?;
    let pol = pol
        .as_primitive_opt::<Int64Type>()
        .ok_or_else(|| unsupported(columns::POL_SCORE, pol.data_type()))?;

    let text_at = |array: &StringArray, row: usize| -> String {
        if array.is_valid(row) {
            array.value(row).to_string()
        } else {
            String::new()
        }
    };
    let float_at = |array: &arrow::array::PrimitiveArray<Float64Type>, row: usize| -> f64 {
        if array.is_valid(row) {
            array.value(row)
        } else {
            f64::NAN
        }
    };

    Ok((0..batch.num_rows())
        .map(|row| DeviceRecord {
            name: text_at(name, row),
            model: model
                .filter(|array| array.is_valid(row))
                .map(|array| array.value(row).to_string()),
            cell_id: text_at(cell_id, row),
            public_key: text_at(public_key, row),
            packet: text_at(packet, row),
            signature: text_at(signature, row),
            lat: float_at(lat, row),
            lon: float_at(lon, row),
            qod_score: float_at(qod, row),
            // A null flag never equals a required value
            pol_score: if pol.is_valid(row) { pol.value(row) } else { i64::MIN },
            temperature: float_at(temperature, row),
        })
        .collect())
}

fn utf8<'a>(array: &'a ArrayRef, column: &str) -> StreamResult<&'a StringArray> {
    array
        .as_string_opt::<i32>()
        .ok_or_else(|| unsupported(column, array.data_type()))
}

fn f64s<'a>(
    array: &'a ArrayRef,
    column: &str,
) -> StreamResult<&'a arrow::array::PrimitiveArray<Float64Type>> {
    array
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| unsupported(column, array.data_type()))
}

fn unsupported(column: &str, data_type: &DataType) -> StreamError {
    StreamError::UnsupportedColumnType {
        column: column.to_string(),
        data_type: data_type.to_string(),
    }
}
