// src/table/arrow.rs

use anyhow::{Context, Result};
use arrow::{
    array::{
        ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
    },
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{Column, ColumnKind, NormalizedTable, Value};

/// Map a column kind into an Arrow DataType.
///
/// - Integer   → Int64
/// - Float     → Float64
/// - Timestamp → Timestamp(µs, UTC)
/// - Boolean   → Boolean
/// - Text      → Utf8 (numeric cells of a mixed column are rendered)
pub fn map_to_arrow_type(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Integer => DataType::Int64,
        ColumnKind::Float => DataType::Float64,
        ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from("UTC"))),
        ColumnKind::Boolean => DataType::Boolean,
        ColumnKind::Text => DataType::Utf8,
    }
}

/// Build an ArrowSchema (inside an Arc) from a table's columns.
pub fn build_arrow_schema(table: &NormalizedTable) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = table
        .columns()
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(col.kind), /* nullable = */ true))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

fn column_to_array(col: &Column) -> ArrayRef {
    match col.kind {
        ColumnKind::Integer => {
            let vals: Vec<Option<i64>> = col
                .values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(vals))
        }
        ColumnKind::Float => {
            let vals: Vec<Option<f64>> = col.values.iter().map(Value::as_f64).collect();
            Arc::new(Float64Array::from(vals))
        }
        ColumnKind::Boolean => {
            let vals: Vec<Option<bool>> = col
                .values
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(vals))
        }
        ColumnKind::Timestamp => {
            let vals: Vec<Option<i64>> = col
                .values
                .iter()
                .map(|v| match v {
                    Value::Timestamp(ts) => Some(ts.timestamp_micros()),
                    _ => None,
                })
                .collect();
            Arc::new(TimestampMicrosecondArray::from(vals).with_timezone("UTC"))
        }
        ColumnKind::Text => {
            let vals: Vec<Option<String>> = col.values.iter().map(Value::render).collect();
            Arc::new(StringArray::from(vals))
        }
    }
}

/// Convert a normalized table into a single Arrow record batch.
pub fn to_record_batch(table: &NormalizedTable) -> Result<RecordBatch> {
    let schema = build_arrow_schema(table);
    let arrays: Vec<ArrayRef> = table.columns().iter().map(column_to_array).collect();
    RecordBatch::try_new(schema, arrays)
        .with_context(|| format!("building record batch for {}", table.name))
}
