//! Reading rows back into application values.
//!
//! A row comes back from the driver in storage representation: signed
//! integers where the table declares unsigned ones, text for chars, bare
//! integers for enums. [`decode_row`] runs every column through its
//! [`BoundaryConversion::from_storage`](crate::types::BoundaryConversion::from_storage)
//! so record types only ever see application values. [`read_row`] does the
//! same straight from a `tokio_postgres::Row`.

use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::TableSchema;
use crate::types::SemanticType;
use crate::value::Value;

/// Convert a row of storage values, in column declaration order, into
/// application values.
pub fn decode_row(schema: &TableSchema, row: Vec<Value>) -> SchemaResult<Vec<Value>> {
    if row.len() != schema.columns().len() {
        return Err(SchemaError::decode(
            schema.table_name(),
            format!(
                "expected {} columns, got {}",
                schema.columns().len(),
                row.len()
            ),
        ));
    }

    schema
        .columns()
        .iter()
        .zip(row)
        .map(|(column, value)| {
            if value.is_null() && !column.nullable {
                return Err(SchemaError::decode(&column.name, "unexpected NULL"));
            }
            schema
                .type_mapper()
                .boundary_conversion(&column.ty)
                .from_storage(value)
                .map_err(|e| SchemaError::decode(&column.name, e.to_string()))
        })
        .collect()
}

/// Read every column of `schema` from a driver row and decode it.
///
/// Columns are looked up by name, so `SELECT *` and explicit column lists
/// in any order both work.
pub fn read_row(schema: &TableSchema, row: &Row) -> SchemaResult<Vec<Value>> {
    let storage = schema
        .columns()
        .iter()
        .map(|column| row.storage_value(&column.name, &column.ty))
        .collect::<SchemaResult<Vec<_>>>()?;
    decode_row(schema, storage)
}

/// Extension trait for Row to read storage values by semantic type.
pub trait RowExt {
    /// Read `column` in the storage representation of `ty`.
    fn storage_value(&self, column: &str, ty: &SemanticType) -> SchemaResult<Value>;
}

impl RowExt for Row {
    fn storage_value(&self, column: &str, ty: &SemanticType) -> SchemaResult<Value> {
        match ty {
            SemanticType::Bool => get(self, column, Value::Bool),
            SemanticType::Int8
            | SemanticType::UInt8
            | SemanticType::Int16
            | SemanticType::UInt16 => get(self, column, Value::I16),
            SemanticType::Int32 | SemanticType::UInt32 => get(self, column, Value::I32),
            SemanticType::Int64 | SemanticType::UInt64 => get(self, column, Value::I64),
            SemanticType::Float32 => get(self, column, Value::F32),
            SemanticType::Float64 => get(self, column, Value::F64),
            SemanticType::Text | SemanticType::Char => get(self, column, Value::Text),
            SemanticType::Bytes => get(self, column, Value::Bytes),
            SemanticType::Enum(width) => self.storage_value(column, &width.semantic()),
            // TIMESTAMP by default; TIMESTAMPTZ when overridden.
            SemanticType::DateTime => get(self, column, Value::DateTime).or_else(|_| {
                get(self, column, |v: DateTime<Utc>| Value::DateTime(v.naive_utc()))
            }),
            SemanticType::Custom(_) => get(self, column, Value::Json)
                .or_else(|_| get(self, column, Value::Text)),
        }
    }
}

fn get<'a, T, F>(row: &'a Row, column: &str, wrap: F) -> SchemaResult<Value>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> Value,
{
    row.try_get::<_, Option<T>>(column)
        .map(|v| v.map_or(Value::Null, wrap))
        .map_err(|e| SchemaError::decode(column, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntWidth;

    fn schema() -> TableSchema {
        TableSchema::builder("members")
            .column("org", SemanticType::UInt32)
            .column("handle", SemanticType::Char)
            .column("plan", SemanticType::Enum(IntWidth::U8))
            .nullable_column("seen", SemanticType::UInt64)
            .build()
            .unwrap()
    }

    #[test]
    fn decode_reverses_storage_conversion() {
        let values = decode_row(
            &schema(),
            vec![
                Value::I32(-1),
                Value::Text("q".into()),
                Value::I16(2),
                Value::Null,
            ],
        )
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::U32(u32::MAX),
                Value::Char('q'),
                Value::enumeration(2_u8),
                Value::Null,
            ]
        );
    }

    #[test]
    fn decode_names_the_failing_column() {
        let err = decode_row(
            &schema(),
            vec![Value::I32(1), Value::Text("qq".into()), Value::I16(2), Value::Null],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Decode { ref column, .. } if column == "handle"));

        let err = decode_row(
            &schema(),
            vec![Value::Null, Value::Text("q".into()), Value::I16(2), Value::Null],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Decode { ref column, .. } if column == "org"));
    }

    #[test]
    fn decode_checks_row_width() {
        let err = decode_row(&schema(), vec![Value::I32(1)]).unwrap_err();
        assert!(err.is_decode());
    }
}
