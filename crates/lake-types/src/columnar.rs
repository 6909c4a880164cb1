//! Arrow representation of table-store columns.
//!
//! Data files hold one Arrow array per table field. Each Arrow field carries
//! the table field id under [`FIELD_ID_KEY`] so columns can be matched by id
//! after a round trip through parquet.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BinaryBuilder, BooleanBuilder, Float64Builder, Int64Builder,
    StringBuilder, TimestampMicrosecondBuilder,
};
use arrow::datatypes::{
    DataType, Field, Float64Type, Int64Type, Schema, SchemaRef, TimeUnit,
    TimestampMicrosecondType,
};
use lake_core::{ColumnType, ConnectorError, Result, TableField, TableSchema};

use crate::native::NativeValue;

/// Arrow field metadata key holding the table field id.
pub const FIELD_ID_KEY: &str = "PARQUET:field_id";

const UTC: &str = "UTC";

pub fn arrow_data_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Long => DataType::Int64,
        ColumnType::Double => DataType::Float64,
        ColumnType::String => DataType::Utf8,
        ColumnType::Binary => DataType::Binary,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnType::Timestamptz => DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into())),
    }
}

pub fn arrow_field(field: &TableField) -> Field {
    Field::new(&field.name, arrow_data_type(field.column_type), !field.required).with_metadata(
        HashMap::from([(FIELD_ID_KEY.to_string(), field.id.to_string())]),
    )
}

pub fn arrow_schema(schema: &TableSchema) -> SchemaRef {
    Arc::new(Schema::new(
        schema.fields.iter().map(arrow_field).collect::<Vec<_>>(),
    ))
}

/// Table field id stored on an Arrow field, if any.
pub fn field_id(field: &Field) -> Option<i32> {
    field.metadata().get(FIELD_ID_KEY)?.parse().ok()
}

/// Build one column from values that all belong to `column_type`.
pub fn build_array(column_type: ColumnType, values: &[NativeValue]) -> Result<ArrayRef> {
    let mismatch = |v: &NativeValue| ConnectorError::type_mismatch(column_type, v.type_name());

    let array: ArrayRef = match column_type {
        ColumnType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(values.len());
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::Boolean(b) => builder.append_value(*b),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Long => {
            let mut builder = Int64Builder::with_capacity(values.len());
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::Long(i) => builder.append_value(*i),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Double => {
            let mut builder = Float64Builder::with_capacity(values.len());
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::Double(f) => builder.append_value(*f),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::String => {
            let mut builder = StringBuilder::new();
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::String(s) => builder.append_value(s),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Binary => {
            let mut builder = BinaryBuilder::new();
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::Binary(b) => builder.append_value(b),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(values.len());
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::Timestamp(us) => builder.append_value(*us),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Timestamptz => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(values.len());
            for v in values {
                match v {
                    NativeValue::Null => builder.append_null(),
                    NativeValue::TimestampTz(us) => builder.append_value(*us),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish().with_timezone(UTC))
        }
    };
    Ok(array)
}

/// Read the value at `row` of a column stored as `column_type`.
pub fn native_value_at(array: &dyn Array, column_type: ColumnType, row: usize) -> Result<NativeValue> {
    if array.data_type() != &arrow_data_type(column_type) {
        return Err(ConnectorError::type_mismatch(column_type, array.data_type()));
    }
    if array.is_null(row) {
        return Ok(NativeValue::Null);
    }

    let value = match column_type {
        ColumnType::Boolean => array
            .as_boolean_opt()
            .map(|a| NativeValue::Boolean(a.value(row))),
        ColumnType::Long => array
            .as_primitive_opt::<Int64Type>()
            .map(|a| NativeValue::Long(a.value(row))),
        ColumnType::Double => array
            .as_primitive_opt::<Float64Type>()
            .map(|a| NativeValue::Double(a.value(row))),
        ColumnType::String => array
            .as_string_opt::<i32>()
            .map(|a| NativeValue::String(a.value(row).to_string())),
        ColumnType::Binary => array
            .as_binary_opt::<i32>()
            .map(|a| NativeValue::Binary(a.value(row).to_vec())),
        ColumnType::Timestamp => array
            .as_primitive_opt::<TimestampMicrosecondType>()
            .map(|a| NativeValue::Timestamp(a.value(row))),
        ColumnType::Timestamptz => array
            .as_primitive_opt::<TimestampMicrosecondType>()
            .map(|a| NativeValue::TimestampTz(a.value(row))),
    };
    value.ok_or_else(|| ConnectorError::type_mismatch(column_type, array.data_type()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_carries_field_ids() {
        let schema = TableSchema::new(vec![
            TableField::new(1, "id", ColumnType::Long, true),
            TableField::new(2, "ts", ColumnType::Timestamptz, false),
        ]);
        let arrow = arrow_schema(&schema);
        assert_eq!(arrow.fields().len(), 2);
        assert_eq!(field_id(arrow.field(0)), Some(1));
        assert!(!arrow.field(0).is_nullable());
        assert!(arrow.field(1).is_nullable());
        assert_eq!(
            arrow.field(1).data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        );
    }

    #[test]
    fn test_build_and_read_columns() {
        let cases = vec![
            (ColumnType::Boolean, vec![NativeValue::Boolean(true), NativeValue::Null]),
            (ColumnType::Long, vec![NativeValue::Long(7), NativeValue::Null]),
            (ColumnType::Double, vec![NativeValue::Double(1.5), NativeValue::Null]),
            (ColumnType::String, vec![NativeValue::String("x".into()), NativeValue::Null]),
            (ColumnType::Binary, vec![NativeValue::Binary(vec![0, 1, 0]), NativeValue::Null]),
            (ColumnType::Timestamp, vec![NativeValue::Timestamp(-1), NativeValue::Null]),
            (ColumnType::Timestamptz, vec![NativeValue::TimestampTz(1), NativeValue::Null]),
        ];

        for (column_type, values) in cases {
            let array = build_array(column_type, &values).unwrap();
            assert_eq!(array.data_type(), &arrow_data_type(column_type));
            assert_eq!(array.len(), 2);
            for (row, expected) in values.iter().enumerate() {
                assert_eq!(
                    &native_value_at(array.as_ref(), column_type, row).unwrap(),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_build_rejects_foreign_values() {
        let err = build_array(ColumnType::Long, &[NativeValue::String("1".into())]).unwrap_err();
        assert!(matches!(err, ConnectorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_read_rejects_wrong_array_type() {
        let array = build_array(ColumnType::Timestamp, &[NativeValue::Timestamp(0)]).unwrap();
        let err = native_value_at(array.as_ref(), ColumnType::Timestamptz, 0).unwrap_err();
        assert!(matches!(err, ConnectorError::TypeMismatch { .. }));
    }
}
