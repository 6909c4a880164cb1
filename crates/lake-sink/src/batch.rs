//! Assembly of buffered change records into one columnar batch.

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use lake_catalog::{ColumnSource, ResolvedSchema};
use lake_core::{ChangeRecord, ConnectorError, Result};
use lake_types::{arrow_schema, build_array, NativeValue, ValueCodec};

/// Encode `records` following the resolved table layout.
pub fn encode_records(
    resolved: &ResolvedSchema,
    codec: &ValueCodec,
    records: &[ChangeRecord],
) -> Result<RecordBatch> {
    let table = resolved.table_schema();
    let columns = resolved.row_schema.columns();

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.fields.len());
    for (field, source) in table.fields.iter().zip(&resolved.layout) {
        let values = match *source {
            ColumnSource::Data(i) => {
                let semantic = columns[i].column_type;
                records
                    .iter()
                    .map(|r| codec.encode(&r.values[i], semantic))
                    .collect::<Result<Vec<_>>>()?
            }
            ColumnSource::Time => records.iter().map(|r| NativeValue::Long(r.time)).collect(),
            ColumnSource::Diff => records
                .iter()
                .map(|r| NativeValue::Long(r.diff.as_i64()))
                .collect(),
            ColumnSource::Absent => vec![NativeValue::Null; records.len()],
        };
        arrays.push(build_array(field.column_type, &values)?);
    }

    RecordBatch::try_new(arrow_schema(table), arrays)
        .map_err(|e| ConnectorError::InvalidRecord(format!("cannot assemble batch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray, Int64Array};
    use arrow::datatypes::Int64Type;
    use lake_catalog::resolver::check_compatibility;
    use lake_catalog::{build_table_schema, ResolveMode, TableHandle};
    use lake_core::{RowSchema, SemanticType, TableIdentity, Value};

    fn resolved() -> ResolvedSchema {
        let identity = TableIdentity::new(["db"], "users");
        let row_schema = RowSchema::builder()
            .primary_key("user_id", SemanticType::Int)
            .nullable_column("name", SemanticType::String)
            .build()
            .unwrap();
        let schema = build_table_schema(&row_schema);
        let (layout, projection) =
            check_compatibility(&identity, &row_schema, &schema, ResolveMode::Write).unwrap();
        ResolvedSchema {
            handle: TableHandle {
                identity,
                schema,
                table_uuid: Default::default(),
            },
            row_schema,
            layout,
            projection,
        }
    }

    #[test]
    fn test_encode_with_bookkeeping() {
        let records = vec![
            ChangeRecord::insert(vec![Value::Int(1), Value::from("John")], 10),
            ChangeRecord::retract(vec![Value::Int(2), Value::Null], 10),
        ];
        let batch = encode_records(&resolved(), &ValueCodec::new(), &records).unwrap();

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);
        let diff = batch.column(3).as_primitive::<Int64Type>();
        assert_eq!(diff, &Int64Array::from(vec![1, -1]));
        let time = batch.column(2).as_primitive::<Int64Type>();
        assert_eq!(time, &Int64Array::from(vec![10, 10]));
        assert!(batch.column(1).is_null(1));
    }

    #[test]
    fn test_encode_propagates_value_errors() {
        let records = vec![ChangeRecord::insert(vec![Value::from("x"), Value::Null], 0)];
        let err = encode_records(&resolved(), &ValueCodec::new(), &records).unwrap_err();
        assert!(matches!(err, ConnectorError::TypeMismatch { .. }));
    }
}
