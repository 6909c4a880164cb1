//! Reverse conversion: NativeValue → Value.

use std::sync::Arc;

use chrono::DateTime;
use lake_core::{ColumnType, ConnectorError, ObjectSerializer, ObjectValue, Result, SemanticType, Value};

use crate::native::NativeValue;

/// Decode a stored value back into the declared semantic type.
///
/// `Object` columns need a serializer; without one they cannot be decoded.
pub fn decode_value(
    native: &NativeValue,
    ty: SemanticType,
    object_serializer: Option<&Arc<dyn ObjectSerializer>>,
) -> Result<Value> {
    match (ty, native) {
        (_, NativeValue::Null) => Ok(Value::Null),

        (SemanticType::Bool, NativeValue::Boolean(b)) => Ok(Value::Bool(*b)),
        (SemanticType::Int, NativeValue::Long(i)) => Ok(Value::Int(*i)),
        (SemanticType::Float, NativeValue::Double(f)) => Ok(Value::Float(*f)),
        (SemanticType::String, NativeValue::String(s)) => Ok(Value::String(s.clone())),
        (SemanticType::Bytes, NativeValue::Binary(b)) => Ok(Value::Bytes(b.clone())),

        (SemanticType::DateTimeNaive, NativeValue::Timestamp(micros)) => {
            let dt = DateTime::from_timestamp_micros(*micros).ok_or_else(|| {
                ConnectorError::value_overflow(
                    ColumnType::Timestamp,
                    format!("{micros}µs is outside the supported datetime range"),
                )
            })?;
            Ok(Value::DateTimeNaive(dt.naive_utc()))
        }
        (SemanticType::DateTimeUtc, NativeValue::TimestampTz(micros)) => {
            let dt = DateTime::from_timestamp_micros(*micros).ok_or_else(|| {
                ConnectorError::value_overflow(
                    ColumnType::Timestamptz,
                    format!("{micros}µs is outside the supported datetime range"),
                )
            })?;
            Ok(Value::DateTimeUtc(dt))
        }

        (SemanticType::Duration, NativeValue::Long(micros)) => {
            Ok(Value::Duration(chrono::Duration::microseconds(*micros)))
        }

        (SemanticType::Json, NativeValue::String(text)) => serde_json::from_str(text)
            .map(Value::Json)
            .map_err(|e| ConnectorError::type_mismatch("json document", e)),

        (SemanticType::Object, NativeValue::Binary(bytes)) => {
            let serializer = object_serializer.ok_or_else(|| {
                ConnectorError::UnsupportedType(
                    "object column cannot be decoded without a registered serializer".to_string(),
                )
            })?;
            Ok(Value::Object(ObjectValue::from_bytes(bytes, serializer.clone())?))
        }

        (ty, native) => Err(ConnectorError::type_mismatch(ty, native.type_name())),
    }
}
