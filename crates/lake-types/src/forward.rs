//! Forward conversion: Value → NativeValue.
//!
//! Timestamps and durations are stored with microsecond precision. Values
//! that carry finer precision are rejected rather than truncated so that
//! every stored value decodes back to exactly what was written.

use chrono::{DateTime, Utc};
use lake_core::{ColumnType, ConnectorError, Result, SemanticType, Value};

use crate::native::NativeValue;

/// Column type used to store a semantic type.
pub fn column_type_for(ty: SemanticType) -> ColumnType {
    match ty {
        SemanticType::Bool => ColumnType::Boolean,
        SemanticType::Int => ColumnType::Long,
        SemanticType::Float => ColumnType::Double,
        SemanticType::String => ColumnType::String,
        SemanticType::Bytes => ColumnType::Binary,
        SemanticType::DateTimeNaive => ColumnType::Timestamp,
        SemanticType::DateTimeUtc => ColumnType::Timestamptz,
        // Microsecond count
        SemanticType::Duration => ColumnType::Long,
        // UTF-8 JSON document
        SemanticType::Json => ColumnType::String,
        // Serializer output
        SemanticType::Object => ColumnType::Binary,
    }
}

/// Encode a value declared as `ty`.
pub fn encode_value(value: &Value, ty: SemanticType) -> Result<NativeValue> {
    match (ty, value) {
        (_, Value::Null) => Ok(NativeValue::Null),

        (SemanticType::Bool, Value::Bool(b)) => Ok(NativeValue::Boolean(*b)),
        (SemanticType::Int, Value::Int(i)) => Ok(NativeValue::Long(*i)),
        (SemanticType::Float, Value::Float(f)) => Ok(NativeValue::Double(*f)),
        (SemanticType::String, Value::String(s)) => Ok(NativeValue::String(s.clone())),
        (SemanticType::Bytes, Value::Bytes(b)) => Ok(NativeValue::Binary(b.clone())),

        (SemanticType::DateTimeNaive, Value::DateTimeNaive(dt)) => Ok(NativeValue::Timestamp(
            timestamp_micros(&dt.and_utc(), ColumnType::Timestamp)?,
        )),
        (SemanticType::DateTimeUtc, Value::DateTimeUtc(dt)) => Ok(NativeValue::TimestampTz(
            timestamp_micros(dt, ColumnType::Timestamptz)?,
        )),

        (SemanticType::Duration, Value::Duration(d)) => Ok(NativeValue::Long(duration_micros(d)?)),

        (SemanticType::Json, Value::Json(json)) => Ok(NativeValue::String(json.to_string())),

        (SemanticType::Object, Value::Object(obj)) => Ok(NativeValue::Binary(obj.to_bytes()?)),

        (ty, value) => Err(ConnectorError::type_mismatch(ty, value.type_name())),
    }
}

fn timestamp_micros(dt: &DateTime<Utc>, column_type: ColumnType) -> Result<i64> {
    if dt.timestamp_subsec_nanos() % 1_000 != 0 {
        return Err(ConnectorError::value_overflow(
            column_type,
            format!("{dt} has sub-microsecond precision"),
        ));
    }
    Ok(dt.timestamp_micros())
}

fn duration_micros(d: &chrono::Duration) -> Result<i64> {
    let micros = d.num_microseconds().ok_or_else(|| {
        ConnectorError::value_overflow(
            ColumnType::Long,
            format!("duration {d} exceeds the microsecond range"),
        )
    })?;
    if chrono::Duration::microseconds(micros) != *d {
        return Err(ConnectorError::value_overflow(
            ColumnType::Long,
            format!("duration {d} has sub-microsecond precision"),
        ));
    }
    Ok(micros)
}
