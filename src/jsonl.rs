//! JSON Lines conversion for the command line.
//!
//! Each line is one JSON object keyed by column name. On input, the optional
//! `time` and `diff` members carry the record's bookkeeping; on output they
//! appear only when the row schema declares them.
//!
//! | Column type        | JSON form                                  |
//! |--------------------|--------------------------------------------|
//! | `bytes`            | base64 string                              |
//! | `date_time_naive`  | `2025-01-17T10:20:30.123456`               |
//! | `date_time_utc`    | RFC 3339 with offset, written back as UTC  |
//! | `duration`         | integer microseconds                       |
//! | `json`             | any JSON value, verbatim                   |
//! | `object`           | not supported                              |

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use lake_core::{ChangeRecord, RowSchema, SemanticType, Value, DIFF_COLUMN, TIME_COLUMN};
use lake_source::Row;
use serde_json::{Map, Value as JsonValue};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse one input line into a change record.
///
/// `default_time` is used when the line has no `time` member.
pub fn parse_record(schema: &RowSchema, line: &str, default_time: i64) -> Result<ChangeRecord> {
    let JsonValue::Object(mut object) = serde_json::from_str(line).context("Invalid JSON")? else {
        bail!("Expected a JSON object");
    };

    let time = match object.remove(TIME_COLUMN) {
        Some(t) => t
            .as_i64()
            .ok_or_else(|| anyhow!("'{TIME_COLUMN}' must be an integer, got {t}"))?,
        None => default_time,
    };
    let diff = match object.remove(DIFF_COLUMN) {
        Some(d) => d
            .as_i64()
            .ok_or_else(|| anyhow!("'{DIFF_COLUMN}' must be an integer, got {d}"))?,
        None => 1,
    };

    let mut values = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        let value = match object.remove(&column.name) {
            Some(json) => json_to_value(&json, column.column_type)
                .with_context(|| format!("Column '{}'", column.name))?,
            None => Value::Null,
        };
        values.push(value);
    }
    if let Some(unknown) = object.keys().next() {
        bail!("Unknown column '{unknown}'");
    }

    Ok(ChangeRecord::new(values, time, diff)?)
}

/// Convert a JSON value into a value of `ty`.
pub fn json_to_value(json: &JsonValue, ty: SemanticType) -> Result<Value> {
    if ty != SemanticType::Json && json.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || anyhow!("Expected {ty}, got {json}");
    let value = match ty {
        SemanticType::Bool => Value::Bool(json.as_bool().ok_or_else(mismatch)?),
        SemanticType::Int => Value::Int(json.as_i64().ok_or_else(mismatch)?),
        SemanticType::Float => Value::Float(json.as_f64().ok_or_else(mismatch)?),
        SemanticType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        SemanticType::Bytes => {
            let encoded = json.as_str().ok_or_else(mismatch)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .context("Invalid base64")?;
            Value::Bytes(bytes)
        }
        SemanticType::DateTimeNaive => {
            let s = json.as_str().ok_or_else(mismatch)?;
            let parsed = NAIVE_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .ok_or_else(|| anyhow!("Invalid timestamp '{s}'"))?;
            Value::DateTimeNaive(parsed)
        }
        SemanticType::DateTimeUtc => {
            let s = json.as_str().ok_or_else(mismatch)?;
            let parsed = DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("Invalid RFC 3339 timestamp '{s}'"))?;
            Value::zoned(parsed)
        }
        SemanticType::Duration => {
            Value::Duration(chrono::Duration::microseconds(json.as_i64().ok_or_else(mismatch)?))
        }
        SemanticType::Json => Value::Json(json.clone()),
        SemanticType::Object => bail!("Object columns cannot be read from JSON"),
    };
    Ok(value)
}

/// Convert a value back into its JSON form.
pub fn value_to_json(value: &Value) -> Result<JsonValue> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| anyhow!("Float {f} has no JSON form"))?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(b) => JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::DateTimeNaive(dt) => {
            JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
        }
        Value::DateTimeUtc(dt) => {
            JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        Value::Duration(d) => JsonValue::from(
            d.num_microseconds()
                .ok_or_else(|| anyhow!("Duration {d} overflows microseconds"))?,
        ),
        Value::Json(j) => j.clone(),
        Value::Object(_) => bail!("Object values cannot be written as JSON"),
    };
    Ok(json)
}

/// Render a row as one JSON object line.
pub fn format_row(row: &Row) -> Result<String> {
    let mut object = Map::new();
    for (column, value) in row.schema().columns().iter().zip(row.values()) {
        let json = value_to_json(value).with_context(|| format!("Column '{}'", column.name))?;
        object.insert(column.name.clone(), json);
    }
    Ok(serde_json::to_string(&JsonValue::Object(object))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn schema() -> RowSchema {
        RowSchema::builder()
            .primary_key("user_id", SemanticType::Int)
            .column("name", SemanticType::String)
            .nullable_column("avatar", SemanticType::Bytes)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_record() {
        let record =
            parse_record(&schema(), r#"{"user_id": 1, "name": "John", "avatar": "AAEC"}"#, 7)
                .unwrap();
        assert_eq!(record.time, 7);
        assert_eq!(record.diff.as_i64(), 1);
        assert_eq!(
            record.values,
            vec![Value::Int(1), Value::from("John"), Value::Bytes(vec![0, 1, 2])]
        );
    }

    #[test]
    fn test_parse_record_bookkeeping() {
        let record = parse_record(
            &schema(),
            r#"{"user_id": 1, "name": "John", "time": 3, "diff": -1}"#,
            7,
        )
        .unwrap();
        assert_eq!(record.time, 3);
        assert_eq!(record.diff.as_i64(), -1);
        assert_eq!(record.values[2], Value::Null);
    }

    #[test]
    fn test_parse_record_errors() {
        assert!(parse_record(&schema(), "[1, 2]", 0).is_err());
        assert!(parse_record(&schema(), r#"{"user_id": "one", "name": "x"}"#, 0).is_err());
        assert!(parse_record(&schema(), r#"{"user_id": 1, "name": "x", "age": 3}"#, 0).is_err());
        assert!(parse_record(&schema(), r#"{"user_id": 1, "name": "x", "diff": 0}"#, 0).is_err());
    }

    #[test]
    fn test_timestamps() {
        let naive = json_to_value(
            &JsonValue::from("2025-01-17 10:20:30.5"),
            SemanticType::DateTimeNaive,
        )
        .unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 1, 17)
            .unwrap()
            .and_hms_milli_opt(10, 20, 30, 500)
            .unwrap();
        assert_eq!(naive, Value::DateTimeNaive(expected));
        assert_eq!(
            value_to_json(&naive).unwrap(),
            JsonValue::from("2025-01-17T10:20:30.500000")
        );

        let zoned = json_to_value(
            &JsonValue::from("2025-01-17T12:00:00+02:00"),
            SemanticType::DateTimeUtc,
        )
        .unwrap();
        assert_eq!(
            zoned,
            Value::DateTimeUtc(Utc.with_ymd_and_hms(2025, 1, 17, 10, 0, 0).unwrap())
        );
        assert_eq!(
            value_to_json(&zoned).unwrap(),
            JsonValue::from("2025-01-17T10:00:00.000000Z")
        );
    }

    #[test]
    fn test_json_column_keeps_null() {
        assert_eq!(
            json_to_value(&JsonValue::Null, SemanticType::Json).unwrap(),
            Value::Json(JsonValue::Null)
        );
        assert_eq!(
            json_to_value(&JsonValue::Null, SemanticType::String).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_duration_and_object() {
        let d = json_to_value(&JsonValue::from(1_500_000), SemanticType::Duration).unwrap();
        assert_eq!(d, Value::Duration(chrono::Duration::milliseconds(1500)));
        assert_eq!(value_to_json(&d).unwrap(), JsonValue::from(1_500_000));

        assert!(json_to_value(&JsonValue::from("x"), SemanticType::Object).is_err());
    }
}
