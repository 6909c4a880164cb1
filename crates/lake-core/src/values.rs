//! Engine-side values.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::object::ObjectValue;
use crate::types::SemanticType;

/// A single engine value.
///
/// Zone-aware timestamps are always held in UTC; use [`Value::zoned`] to
/// normalize a timestamp from any zone.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value in a nullable column
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTimeNaive(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Duration(chrono::Duration),
    Json(serde_json::Value),
    Object(ObjectValue),
}

impl Value {
    /// Normalize a zone-aware timestamp to UTC.
    pub fn zoned<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self::DateTimeUtc(dt.with_timezone(&Utc))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The semantic type this value carries, `None` for `Null`.
    pub fn semantic_type(&self) -> Option<SemanticType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(SemanticType::Bool),
            Self::Int(_) => Some(SemanticType::Int),
            Self::Float(_) => Some(SemanticType::Float),
            Self::String(_) => Some(SemanticType::String),
            Self::Bytes(_) => Some(SemanticType::Bytes),
            Self::DateTimeNaive(_) => Some(SemanticType::DateTimeNaive),
            Self::DateTimeUtc(_) => Some(SemanticType::DateTimeUtc),
            Self::Duration(_) => Some(SemanticType::Duration),
            Self::Json(_) => Some(SemanticType::Json),
            Self::Object(_) => Some(SemanticType::Object),
        }
    }

    /// Name used in type mismatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.semantic_type().map_or("null", |t| t.as_str())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::DateTimeNaive(a), Self::DateTimeNaive(b)) => a == b,
            (Self::DateTimeUtc(a), Self::DateTimeUtc(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTimeNaive(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTimeUtc(v)
    }
}

impl From<chrono::Duration> for Value {
    fn from(v: chrono::Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<ObjectValue> for Value {
    fn from(v: ObjectValue) -> Self {
        Self::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_zoned_normalizes_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2025, 1, 17, 2, 0, 0).unwrap();
        let value = Value::zoned(local);

        let expected = Utc.with_ymd_and_hms(2025, 1, 17, 0, 0, 0).unwrap();
        assert_eq!(value, Value::DateTimeUtc(expected));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_i64(), Some(42));
        assert_eq!(Value::Float(-5.6).as_f64(), Some(-5.6));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(vec![0u8, 1]).as_bytes(), Some(&[0u8, 1][..]));
        assert_eq!(Value::Int(1).as_bool(), None);
    }

    #[test]
    fn test_semantic_type() {
        assert_eq!(Value::Null.semantic_type(), None);
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(
            Value::Duration(chrono::Duration::days(5)).semantic_type(),
            Some(SemanticType::Duration)
        );
    }

    #[test]
    fn test_equality_is_variant_strict() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(
            Value::Json(serde_json::json!({"a": 15, "b": "hello"})),
            Value::Json(serde_json::json!({"b": "hello", "a": 15}))
        );
    }
}
