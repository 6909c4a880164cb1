//! Scalar values in the table store's own type system.

use lake_core::ColumnType;

/// A single table-store value.
///
/// Timestamps are microseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(i64),
    TimestampTz(i64),
}

impl NativeValue {
    /// The column type this value belongs to, `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(ColumnType::Boolean),
            Self::Long(_) => Some(ColumnType::Long),
            Self::Double(_) => Some(ColumnType::Double),
            Self::String(_) => Some(ColumnType::String),
            Self::Binary(_) => Some(ColumnType::Binary),
            Self::Timestamp(_) => Some(ColumnType::Timestamp),
            Self::TimestampTz(_) => Some(ColumnType::Timestamptz),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.column_type().map_or("null", |t| t.as_str())
    }
}
