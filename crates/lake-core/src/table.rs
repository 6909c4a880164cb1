//! Table-store schema types.
//!
//! The table store knows a small set of storage types ([`ColumnType`]).
//! Every field carries a stable numeric id, assigned once at table creation.

use serde::{Deserialize, Serialize};

/// Bookkeeping column holding the logical time of each change.
pub const TIME_COLUMN: &str = "time";

/// Bookkeeping column holding the sign (+1/-1) of each change.
pub const DIFF_COLUMN: &str = "diff";

/// Native column type of the table store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Boolean,
    /// 64-bit signed integer
    Long,
    /// 64-bit IEEE 754 floating point
    Double,
    /// UTF-8 string
    String,
    /// Variable-length bytes
    Binary,
    /// Microseconds since epoch, no zone
    Timestamp,
    /// Microseconds since epoch, UTC
    Timestamptz,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Long => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Timestamp => "timestamp",
            Self::Timestamptz => "timestamptz",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub required: bool,
}

impl TableField {
    pub fn new(id: i32, name: impl Into<String>, column_type: ColumnType, required: bool) -> Self {
        Self {
            id,
            name: name.into(),
            column_type,
            required,
        }
    }
}

/// Schema of a table in the table store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub schema_id: i32,
    pub fields: Vec<TableField>,
}

impl TableSchema {
    pub fn new(fields: Vec<TableField>) -> Self {
        Self {
            schema_id: 0,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&TableField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Whether this schema carries the `time`/`diff` bookkeeping columns.
    pub fn has_bookkeeping_columns(&self) -> bool {
        [TIME_COLUMN, DIFF_COLUMN].iter().all(|name| {
            self.field(name)
                .is_some_and(|f| f.column_type == ColumnType::Long)
        })
    }
}
