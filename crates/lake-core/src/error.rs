//! Error taxonomy shared by the sink and the source.

use thiserror::Error;

use crate::identity::TableIdentity;

/// Errors raised by the connector.
///
/// Variants split into configuration defects, which terminate the connector
/// (see [`ConnectorError::is_fatal`]), and catalog conditions, which the
/// gateway may already have retried before surfacing them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Value does not fit column type '{column_type}': {message}")]
    ValueOverflow { column_type: String, message: String },

    #[error("Schema mismatch for table '{table}': {message}")]
    SchemaMismatch { table: String, message: String },

    #[error("Table not found: {0}")]
    TableNotFound(TableIdentity),

    #[error("Catalog unavailable after {attempts} attempts: {message}")]
    CatalogUnavailable { attempts: u32, message: String },

    #[error("Failed to read snapshot of table '{table}': {message}")]
    SnapshotRead { table: String, message: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid change record: {0}")]
    InvalidRecord(String),

    #[error("Object serialization error: {0}")]
    ObjectSerialization(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl ConnectorError {
    pub fn schema_mismatch(table: impl ToString, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub fn value_overflow(column_type: impl ToString, message: impl Into<String>) -> Self {
        Self::ValueOverflow {
            column_type: column_type.to_string(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn snapshot_read(table: impl ToString, message: impl Into<String>) -> Self {
        Self::SnapshotRead {
            table: table.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error indicates a configuration defect rather than a
    /// transient condition. Fatal errors are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_)
                | Self::ValueOverflow { .. }
                | Self::SchemaMismatch { .. }
                | Self::TableNotFound(_)
                | Self::TypeMismatch { .. }
                | Self::InvalidRecord(_)
                | Self::ObjectSerialization(_)
        )
    }
}

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;
