//! Backend-level catalog errors.

use lake_core::{ConnectorError, TableIdentity};
use thiserror::Error;

/// Errors reported by a [`CatalogBackend`](crate::CatalogBackend).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Commit conflict on {table}: {message}")]
    CommitConflict { table: String, message: String },

    #[error("Schema rejected for {table}: {message}")]
    SchemaRejected { table: String, message: String },

    #[error("No such table: {0}")]
    NoSuchTable(TableIdentity),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(TableIdentity),

    #[error("No such snapshot {snapshot_id} in {table}")]
    NoSuchSnapshot { table: TableIdentity, snapshot_id: i64 },

    #[error("Corrupt catalog state: {0}")]
    Corrupt(String),
}

impl CatalogError {
    /// Transient failures that may succeed when the operation is repeated.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::CommitConflict { .. })
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(format!("I/O error: {err}"))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupt(format!("invalid table metadata: {err}"))
    }
}

impl From<parquet::errors::ParquetError> for CatalogError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Self::Corrupt(format!("parquet error: {err}"))
    }
}

impl From<arrow::error::ArrowError> for CatalogError {
    fn from(err: arrow::error::ArrowError) -> Self {
        Self::Corrupt(format!("arrow error: {err}"))
    }
}

impl From<CatalogError> for ConnectorError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unavailable(message) => Self::CatalogUnavailable {
                attempts: 1,
                message,
            },
            CatalogError::CommitConflict { table, message } => Self::CatalogUnavailable {
                attempts: 1,
                message: format!("commit conflict on {table}: {message}"),
            },
            CatalogError::SchemaRejected { table, message } => Self::SchemaMismatch { table, message },
            CatalogError::NoSuchTable(identity) => Self::TableNotFound(identity),
            CatalogError::NoSuchSnapshot { table, snapshot_id } => {
                Self::snapshot_read(table, format!("snapshot {snapshot_id} does not exist"))
            }
            other => Self::Catalog(other.to_string()),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        assert!(CatalogError::Unavailable("down".into()).is_retriable());
        assert!(CatalogError::CommitConflict {
            table: "db.t".into(),
            message: "lost race".into()
        }
        .is_retriable());
        assert!(!CatalogError::Corrupt("bad".into()).is_retriable());
        assert!(!CatalogError::NoSuchTable(TableIdentity::new(["db"], "t")).is_retriable());
    }

    #[test]
    fn test_connector_error_mapping() {
        let identity = TableIdentity::new(["db"], "t");
        assert_eq!(
            ConnectorError::from(CatalogError::NoSuchTable(identity.clone())),
            ConnectorError::TableNotFound(identity)
        );
        assert!(matches!(
            ConnectorError::from(CatalogError::SchemaRejected {
                table: "db.t".into(),
                message: "x".into()
            }),
            ConnectorError::SchemaMismatch { .. }
        ));
        assert!(matches!(
            ConnectorError::from(CatalogError::Corrupt("x".into())),
            ConnectorError::Catalog(_)
        ));
    }
}
