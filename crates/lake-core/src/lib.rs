//! Core types for the lake-sync connector.
//!
//! This crate provides the foundational types shared by every other crate
//! in the workspace:
//!
//! - [`SemanticType`] - Engine-side column types
//! - [`Value`] - Engine-side typed values, including wrapped objects
//! - [`RowSchema`] - Ordered column definitions with primary-key markers
//! - [`ChangeRecord`] - One signed, timestamped row event
//! - [`TableIdentity`] - Namespace + table name
//! - [`TableSchema`] - Table-store schema with column types and field ids
//! - [`ConnectorError`] - Error taxonomy shared by sink and source
//!
//! # Architecture
//!
//! ```text
//! lake-core (this crate)
//!    │
//!    ├─── lake-types    (value codec: Value <-> NativeValue <-> Arrow)
//!    ├─── lake-catalog  (catalog gateway, backends, schema resolver)
//!    ├─── lake-sink     (commit batcher)
//!    └─── lake-source   (snapshot reader)
//! ```
//!
//! # Example
//!
//! ```rust
//! use lake_core::{ChangeRecord, RowSchema, SemanticType, Value};
//!
//! let schema = RowSchema::builder()
//!     .primary_key("user_id", SemanticType::Int)
//!     .column("name", SemanticType::String)
//!     .build()
//!     .unwrap();
//!
//! let record = ChangeRecord::insert(vec![Value::Int(1), Value::from("John")], 0);
//! schema.validate_values(&record.values).unwrap();
//! ```

pub mod change;
pub mod error;
pub mod identity;
pub mod object;
pub mod schema;
pub mod table;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use change::{ChangeRecord, Diff};
pub use error::{ConnectorError, Result};
pub use identity::TableIdentity;
pub use object::{JsonObjectSerializer, ObjectPayload, ObjectSerializer, ObjectValue};
pub use schema::{ColumnDefinition, RowSchema, RowSchemaBuilder};
pub use table::{ColumnType, TableField, TableSchema, DIFF_COLUMN, TIME_COLUMN};
pub use types::SemanticType;
pub use values::Value;
