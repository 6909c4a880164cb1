//! Change sink for lake-sync.
//!
//! Buffers [`ChangeRecord`](lake_core::ChangeRecord)s and commits them to a
//! table as atomic snapshots, each row carrying its `time` and `diff`.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lake_catalog::{CatalogGateway, MemoryCatalog};
//! use lake_core::{ChangeRecord, RowSchema, SemanticType, TableIdentity, Value};
//! use lake_sink::{LakeSink, SinkConfig};
//!
//! # async fn example() -> lake_core::Result<()> {
//! let schema = RowSchema::builder()
//!     .primary_key("user_id", SemanticType::Int)
//!     .column("name", SemanticType::String)
//!     .build()?;
//! let gateway = CatalogGateway::new(Arc::new(MemoryCatalog::new()));
//! let sink = LakeSink::start(SinkConfig::new(TableIdentity::new(["db"], "users"), schema), gateway);
//! sink.submit(ChangeRecord::insert(vec![Value::Int(1), Value::from("John")], 1))?;
//! sink.finish().await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod batcher;
pub mod config;
pub mod sink;

pub use batcher::{CommitBatcher, SinkStats};
pub use config::{SinkConfig, DEFAULT_MIN_COMMIT_FREQUENCY};
pub use sink::LakeSink;
