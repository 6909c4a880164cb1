//! Catalog access for lake-sync.
//!
//! This crate provides:
//! - The [`CatalogBackend`] trait and two implementations
//!   ([`MemoryCatalog`], [`FilesystemCatalog`])
//! - [`CatalogGateway`], which retries transient backend failures and maps
//!   backend errors onto [`ConnectorError`](lake_core::ConnectorError)
//! - Schema resolution between row schemas and table schemas ([`resolver`])

pub mod backend;
pub mod error;
pub mod filesystem;
pub mod gateway;
pub mod memory;
pub mod metadata;
pub mod resolver;
pub mod retry;

pub use backend::CatalogBackend;
pub use error::CatalogError;
pub use filesystem::FilesystemCatalog;
pub use gateway::{CatalogGateway, CommitResult, TableHandle};
pub use memory::MemoryCatalog;
pub use metadata::{DataFile, ScanPlan, Snapshot, TableMetadata};
pub use resolver::{build_table_schema, resolve, ColumnSource, ResolveMode, ResolvedSchema};
pub use retry::RetryPolicy;
