//! Catalog backend trait.
//!
//! This module defines the [`CatalogBackend`] trait that every table store
//! implements, so the gateway's retry and error handling work the same with:
//! - In-memory storage (`MemoryCatalog`)
//! - A warehouse directory of parquet files (`FilesystemCatalog`)

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use lake_core::{TableIdentity, TableSchema};
use lake_types::arrow_schema;

use crate::error::{CatalogError, Result};
use crate::metadata::{DataFile, Snapshot, TableMetadata};

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Load the current metadata of a table.
    ///
    /// Returns `NoSuchTable` if the table doesn't exist.
    async fn load_table(&self, identity: &TableIdentity) -> Result<TableMetadata>;

    /// Create an empty table.
    ///
    /// Returns `TableAlreadyExists` if another writer created it first.
    async fn create_table(
        &self,
        identity: &TableIdentity,
        schema: &TableSchema,
    ) -> Result<TableMetadata>;

    /// Store `batch` as one new data file and publish a snapshot containing
    /// it together with every file of the previous snapshot. Either the
    /// snapshot is published or the table is left unchanged.
    async fn append(&self, identity: &TableIdentity, batch: &RecordBatch) -> Result<Snapshot>;

    /// Read the batches of one data file.
    async fn read_data_file(
        &self,
        identity: &TableIdentity,
        file: &DataFile,
    ) -> Result<Vec<RecordBatch>>;
}

/// Reject a batch whose columns don't line up with the table schema.
pub fn check_batch_schema(
    identity: &TableIdentity,
    schema: &TableSchema,
    batch: &RecordBatch,
) -> Result<()> {
    let expected = arrow_schema(schema);
    let actual = batch.schema();

    let rejected = |message: String| CatalogError::SchemaRejected {
        table: identity.to_string(),
        message,
    };

    if expected.fields().len() != actual.fields().len() {
        return Err(rejected(format!(
            "expected {} columns, batch has {}",
            expected.fields().len(),
            actual.fields().len()
        )));
    }
    for (want, got) in expected.fields().iter().zip(actual.fields().iter()) {
        if want.name() != got.name() || want.data_type() != got.data_type() {
            return Err(rejected(format!(
                "column '{}' ({}) does not match table column '{}' ({})",
                got.name(),
                got.data_type(),
                want.name(),
                want.data_type()
            )));
        }
        if !want.is_nullable() {
            let column = batch.column_by_name(want.name());
            if column.is_some_and(|c| c.null_count() > 0) {
                return Err(rejected(format!(
                    "required column '{}' contains nulls",
                    want.name()
                )));
            }
        }
    }
    Ok(())
}
