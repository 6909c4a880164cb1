//! In-memory catalog backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use lake_core::{TableIdentity, TableSchema};
use uuid::Uuid;

use crate::backend::{check_batch_schema, CatalogBackend};
use crate::error::{CatalogError, Result};
use crate::metadata::{DataFile, Snapshot, TableMetadata};

/// Catalog keeping table metadata and data files in process memory.
///
/// Commits are serialized by a single lock.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<TableIdentity, MemoryTable>>,
}

struct MemoryTable {
    metadata: TableMetadata,
    files: HashMap<String, RecordBatch>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all tables, in no particular order.
    pub fn table_identities(&self) -> Vec<TableIdentity> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TableIdentity, MemoryTable>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TableIdentity, MemoryTable>> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn load_table(&self, identity: &TableIdentity) -> Result<TableMetadata> {
        self.read()
            .get(identity)
            .map(|t| t.metadata.clone())
            .ok_or_else(|| CatalogError::NoSuchTable(identity.clone()))
    }

    async fn create_table(
        &self,
        identity: &TableIdentity,
        schema: &TableSchema,
    ) -> Result<TableMetadata> {
        let mut tables = self.write();
        if tables.contains_key(identity) {
            return Err(CatalogError::TableAlreadyExists(identity.clone()));
        }
        let metadata = TableMetadata::new(identity.clone(), schema.clone());
        tables.insert(
            identity.clone(),
            MemoryTable {
                metadata: metadata.clone(),
                files: HashMap::new(),
            },
        );
        tracing::info!("Created in-memory table {identity}");
        Ok(metadata)
    }

    async fn append(&self, identity: &TableIdentity, batch: &RecordBatch) -> Result<Snapshot> {
        let mut tables = self.write();
        let table = tables
            .get_mut(identity)
            .ok_or_else(|| CatalogError::NoSuchTable(identity.clone()))?;
        check_batch_schema(identity, &table.metadata.schema, batch)?;

        let path = format!(
            "data/{:05}-{}.arrow",
            table.metadata.next_sequence_number(),
            Uuid::new_v4()
        );
        let file = DataFile {
            path: path.clone(),
            record_count: batch.num_rows() as u64,
            size_bytes: batch.get_array_memory_size() as u64,
        };
        let (metadata, snapshot) = table.metadata.with_appended_file(file);

        table.files.insert(path, batch.clone());
        table.metadata = metadata;
        Ok(snapshot)
    }

    async fn read_data_file(
        &self,
        identity: &TableIdentity,
        file: &DataFile,
    ) -> Result<Vec<RecordBatch>> {
        let tables = self.read();
        let table = tables
            .get(identity)
            .ok_or_else(|| CatalogError::NoSuchTable(identity.clone()))?;
        table
            .files
            .get(&file.path)
            .map(|batch| vec![batch.clone()])
            .ok_or_else(|| CatalogError::Corrupt(format!("missing data file {}", file.path)))
    }
}
