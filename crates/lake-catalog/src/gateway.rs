//! Catalog gateway: retrying, error-classifying access to a backend.

use std::future::Future;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use lake_core::{ConnectorError, Result, TableIdentity, TableSchema};
use tokio::time::sleep;
use uuid::Uuid;

use crate::backend::CatalogBackend;
use crate::error::CatalogError;
use crate::metadata::{DataFile, ScanPlan, Snapshot, TableMetadata};
use crate::retry::RetryPolicy;

/// A resolved table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    pub identity: TableIdentity,
    pub schema: TableSchema,
    pub table_uuid: Uuid,
}

impl From<&TableMetadata> for TableHandle {
    fn from(metadata: &TableMetadata) -> Self {
        Self {
            identity: metadata.identity.clone(),
            schema: metadata.schema.clone(),
            table_uuid: metadata.table_uuid,
        }
    }
}

/// Outcome of one successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub snapshot_id: i64,
    pub sequence_number: i64,
    pub added_records: u64,
}

#[derive(Clone)]
pub struct CatalogGateway {
    backend: Arc<dyn CatalogBackend>,
    retry: RetryPolicy,
}

impl CatalogGateway {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn load(&self, identity: &TableIdentity) -> Result<TableMetadata> {
        let backend = &self.backend;
        self.with_retry("load_table", identity, || async move {
            backend.load_table(identity).await
        })
        .await
    }

    /// Load a table, creating it with `schema` if it doesn't exist.
    ///
    /// The existing table's schema is returned unchanged; checking it
    /// against what the caller needs is the resolver's job.
    pub async fn resolve_or_create(
        &self,
        identity: &TableIdentity,
        schema: &TableSchema,
    ) -> Result<TableHandle> {
        match self.load(identity).await {
            Ok(metadata) => return Ok(TableHandle::from(&metadata)),
            Err(ConnectorError::TableNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let backend = &self.backend;
        let metadata = self
            .with_retry("create_table", identity, || async move {
                match backend.create_table(identity, schema).await {
                    Err(CatalogError::TableAlreadyExists(_)) => {
                        tracing::debug!("Table {identity} was created concurrently, loading it");
                        backend.load_table(identity).await
                    }
                    other => other,
                }
            })
            .await?;

        tracing::info!(
            "Resolved table {identity} ({} fields, uuid {})",
            metadata.schema.fields.len(),
            metadata.table_uuid
        );
        Ok(TableHandle::from(&metadata))
    }

    /// Append `batch` as one atomic snapshot.
    pub async fn commit(&self, handle: &TableHandle, batch: &RecordBatch) -> Result<CommitResult> {
        if batch.num_rows() == 0 {
            return Err(ConnectorError::InvalidRecord(
                "refusing to commit an empty batch".to_string(),
            ));
        }

        let backend = &self.backend;
        let identity = &handle.identity;
        let snapshot = self
            .with_retry("append", identity, || async move {
                backend.append(identity, batch).await
            })
            .await?;

        tracing::info!(
            "Committed {} rows to {identity} (snapshot {}, sequence {})",
            batch.num_rows(),
            snapshot.snapshot_id,
            snapshot.sequence_number
        );
        Ok(CommitResult {
            snapshot_id: snapshot.snapshot_id,
            sequence_number: snapshot.sequence_number,
            added_records: batch.num_rows() as u64,
        })
    }

    /// Snapshot history, oldest first.
    pub async fn list_snapshots(&self, identity: &TableIdentity) -> Result<Vec<Snapshot>> {
        let mut snapshots = self.load(identity).await?.snapshots;
        snapshots.sort_by_key(|s| s.sequence_number);
        Ok(snapshots)
    }

    /// Pin the data files of the current snapshot, or of `snapshot_id`.
    pub async fn plan_scan(
        &self,
        identity: &TableIdentity,
        snapshot_id: Option<i64>,
    ) -> Result<ScanPlan> {
        let metadata = self.load(identity).await?;

        let snapshot = match snapshot_id {
            Some(id) => Some(metadata.snapshot(id).ok_or_else(|| {
                ConnectorError::from(CatalogError::NoSuchSnapshot {
                    table: identity.clone(),
                    snapshot_id: id,
                })
            })?),
            None => metadata.current_snapshot(),
        };

        let plan = ScanPlan {
            identity: identity.clone(),
            schema: metadata.schema.clone(),
            snapshot_id: snapshot.map(|s| s.snapshot_id),
            files: snapshot.map(|s| s.data_files.clone()).unwrap_or_default(),
        };
        tracing::debug!(
            "Planned scan of {identity} at snapshot {:?}: {} files",
            plan.snapshot_id,
            plan.files.len()
        );
        Ok(plan)
    }

    pub async fn read_data_file(
        &self,
        identity: &TableIdentity,
        file: &DataFile,
    ) -> Result<Vec<RecordBatch>> {
        let backend = &self.backend;
        self.with_retry("read_data_file", identity, || async move {
            backend.read_data_file(identity, file).await
        })
        .await
    }

    /// Run `operation`, retrying retriable backend errors with backoff.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &str,
        identity: &TableIdentity,
        mut f: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, CatalogError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retriable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "Retrying {operation} for {identity} (attempt {attempt}/{}), waiting {}ms: {e}",
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                Err(e) if e.is_retriable() => {
                    let attempts = attempt + 1;
                    tracing::error!(
                        "Failed to {operation} for {identity} after {attempts} attempts. Last error: {e}"
                    );
                    return Err(ConnectorError::CatalogUnavailable {
                        attempts,
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl std::fmt::Debug for CatalogGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogGateway")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
