//! Snapshot reader.
//!
//! A scan pins the data-file list of one snapshot when it is opened. Files
//! are fetched one at a time as iteration reaches them, so commits made
//! after `open` are never observed and dropping the iterator early leaves
//! nothing to clean up.

use std::collections::VecDeque;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use futures::Stream;
use lake_catalog::{resolve, CatalogGateway, DataFile, ResolveMode};
use lake_core::{ConnectorError, Result, RowSchema, TableIdentity, Value};
use lake_types::{column_type_for, native_value_at, ValueCodec};

use crate::config::SourceConfig;
use crate::row::Row;

/// Opens scans over a table.
#[derive(Debug, Clone)]
pub struct SourceReader {
    gateway: CatalogGateway,
    codec: ValueCodec,
}

impl SourceReader {
    pub fn new(gateway: CatalogGateway) -> Self {
        Self {
            gateway,
            codec: ValueCodec::new(),
        }
    }

    pub fn with_codec(mut self, codec: ValueCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Scan the current snapshot.
    pub async fn open(&self, identity: &TableIdentity, row_schema: &RowSchema) -> Result<RowIterator> {
        self.open_at(identity, row_schema, None).await
    }

    /// Scan `snapshot_id`, or the current snapshot when `None`.
    pub async fn open_at(
        &self,
        identity: &TableIdentity,
        row_schema: &RowSchema,
        snapshot_id: Option<i64>,
    ) -> Result<RowIterator> {
        let resolved = resolve(&self.gateway, row_schema, identity, ResolveMode::Read)
            .await
            .map_err(|e| scan_error(identity, e))?;
        let plan = self
            .gateway
            .plan_scan(identity, snapshot_id)
            .await
            .map_err(|e| scan_error(identity, e))?;

        tracing::debug!(
            "Opened scan of {identity} at snapshot {:?} ({} files, table uuid {})",
            plan.snapshot_id,
            plan.files.len(),
            resolved.handle.table_uuid
        );
        Ok(RowIterator {
            gateway: self.gateway.clone(),
            codec: self.codec.clone(),
            identity: identity.clone(),
            row_schema: Arc::new(resolved.row_schema),
            snapshot_id: plan.snapshot_id,
            files: plan.files.into(),
            batches: VecDeque::new(),
            current: None,
        })
    }
}

/// Open a scan as described by `config`.
pub async fn read_table(
    config: &SourceConfig,
    gateway: CatalogGateway,
    codec: ValueCodec,
) -> Result<RowIterator> {
    SourceReader::new(gateway)
        .with_codec(codec)
        .open_at(&config.identity, &config.row_schema, config.snapshot_id)
        .await
}

/// Catalog failures during a scan are reported as snapshot read errors.
fn scan_error(identity: &TableIdentity, err: ConnectorError) -> ConnectorError {
    match err {
        ConnectorError::CatalogUnavailable { .. } | ConnectorError::Catalog(_) => {
            ConnectorError::snapshot_read(identity, err.to_string())
        }
        other => other,
    }
}

struct CurrentBatch {
    batch: RecordBatch,
    /// Batch column for each row column; `None` when the file predates it.
    columns: Vec<Option<usize>>,
    row: usize,
}

impl CurrentBatch {
    fn new(batch: RecordBatch, row_schema: &RowSchema, identity: &TableIdentity) -> Result<Self> {
        let schema = batch.schema();
        let mut columns = Vec::with_capacity(row_schema.len());
        for col in row_schema.columns() {
            match schema.index_of(&col.name) {
                Ok(index) => columns.push(Some(index)),
                Err(_) if col.nullable => columns.push(None),
                Err(_) => {
                    return Err(ConnectorError::snapshot_read(
                        identity,
                        format!("data file lacks required column '{}'", col.name),
                    ))
                }
            }
        }
        Ok(Self {
            batch,
            columns,
            row: 0,
        })
    }

    fn decode_row(
        &self,
        row_schema: &RowSchema,
        codec: &ValueCodec,
        identity: &TableIdentity,
    ) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(self.columns.len());
        for (col, index) in row_schema.columns().iter().zip(&self.columns) {
            let value = match index {
                Some(index) => {
                    let array = self.batch.column(*index);
                    let native = native_value_at(
                        array.as_ref(),
                        column_type_for(col.column_type),
                        self.row,
                    )
                    .map_err(|e| ConnectorError::snapshot_read(identity, e.to_string()))?;
                    codec
                        .decode(&native, col.column_type)
                        .map_err(|e| match e {
                            unsupported @ ConnectorError::UnsupportedType(_) => unsupported,
                            other => ConnectorError::snapshot_read(
                                identity,
                                format!("column '{}': {other}", col.name),
                            ),
                        })?
                }
                None => Value::Null,
            };
            if value.is_null() && !col.nullable {
                return Err(ConnectorError::snapshot_read(
                    identity,
                    format!("null stored in non-nullable column '{}'", col.name),
                ));
            }
            values.push(value);
        }
        Ok(values)
    }
}

/// Rows of one pinned snapshot.
pub struct RowIterator {
    gateway: CatalogGateway,
    codec: ValueCodec,
    identity: TableIdentity,
    row_schema: Arc<RowSchema>,
    snapshot_id: Option<i64>,
    files: VecDeque<DataFile>,
    batches: VecDeque<RecordBatch>,
    current: Option<CurrentBatch>,
}

impl RowIterator {
    /// The snapshot being read, `None` for a table without commits.
    pub fn snapshot_id(&self) -> Option<i64> {
        self.snapshot_id
    }

    pub fn row_schema(&self) -> &RowSchema {
        &self.row_schema
    }

    /// Data files not fetched yet.
    pub fn remaining_files(&self) -> usize {
        self.files.len()
    }

    pub async fn next(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(current) = &mut self.current {
                if current.row < current.batch.num_rows() {
                    let values =
                        current.decode_row(&self.row_schema, &self.codec, &self.identity)?;
                    current.row += 1;
                    return Ok(Some(Row::new(self.row_schema.clone(), values)));
                }
                self.current = None;
            }

            if let Some(batch) = self.batches.pop_front() {
                self.current = Some(CurrentBatch::new(batch, &self.row_schema, &self.identity)?);
                continue;
            }

            let Some(file) = self.files.pop_front() else {
                return Ok(None);
            };
            tracing::debug!(
                "Fetching {} ({} rows) from {}",
                file.path,
                file.record_count,
                self.identity
            );
            let batches = self
                .gateway
                .read_data_file(&self.identity, &file)
                .await
                .map_err(|e| scan_error(&self.identity, e))?;
            self.batches = batches.into();
        }
    }

    /// Read every remaining row.
    pub async fn collect(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Row>> {
        futures::stream::try_unfold(self, |mut rows| async move {
            Ok::<_, ConnectorError>(rows.next().await?.map(|row| (row, rows)))
        })
    }
}

impl std::fmt::Debug for RowIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowIterator")
            .field("identity", &self.identity)
            .field("snapshot_id", &self.snapshot_id)
            .field("remaining_files", &self.files.len())
            .finish_non_exhaustive()
    }
}
