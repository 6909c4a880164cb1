//! Commit batcher: buffers change records and commits them as snapshots.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lake_catalog::{resolve, CatalogGateway, CommitResult, ResolveMode, ResolvedSchema};
use lake_core::{ChangeRecord, ConnectorError, Result};
use lake_types::ValueCodec;
use tokio::sync::OnceCell;

use crate::batch::encode_records;
use crate::config::SinkConfig;

#[derive(Default)]
struct Buffer {
    records: Vec<ChangeRecord>,
    /// Arrival time of the oldest buffered record.
    first_arrival: Option<Instant>,
}

/// Commit statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub commits: u64,
    pub rows_committed: u64,
    pub last_snapshot_id: Option<i64>,
}

/// Buffers records and commits each flush as one atomic append.
///
/// `submit` only takes the buffer lock briefly, so it never waits for a
/// commit in progress. Flushes are serialized.
pub struct CommitBatcher {
    config: SinkConfig,
    gateway: CatalogGateway,
    codec: ValueCodec,
    buffer: Mutex<Buffer>,
    flush_lock: tokio::sync::Mutex<()>,
    resolved: OnceCell<ResolvedSchema>,
    stats: Mutex<SinkStats>,
    failure: Mutex<Option<ConnectorError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl CommitBatcher {
    pub fn new(config: SinkConfig, gateway: CatalogGateway) -> Self {
        Self {
            config,
            gateway,
            codec: ValueCodec::new(),
            buffer: Mutex::new(Buffer::default()),
            flush_lock: tokio::sync::Mutex::new(()),
            resolved: OnceCell::new(),
            stats: Mutex::new(SinkStats::default()),
            failure: Mutex::new(None),
        }
    }

    pub fn with_codec(mut self, codec: ValueCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Validate and buffer one record.
    pub fn submit(&self, record: ChangeRecord) -> Result<()> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.config.row_schema.validate_values(&record.values)?;

        let mut buffer = lock(&self.buffer);
        if buffer.records.is_empty() {
            buffer.first_arrival = Some(Instant::now());
        }
        buffer.records.push(record);
        Ok(())
    }

    /// Number of buffered records.
    pub fn pending(&self) -> usize {
        lock(&self.buffer).records.len()
    }

    /// Whether the oldest buffered record has waited at least `frequency`.
    pub fn is_due(&self, frequency: Duration) -> bool {
        lock(&self.buffer)
            .first_arrival
            .is_some_and(|t| t.elapsed() >= frequency)
    }

    /// Commit everything buffered so far.
    ///
    /// Returns `None` without touching the catalog when nothing is buffered.
    /// On failure the records stay buffered, ahead of anything submitted
    /// in the meantime.
    pub async fn flush(&self) -> Result<Option<CommitResult>> {
        let _guard = self.flush_lock.lock().await;
        if let Some(err) = self.failure() {
            return Err(err);
        }

        let taken = {
            let mut buffer = lock(&self.buffer);
            std::mem::take(&mut *buffer)
        };
        if taken.records.is_empty() {
            tracing::debug!("Nothing buffered for {}, skipping commit", self.config.identity);
            return Ok(None);
        }

        tracing::debug!(
            "Flushing {} records to {}",
            taken.records.len(),
            self.config.identity
        );
        match self.commit_records(&taken.records).await {
            Ok(result) => {
                let mut stats = lock(&self.stats);
                stats.commits += 1;
                stats.rows_committed += result.added_records;
                stats.last_snapshot_id = Some(result.snapshot_id);
                Ok(Some(result))
            }
            Err(e) => {
                self.restore(taken);
                if e.is_fatal() {
                    tracing::error!("Fatal commit failure for {}: {e}", self.config.identity);
                    *lock(&self.failure) = Some(e.clone());
                }
                Err(e)
            }
        }
    }

    async fn commit_records(&self, records: &[ChangeRecord]) -> Result<CommitResult> {
        let resolved = self
            .resolved
            .get_or_try_init(|| {
                resolve(
                    &self.gateway,
                    &self.config.row_schema,
                    &self.config.identity,
                    ResolveMode::Write,
                )
            })
            .await?;
        let batch = encode_records(resolved, &self.codec, records)?;
        self.gateway.commit(&resolved.handle, &batch).await
    }

    /// Put records taken by a failed flush back in front of the buffer.
    fn restore(&self, taken: Buffer) {
        let mut buffer = lock(&self.buffer);
        let newer = std::mem::take(&mut buffer.records);
        buffer.records = taken.records;
        buffer.records.extend(newer);
        buffer.first_arrival = taken.first_arrival.or(buffer.first_arrival);
    }

    pub fn stats(&self) -> SinkStats {
        lock(&self.stats).clone()
    }

    /// The fatal error that stopped this batcher, if any.
    pub fn failure(&self) -> Option<ConnectorError> {
        lock(&self.failure).clone()
    }
}
