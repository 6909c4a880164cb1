//! Streaming sink with a background commit timer.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use lake_catalog::{CatalogGateway, CommitResult};
use lake_core::{ChangeRecord, Result};
use lake_types::ValueCodec;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::batcher::{CommitBatcher, SinkStats};
use crate::config::{tick_interval, SinkConfig};

/// A running sink.
///
/// Records are buffered by a [`CommitBatcher`]. When
/// `min_commit_frequency` is set, a background task commits the buffer once
/// its oldest record is that old. [`finish`](Self::finish) stops the task
/// and commits whatever is left.
pub struct LakeSink {
    batcher: Arc<CommitBatcher>,
    shutdown: Option<broadcast::Sender<()>>,
    timer: Option<JoinHandle<()>>,
}

impl LakeSink {
    /// Start a sink. Must be called from within a tokio runtime.
    pub fn start(config: SinkConfig, gateway: CatalogGateway) -> Self {
        Self::start_with_codec(config, gateway, ValueCodec::new())
    }

    pub fn start_with_codec(config: SinkConfig, gateway: CatalogGateway, codec: ValueCodec) -> Self {
        let frequency = config.min_commit_frequency;
        let identity = config.identity.clone();
        let batcher = Arc::new(CommitBatcher::new(config, gateway).with_codec(codec));

        let (shutdown, timer) = match frequency {
            Some(frequency) => {
                let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
                let handle = tokio::spawn(run_commit_timer(batcher.clone(), frequency, shutdown_rx));
                (Some(shutdown_tx), Some(handle))
            }
            None => (None, None),
        };

        info!(
            "Started sink for {identity} (min commit frequency {:?})",
            frequency
        );
        Self {
            batcher,
            shutdown,
            timer,
        }
    }

    pub fn submit(&self, record: ChangeRecord) -> Result<()> {
        self.batcher.submit(record)
    }

    pub async fn flush(&self) -> Result<Option<CommitResult>> {
        self.batcher.flush().await
    }

    pub fn stats(&self) -> SinkStats {
        self.batcher.stats()
    }

    pub fn batcher(&self) -> &Arc<CommitBatcher> {
        &self.batcher
    }

    /// Stop the timer, then commit everything still buffered.
    pub async fn finish(mut self) -> Result<SinkStats> {
        self.stop_timer().await;
        self.batcher.flush().await?;
        let stats = self.batcher.stats();
        info!(
            "Sink for {} finished: {} commits, {} rows",
            self.batcher.config().identity,
            stats.commits,
            stats.rows_committed
        );
        Ok(stats)
    }

    /// Submit every record of `stream`, then [`finish`](Self::finish).
    pub async fn consume<S>(mut self, stream: S) -> Result<SinkStats>
    where
        S: Stream<Item = ChangeRecord>,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(record) = stream.next().await {
            if let Err(e) = self.submit(record) {
                self.stop_timer().await;
                return Err(e);
            }
        }
        debug!("Input stream ended");
        self.finish().await
    }

    async fn stop_timer(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(timer) = self.timer.take() {
            if let Err(e) = timer.await {
                warn!("Commit timer task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for LakeSink {
    fn drop(&mut self) {
        // finish() flushes, so anything left here is lost
        let pending = self.batcher.pending();
        if pending > 0 {
            warn!(
                "Sink for {} dropped with {pending} uncommitted records",
                self.batcher.config().identity
            );
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn run_commit_timer(
    batcher: Arc<CommitBatcher>,
    frequency: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(tick_interval(frequency));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("Commit timer stopped");
                break;
            }
            _ = ticker.tick() => {
                if !batcher.is_due(frequency) {
                    continue;
                }
                match batcher.flush().await {
                    Ok(Some(result)) => debug!(
                        "Timed commit of {} rows (snapshot {})",
                        result.added_records, result.snapshot_id
                    ),
                    Ok(None) => {}
                    Err(e) if e.is_fatal() => {
                        error!("Stopping commit timer after fatal error: {e}");
                        break;
                    }
                    Err(e) => {
                        warn!("Timed commit failed, records kept for the next attempt: {e}");
                    }
                }
            }
        }
    }
}
