//! Streaming sink tests: timed commits, end-of-stream flush and failure retention.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arrow::array::AsArray;
use arrow::datatypes::Int64Type;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use lake_catalog::error::Result as CatalogResult;
use lake_catalog::{
    CatalogBackend, CatalogError, CatalogGateway, DataFile, FilesystemCatalog, MemoryCatalog,
    RetryPolicy, Snapshot, TableMetadata,
};
use lake_core::{ChangeRecord, RowSchema, SemanticType, TableIdentity, TableSchema, Value};
use lake_sink::{LakeSink, SinkConfig};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn identity() -> TableIdentity {
    TableIdentity::new(["test_db"], "users")
}

fn row_schema() -> RowSchema {
    RowSchema::builder()
        .primary_key("user_id", SemanticType::Int)
        .column("name", SemanticType::String)
        .build()
        .unwrap()
}

fn users(run: i64, time: i64) -> Vec<ChangeRecord> {
    ["John", "Jane", "Alice", "Bob"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            ChangeRecord::insert(
                vec![Value::Int(run * 4 + i as i64 + 1), Value::from(*name)],
                time,
            )
        })
        .collect()
}

/// `(time, diff)` of every row visible in the current snapshot.
async fn stored_rows(gateway: &CatalogGateway) -> Vec<(i64, i64)> {
    let plan = match gateway.plan_scan(&identity(), None).await {
        Ok(plan) => plan,
        Err(_) => return Vec::new(),
    };
    let time_idx = plan.schema.index_of("time").unwrap();
    let diff_idx = plan.schema.index_of("diff").unwrap();

    let mut rows = Vec::new();
    for file in &plan.files {
        for batch in gateway.read_data_file(&identity(), file).await.unwrap() {
            let time = batch.column(time_idx).as_primitive::<Int64Type>();
            let diff = batch.column(diff_idx).as_primitive::<Int64Type>();
            for row in 0..batch.num_rows() {
                rows.push((time.value(row), diff.value(row)));
            }
        }
    }
    rows
}

#[tokio::test]
async fn test_single_batch_to_new_table() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let gateway = CatalogGateway::new(Arc::new(FilesystemCatalog::new(dir.path())));

    let sink = LakeSink::start(SinkConfig::new(identity(), row_schema()), gateway.clone());
    for record in users(0, 1) {
        sink.submit(record).unwrap();
    }
    let stats = sink.finish().await.unwrap();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.rows_committed, 4);

    let rows = stored_rows(&gateway).await;
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|(_, diff)| *diff == 1));
    let times: BTreeSet<i64> = rows.iter().map(|(t, _)| *t).collect();
    assert_eq!(times.len(), 1);
}

#[tokio::test]
async fn test_repeated_runs_append() {
    init_logging();
    let dir = TempDir::new().unwrap();

    for run in 0..3 {
        let gateway = CatalogGateway::new(Arc::new(FilesystemCatalog::new(dir.path())));
        let sink = LakeSink::start(
            SinkConfig::new(identity(), row_schema()).with_min_commit_frequency(None),
            gateway,
        );
        for record in users(run, run + 1) {
            sink.submit(record).unwrap();
        }
        sink.finish().await.unwrap();
    }

    let gateway = CatalogGateway::new(Arc::new(FilesystemCatalog::new(dir.path())));
    let rows = stored_rows(&gateway).await;
    assert_eq!(rows.len(), 12);
    assert!(rows.iter().all(|(_, diff)| *diff == 1));
    let times: BTreeSet<i64> = rows.iter().map(|(t, _)| *t).collect();
    assert_eq!(times.len(), 3);
    assert_eq!(gateway.list_snapshots(&identity()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_streaming_commits_before_end_of_stream() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let gateway = CatalogGateway::new(Arc::new(FilesystemCatalog::new(dir.path())));

    let sink = LakeSink::start(
        SinkConfig::new(identity(), row_schema())
            .with_min_commit_frequency(Some(Duration::from_millis(100))),
        gateway.clone(),
    );
    let (tx, rx) = mpsc::channel(16);
    let consumer = tokio::spawn(sink.consume(ReceiverStream::new(rx)));

    for run in 0..3 {
        for record in users(run, run + 1) {
            tx.send(record).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    // All rows land while the stream is still open
    let mut rows = Vec::new();
    for _ in 0..50 {
        rows = stored_rows(&gateway).await;
        if rows.len() == 12 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(rows.len(), 12);
    assert!(!consumer.is_finished());

    drop(tx);
    let stats = consumer.await.unwrap().unwrap();
    assert_eq!(stats.rows_committed, 12);
    assert!(stats.commits >= 3);

    let times: BTreeSet<i64> = rows.iter().map(|(t, _)| *t).collect();
    assert_eq!(times.len(), 3);
}

#[tokio::test]
async fn test_idle_timer_never_commits() {
    init_logging();
    let catalog = Arc::new(MemoryCatalog::new());
    let gateway = CatalogGateway::new(catalog.clone());

    let sink = LakeSink::start(
        SinkConfig::new(identity(), row_schema())
            .with_min_commit_frequency(Some(Duration::from_millis(20))),
        gateway,
    );
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stats = sink.finish().await.unwrap();

    assert_eq!(stats.commits, 0);
    assert!(catalog.table_identities().is_empty());
}

#[tokio::test]
async fn test_retractions_are_stored() {
    let gateway = CatalogGateway::new(Arc::new(MemoryCatalog::new()));
    let sink = LakeSink::start(
        SinkConfig::new(identity(), row_schema()).with_min_commit_frequency(None),
        gateway.clone(),
    );
    sink.submit(ChangeRecord::insert(vec![Value::Int(1), Value::from("John")], 1))
        .unwrap();
    sink.submit(ChangeRecord::retract(vec![Value::Int(1), Value::from("John")], 2))
        .unwrap();
    sink.finish().await.unwrap();

    let rows = stored_rows(&gateway).await;
    assert_eq!(rows, vec![(1, 1), (2, -1)]);
}

/// Fails every append while `down` is set.
struct OutageBackend {
    inner: MemoryCatalog,
    down: AtomicU32,
}

#[async_trait]
impl CatalogBackend for OutageBackend {
    async fn load_table(&self, identity: &TableIdentity) -> CatalogResult<TableMetadata> {
        self.inner.load_table(identity).await
    }

    async fn create_table(
        &self,
        identity: &TableIdentity,
        schema: &TableSchema,
    ) -> CatalogResult<TableMetadata> {
        self.inner.create_table(identity, schema).await
    }

    async fn append(&self, identity: &TableIdentity, batch: &RecordBatch) -> CatalogResult<Snapshot> {
        if self.down.load(Ordering::SeqCst) > 0 {
            return Err(CatalogError::Unavailable("catalog offline".into()));
        }
        self.inner.append(identity, batch).await
    }

    async fn read_data_file(
        &self,
        identity: &TableIdentity,
        file: &DataFile,
    ) -> CatalogResult<Vec<RecordBatch>> {
        self.inner.read_data_file(identity, file).await
    }
}

#[tokio::test]
async fn test_failed_flush_keeps_records() {
    let backend = Arc::new(OutageBackend {
        inner: MemoryCatalog::new(),
        down: AtomicU32::new(1),
    });
    let gateway = CatalogGateway::new(backend.clone()).with_retry_policy(RetryPolicy::none());
    let sink = LakeSink::start(
        SinkConfig::new(identity(), row_schema()).with_min_commit_frequency(None),
        gateway.clone(),
    );

    for record in users(0, 1) {
        sink.submit(record).unwrap();
    }
    let err = sink.flush().await.unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(sink.batcher().pending(), 4);

    // Records submitted during the outage queue up behind the failed ones
    for record in users(1, 2) {
        sink.submit(record).unwrap();
    }

    backend.down.store(0, Ordering::SeqCst);
    let stats = sink.finish().await.unwrap();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.rows_committed, 8);

    let times: Vec<i64> = stored_rows(&gateway).await.iter().map(|(t, _)| *t).collect();
    assert_eq!(times, vec![1, 1, 1, 1, 2, 2, 2, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_sinks_share_a_table() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let gateway = CatalogGateway::new(Arc::new(FilesystemCatalog::new(dir.path())))
        .with_retry_policy(RetryPolicy {
            max_retries: 20,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
        });

    let writer = |first_run: i64, first_time: i64| {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let sink = LakeSink::start(
                SinkConfig::new(identity(), row_schema()).with_min_commit_frequency(None),
                gateway,
            );
            for i in 0..5 {
                for record in users(first_run + i, first_time + i) {
                    sink.submit(record).unwrap();
                }
                sink.flush().await.unwrap();
            }
            sink.finish().await.unwrap()
        })
    };
    let a = writer(0, 1);
    let b = writer(100, 11);
    assert_eq!(a.await.unwrap().commits, 5);
    assert_eq!(b.await.unwrap().commits, 5);

    assert_eq!(gateway.list_snapshots(&identity()).await.unwrap().len(), 10);

    let rows = stored_rows(&gateway).await;
    assert_eq!(rows.len(), 40);
    let times: BTreeSet<i64> = rows.iter().map(|(t, _)| *t).collect();
    assert_eq!(times.len(), 10);

    let plan = gateway.plan_scan(&identity(), None).await.unwrap();
    let id_idx = plan.schema.index_of("user_id").unwrap();
    let mut ids = BTreeSet::new();
    for file in &plan.files {
        for batch in gateway.read_data_file(&identity(), file).await.unwrap() {
            ids.extend(batch.column(id_idx).as_primitive::<Int64Type>().values().iter().copied());
        }
    }
    let expected: BTreeSet<i64> = (1..=20).chain(401..=420).collect();
    assert_eq!(ids, expected);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_dropping_unfinished_sink_warns() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let gateway = CatalogGateway::new(Arc::new(MemoryCatalog::new()));
    let sink = LakeSink::start(
        SinkConfig::new(identity(), row_schema()).with_min_commit_frequency(None),
        gateway.clone(),
    );
    for record in users(0, 1) {
        sink.submit(record).unwrap();
    }
    let batcher = sink.batcher().clone();
    drop(sink);

    assert_eq!(batcher.pending(), 4);
    assert!(gateway.load(&identity()).await.is_err());
    let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("dropped with 4 uncommitted records"));
}
