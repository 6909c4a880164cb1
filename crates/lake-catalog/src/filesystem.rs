//! Filesystem-based catalog implementation.
//!
//! Layout of a table under the warehouse directory:
//!
//! ```text
//! <warehouse>/<namespace...>/<table>/
//!     metadata/v1.metadata.json
//!     metadata/v2.metadata.json
//!     metadata/version-hint.text
//!     data/00001-<uuid>.parquet
//! ```
//!
//! Each commit writes its data file first, then writes the next metadata
//! version to a temporary file and hard-links it into place. A metadata
//! version is therefore either absent or complete. Two writers racing for
//! the same version cannot both link it; the loser gets a retriable
//! `CommitConflict`.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use lake_core::{TableIdentity, TableSchema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use uuid::Uuid;

use crate::backend::{check_batch_schema, CatalogBackend};
use crate::error::{CatalogError, Result};
use crate::metadata::{DataFile, Snapshot, TableMetadata};

const METADATA_DIR: &str = "metadata";
const DATA_DIR: &str = "data";
const VERSION_HINT: &str = "version-hint.text";

/// Catalog storing tables as parquet data files plus JSON metadata in a
/// warehouse directory.
pub struct FilesystemCatalog {
    warehouse: PathBuf,
}

impl FilesystemCatalog {
    pub fn new(warehouse: impl Into<PathBuf>) -> Self {
        Self {
            warehouse: warehouse.into(),
        }
    }

    pub fn warehouse(&self) -> &PathBuf {
        &self.warehouse
    }

    /// Root directory of a table.
    pub fn table_dir(&self, identity: &TableIdentity) -> PathBuf {
        identity
            .segments()
            .fold(self.warehouse.clone(), |path, segment| path.join(segment))
    }

    fn metadata_path(table_dir: &Path, version: u64) -> PathBuf {
        table_dir
            .join(METADATA_DIR)
            .join(format!("v{version}.metadata.json"))
    }

    /// Latest committed metadata version, `None` if the table doesn't exist.
    ///
    /// The version hint may lag behind when a writer died between creating
    /// a metadata file and updating the hint, so newer versions are probed.
    fn current_version(table_dir: &Path) -> Result<Option<u64>> {
        let hint_path = table_dir.join(METADATA_DIR).join(VERSION_HINT);
        let mut version = match std::fs::read_to_string(&hint_path) {
            Ok(content) => content.trim().parse::<u64>().unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid version hint {}: {e}", hint_path.display());
                0
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        while Self::metadata_path(table_dir, version + 1).exists() {
            version += 1;
        }
        Ok((version > 0).then_some(version))
    }

    fn read_metadata(table_dir: &Path, version: u64) -> Result<TableMetadata> {
        let content = std::fs::read_to_string(Self::metadata_path(table_dir, version))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Temporary sibling of a metadata-dir file, unique per writer.
    fn temp_path(table_dir: &Path, name: &str) -> PathBuf {
        table_dir
            .join(METADATA_DIR)
            .join(format!(".{name}.{}.tmp", Uuid::new_v4()))
    }

    /// Publish metadata version `version`, failing with `AlreadyExists` if
    /// another writer published it first.
    fn write_metadata(table_dir: &Path, version: u64, metadata: &TableMetadata) -> std::io::Result<()> {
        let path = Self::metadata_path(table_dir, version);
        let content = serde_json::to_string_pretty(metadata).map_err(std::io::Error::other)?;

        let tmp = Self::temp_path(table_dir, &format!("v{version}.metadata.json"));
        let published = write_synced(&tmp, content.as_bytes())
            .and_then(|()| std::fs::hard_link(&tmp, &path));
        if let Err(e) = std::fs::remove_file(&tmp) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("Failed to remove temporary metadata {}: {e}", tmp.display());
            }
        }
        published
    }

    fn write_version_hint(table_dir: &Path, version: u64) {
        let hint_path = table_dir.join(METADATA_DIR).join(VERSION_HINT);
        let tmp = Self::temp_path(table_dir, VERSION_HINT);
        let result = write_synced(&tmp, version.to_string().as_bytes())
            .and_then(|()| std::fs::rename(&tmp, &hint_path));
        if let Err(e) = result {
            // Readers probe past a stale hint
            tracing::warn!("Failed to update version hint {}: {e}", hint_path.display());
            let _ = std::fs::remove_file(&tmp);
        }
    }

    fn load(&self, identity: &TableIdentity) -> Result<(u64, TableMetadata)> {
        let table_dir = self.table_dir(identity);
        let version = Self::current_version(&table_dir)?
            .ok_or_else(|| CatalogError::NoSuchTable(identity.clone()))?;
        let metadata = Self::read_metadata(&table_dir, version)?;
        Ok((version, metadata))
    }

    /// Publish `batch` on top of metadata `version`.
    fn commit(
        &self,
        identity: &TableIdentity,
        version: u64,
        metadata: &TableMetadata,
        batch: &RecordBatch,
    ) -> Result<Snapshot> {
        let table_dir = self.table_dir(identity);
        check_batch_schema(identity, &metadata.schema, batch)?;

        let relative = format!(
            "{DATA_DIR}/{:05}-{}.parquet",
            metadata.next_sequence_number(),
            Uuid::new_v4()
        );
        let data_path = table_dir.join(&relative);
        std::fs::create_dir_all(table_dir.join(DATA_DIR))?;
        let size_bytes = write_parquet(&data_path, batch)?;
        tracing::debug!(
            "Wrote data file {} ({} rows, {size_bytes} bytes)",
            data_path.display(),
            batch.num_rows()
        );

        let (next, snapshot) = metadata.with_appended_file(DataFile {
            path: relative,
            record_count: batch.num_rows() as u64,
            size_bytes,
        });

        if let Err(e) = Self::write_metadata(&table_dir, version + 1, &next) {
            if let Err(cleanup) = std::fs::remove_file(&data_path) {
                tracing::warn!(
                    "Failed to remove orphaned data file {}: {cleanup}",
                    data_path.display()
                );
            }
            if e.kind() == ErrorKind::AlreadyExists {
                return Err(CatalogError::CommitConflict {
                    table: identity.to_string(),
                    message: format!(
                        "metadata version {} was committed concurrently",
                        version + 1
                    ),
                });
            }
            return Err(e.into());
        }
        Self::write_version_hint(&table_dir, version + 1);

        Ok(snapshot)
    }
}

/// Create `path` with `content` and flush it to disk.
fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

/// Encode one batch as a parquet file.
fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<u64> {
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(1).unwrap_or_default()))
        .build();

    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(std::fs::metadata(path)?.len())
}

fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CatalogError::Corrupt(format!(
                "missing data file {}",
                path.display()
            )))
        }
        Err(e) => return Err(e.into()),
    };
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

#[async_trait]
impl CatalogBackend for FilesystemCatalog {
    async fn load_table(&self, identity: &TableIdentity) -> Result<TableMetadata> {
        let (_, metadata) = self.load(identity)?;
        Ok(metadata)
    }

    async fn create_table(
        &self,
        identity: &TableIdentity,
        schema: &TableSchema,
    ) -> Result<TableMetadata> {
        let table_dir = self.table_dir(identity);
        if Self::current_version(&table_dir)?.is_some() {
            return Err(CatalogError::TableAlreadyExists(identity.clone()));
        }

        std::fs::create_dir_all(table_dir.join(METADATA_DIR))?;
        std::fs::create_dir_all(table_dir.join(DATA_DIR))?;

        let metadata = TableMetadata::new(identity.clone(), schema.clone());
        match Self::write_metadata(&table_dir, 1, &metadata) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CatalogError::TableAlreadyExists(identity.clone()))
            }
            Err(e) => return Err(e.into()),
        }
        Self::write_version_hint(&table_dir, 1);

        tracing::info!("Created table {identity} at {}", table_dir.display());
        Ok(metadata)
    }

    async fn append(&self, identity: &TableIdentity, batch: &RecordBatch) -> Result<Snapshot> {
        let (version, metadata) = self.load(identity)?;
        self.commit(identity, version, &metadata, batch)
    }

    async fn read_data_file(
        &self,
        identity: &TableIdentity,
        file: &DataFile,
    ) -> Result<Vec<RecordBatch>> {
        let path = self.table_dir(identity).join(&file.path);
        tracing::debug!("Reading data file {}", path.display());
        read_parquet(&path)
    }
}
