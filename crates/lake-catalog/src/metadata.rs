//! Table metadata: schema, snapshot history and data files.
//!
//! Snapshots are cumulative. Each one lists every data file visible at that
//! point, so reading a snapshot never needs to walk its ancestors.

use std::collections::BTreeMap;

use chrono::Utc;
use lake_core::{TableIdentity, TableSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary key holding the number of rows a snapshot added.
pub const ADDED_RECORDS: &str = "added-records";
/// Summary key holding the number of rows visible in a snapshot.
pub const TOTAL_RECORDS: &str = "total-records";

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    /// Location relative to the table root.
    pub path: String,
    pub record_count: u64,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: i64,
    pub parent_snapshot_id: Option<i64>,
    pub sequence_number: i64,
    pub timestamp_ms: i64,
    pub data_files: Vec<DataFile>,
    #[serde(default)]
    pub summary: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn added_records(&self) -> u64 {
        self.summary
            .get(ADDED_RECORDS)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn total_records(&self) -> u64 {
        self.data_files.iter().map(|f| f.record_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub format_version: u32,
    pub identity: TableIdentity,
    pub table_uuid: Uuid,
    pub schema: TableSchema,
    pub current_snapshot_id: Option<i64>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
    pub last_sequence_number: i64,
    pub last_updated_ms: i64,
}

impl TableMetadata {
    /// Metadata for a freshly created, empty table.
    pub fn new(identity: TableIdentity, schema: TableSchema) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            identity,
            table_uuid: Uuid::new_v4(),
            schema,
            current_snapshot_id: None,
            snapshots: Vec::new(),
            last_sequence_number: 0,
            last_updated_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.current_snapshot_id.and_then(|id| self.snapshot(id))
    }

    pub fn snapshot(&self, snapshot_id: i64) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.snapshot_id == snapshot_id)
    }

    /// Sequence number the next commit will carry.
    pub fn next_sequence_number(&self) -> i64 {
        self.last_sequence_number + 1
    }

    /// The metadata that results from appending `file` on top of the
    /// current snapshot. `self` is left untouched.
    pub fn with_appended_file(&self, file: DataFile) -> (TableMetadata, Snapshot) {
        let sequence_number = self.next_sequence_number();
        let added = file.record_count;

        let mut data_files = self
            .current_snapshot()
            .map(|s| s.data_files.clone())
            .unwrap_or_default();
        data_files.push(file);

        let mut summary = BTreeMap::new();
        summary.insert("operation".to_string(), "append".to_string());
        summary.insert(ADDED_RECORDS.to_string(), added.to_string());
        summary.insert(
            TOTAL_RECORDS.to_string(),
            data_files.iter().map(|f| f.record_count).sum::<u64>().to_string(),
        );

        let now = Utc::now().timestamp_millis();
        let snapshot = Snapshot {
            snapshot_id: new_snapshot_id(),
            parent_snapshot_id: self.current_snapshot_id,
            sequence_number,
            timestamp_ms: now,
            data_files,
            summary,
        };

        let mut next = self.clone();
        next.current_snapshot_id = Some(snapshot.snapshot_id);
        next.snapshots.push(snapshot.clone());
        next.last_sequence_number = sequence_number;
        next.last_updated_ms = now;
        (next, snapshot)
    }
}

/// Files to read for one snapshot of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    pub identity: TableIdentity,
    pub schema: TableSchema,
    /// `None` when the table has no snapshot yet.
    pub snapshot_id: Option<i64>,
    pub files: Vec<DataFile>,
}

/// Random positive snapshot id.
fn new_snapshot_id() -> i64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    (high & i64::MAX as u64) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use lake_core::{ColumnType, TableField};

    fn metadata() -> TableMetadata {
        TableMetadata::new(
            TableIdentity::new(["db"], "events"),
            TableSchema::new(vec![TableField::new(1, "id", ColumnType::Long, true)]),
        )
    }

    fn file(path: &str, rows: u64) -> DataFile {
        DataFile {
            path: path.to_string(),
            record_count: rows,
            size_bytes: 10,
        }
    }

    #[test]
    fn test_appends_are_cumulative() {
        let empty = metadata();
        assert!(empty.current_snapshot().is_none());

        let (first, s1) = empty.with_appended_file(file("data/1.parquet", 4));
        assert_eq!(s1.sequence_number, 1);
        assert_eq!(s1.parent_snapshot_id, None);
        assert_eq!(s1.added_records(), 4);

        let (second, s2) = first.with_appended_file(file("data/2.parquet", 3));
        assert_eq!(s2.parent_snapshot_id, Some(s1.snapshot_id));
        assert_eq!(s2.data_files.len(), 2);
        assert_eq!(s2.total_records(), 7);
        assert_eq!(second.current_snapshot_id, Some(s2.snapshot_id));
        assert_eq!(second.snapshots.len(), 2);

        // Older snapshots keep their own file list
        assert_eq!(second.snapshot(s1.snapshot_id).unwrap().data_files.len(), 1);
        // Source metadata is unchanged
        assert!(empty.snapshots.is_empty());
    }

    #[test]
    fn test_snapshot_ids_are_positive() {
        for _ in 0..64 {
            assert!(new_snapshot_id() >= 0);
        }
    }

    #[test]
    fn test_metadata_json_round_trip() {
        let (meta, _) = metadata().with_appended_file(file("data/1.parquet", 1));
        let json = serde_json::to_string_pretty(&meta).unwrap();
        let parsed: TableMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, meta);
    }
}
