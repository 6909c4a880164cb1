use lake_core::{RowSchema, TableIdentity};

/// Source configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub identity: TableIdentity,
    pub row_schema: RowSchema,
    /// Snapshot to read; the current one when `None`.
    pub snapshot_id: Option<i64>,
}

impl SourceConfig {
    pub fn new(identity: TableIdentity, row_schema: RowSchema) -> Self {
        Self {
            identity,
            row_schema,
            snapshot_id: None,
        }
    }

    pub fn at_snapshot(mut self, snapshot_id: i64) -> Self {
        self.snapshot_id = Some(snapshot_id);
        self
    }
}
