//! `read` and `snapshots` commands.

use std::io::Write;

use anyhow::{Context, Result};
use lake_core::RowSchema;
use lake_source::SourceReader;
use serde_json::json;

use crate::{jsonl, TableOpts};

/// Write the rows of a snapshot to `out` as JSON Lines. Returns the row count.
pub async fn read_jsonl(
    opts: &TableOpts,
    schema: &RowSchema,
    snapshot_id: Option<i64>,
    out: &mut impl Write,
) -> Result<usize> {
    let mut rows = SourceReader::new(opts.gateway())
        .open_at(&opts.table, schema, snapshot_id)
        .await
        .with_context(|| format!("Failed to open {}", opts.table))?;

    let mut count = 0;
    while let Some(row) = rows.next().await? {
        writeln!(out, "{}", jsonl::format_row(&row)?)?;
        count += 1;
    }
    tracing::debug!(
        "Read {count} rows from {} at snapshot {:?}",
        opts.table,
        rows.snapshot_id()
    );
    Ok(count)
}

/// Write one JSON line per snapshot, oldest first. Returns the snapshot count.
pub async fn list_snapshots(opts: &TableOpts, out: &mut impl Write) -> Result<usize> {
    let snapshots = opts
        .gateway()
        .list_snapshots(&opts.table)
        .await
        .with_context(|| format!("Failed to list snapshots of {}", opts.table))?;
    for snapshot in &snapshots {
        let line = json!({
            "snapshot_id": snapshot.snapshot_id,
            "parent_snapshot_id": snapshot.parent_snapshot_id,
            "sequence_number": snapshot.sequence_number,
            "timestamp_ms": snapshot.timestamp_ms,
            "added_records": snapshot.added_records(),
            "total_records": snapshot.total_records(),
        });
        writeln!(out, "{line}")?;
    }
    Ok(snapshots.len())
}
