//! `write` command: append JSON Lines rows to a table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use lake_core::{ChangeRecord, RowSchema};
use lake_sink::{LakeSink, SinkConfig, SinkStats};
use tracing::info;

use crate::{jsonl, TableOpts};

/// Read every record of `input`, then stream them through a sink.
///
/// Records are parsed up front so a malformed line aborts before anything
/// is committed.
pub async fn write_jsonl(
    opts: &TableOpts,
    schema: &RowSchema,
    input: &Path,
    time: i64,
    min_commit_frequency: Option<Duration>,
) -> Result<SinkStats> {
    let records = read_records(schema, input, time)?;
    info!(
        "Writing {} records from {} to {}",
        records.len(),
        input.display(),
        opts.table
    );

    let config = SinkConfig::new(opts.table.clone(), schema.clone())
        .with_min_commit_frequency(min_commit_frequency);
    let sink = LakeSink::start(config, opts.gateway());
    let stats = sink
        .consume(futures::stream::iter(records))
        .await
        .with_context(|| format!("Failed to write to {}", opts.table))?;

    info!(
        "Committed {} rows in {} snapshots to {}",
        stats.rows_committed, stats.commits, opts.table
    );
    Ok(stats)
}

fn read_records(schema: &RowSchema, input: &Path, time: i64) -> Result<Vec<ChangeRecord>> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    let mut records = Vec::new();
    for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = jsonl::parse_record(schema, &line, time)
            .with_context(|| format!("{}:{}", input.display(), line_number + 1))?;
        records.push(record);
    }
    Ok(records)
}
