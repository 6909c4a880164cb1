//! Command-line interface for lake-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Append rows as one snapshot at logical time 1
//! lake-sync write --warehouse ./warehouse --table test_db.users \
//!   --schema users.yaml --input users.jsonl --time 1
//!
//! # Read the current snapshot, or an older one
//! lake-sync read --warehouse ./warehouse --table test_db.users --schema users.yaml
//! lake-sync read --warehouse ./warehouse --table test_db.users --schema users.yaml \
//!   --snapshot-id 4611686018427387904
//!
//! # List snapshots
//! lake-sync snapshots --warehouse ./warehouse --table test_db.users
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lake_core::RowSchema;
use lake_sync::duration::parse_commit_frequency;
use lake_sync::{read, write, TableOpts};

#[derive(Parser)]
#[command(name = "lake-sync")]
#[command(about = "Move a change stream into snapshot-based columnar tables and back")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append JSON Lines rows to a table
    Write {
        #[command(flatten)]
        table: TableOpts,

        /// Row schema file (YAML)
        #[arg(long, value_name = "PATH")]
        schema: PathBuf,

        /// JSON Lines input, one object per row
        #[arg(long, value_name = "PATH")]
        input: PathBuf,

        /// Logical time for rows without a "time" member
        #[arg(long, default_value = "0")]
        time: i64,

        /// Commit interval while streaming ("250ms", "5s", "1m", or "off")
        #[arg(long, default_value = "60s")]
        min_commit_frequency: String,
    },

    /// Print the rows of a snapshot as JSON Lines
    Read {
        #[command(flatten)]
        table: TableOpts,

        /// Row schema file (YAML)
        #[arg(long, value_name = "PATH")]
        schema: PathBuf,

        /// Snapshot to read (default: current)
        #[arg(long)]
        snapshot_id: Option<i64>,
    },

    /// List the snapshots of a table
    Snapshots {
        #[command(flatten)]
        table: TableOpts,
    },
}

fn load_schema(path: &Path) -> anyhow::Result<RowSchema> {
    RowSchema::from_yaml_file(path)
        .with_context(|| format!("Failed to load schema file: {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Write {
            table,
            schema,
            input,
            time,
            min_commit_frequency,
        } => {
            let schema = load_schema(&schema)?;
            let min_commit_frequency = parse_commit_frequency(&min_commit_frequency)
                .context("Invalid --min-commit-frequency")?;
            let stats =
                write::write_jsonl(&table, &schema, &input, time, min_commit_frequency).await?;
            println!(
                "{} rows committed in {} snapshots (last: {:?})",
                stats.rows_committed, stats.commits, stats.last_snapshot_id
            );
        }
        Commands::Read {
            table,
            schema,
            snapshot_id,
        } => {
            let schema = load_schema(&schema)?;
            let mut out = std::io::stdout().lock();
            read::read_jsonl(&table, &schema, snapshot_id, &mut out).await?;
        }
        Commands::Snapshots { table } => {
            let mut out = std::io::stdout().lock();
            read::list_snapshots(&table, &mut out).await?;
        }
    }

    Ok(())
}
