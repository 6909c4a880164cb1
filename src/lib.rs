//! lake-sync Library
//!
//! A connector between a dataflow engine's change stream and snapshot-based
//! columnar tables.
//!
//! # Connector Crates
//!
//! - `lake_core` - Row schemas, values, change records and the error taxonomy
//! - `lake_types` - Value codec between engine values and columnar storage
//! - `lake_catalog` - Catalog gateway, backends and schema resolution
//! - `lake_sink` - Commit batcher appending one snapshot per flush
//! - `lake_source` - Snapshot reader
//!
//! # CLI Usage
//!
//! ```bash
//! # Append JSON Lines rows as one snapshot
//! lake-sync write --warehouse ./warehouse --table test_db.users \
//!   --schema users.yaml --input users.jsonl --time 1
//!
//! # Read the current snapshot back
//! lake-sync read --warehouse ./warehouse --table test_db.users --schema users.yaml
//!
//! # List snapshots
//! lake-sync snapshots --warehouse ./warehouse --table test_db.users
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lake_catalog::{CatalogGateway, FilesystemCatalog};
use lake_core::TableIdentity;

pub mod duration;
pub mod jsonl;
pub mod read;
pub mod write;

#[derive(Parser, Clone, Debug)]
pub struct TableOpts {
    /// Warehouse directory holding the tables
    #[arg(long, env = "LAKE_SYNC_WAREHOUSE")]
    pub warehouse: PathBuf,

    /// Table identity as dotted path (e.g. "test_db.users")
    #[arg(long)]
    pub table: TableIdentity,
}

impl TableOpts {
    pub fn gateway(&self) -> CatalogGateway {
        CatalogGateway::new(Arc::new(FilesystemCatalog::new(&self.warehouse)))
    }
}
