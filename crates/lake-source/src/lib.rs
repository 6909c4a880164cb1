//! Snapshot source for lake-sync.
//!
//! Reads one snapshot of a table back as rows of a caller-supplied
//! [`RowSchema`](lake_core::RowSchema). Bookkeeping columns (`time`,
//! `diff`) are returned only when the row schema declares them, as
//! ordinary `int` columns; retractions are surfaced as stored.

pub mod config;
pub mod reader;
pub mod row;

pub use config::SourceConfig;
pub use reader::{read_table, RowIterator, SourceReader};
pub use row::Row;
