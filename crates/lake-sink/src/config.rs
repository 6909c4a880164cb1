use std::time::Duration;

use lake_core::{RowSchema, TableIdentity};

/// Default maximum age of buffered records before a commit is forced.
pub const DEFAULT_MIN_COMMIT_FREQUENCY: Duration = Duration::from_millis(60_000);

const MIN_TICK: Duration = Duration::from_millis(10);
const MAX_TICK: Duration = Duration::from_millis(250);

/// Sink configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub identity: TableIdentity,
    pub row_schema: RowSchema,
    /// Commit at least this often while records are buffered.
    /// `None` commits only on explicit flush and at end of stream.
    pub min_commit_frequency: Option<Duration>,
}

impl SinkConfig {
    pub fn new(identity: TableIdentity, row_schema: RowSchema) -> Self {
        Self {
            identity,
            row_schema,
            min_commit_frequency: Some(DEFAULT_MIN_COMMIT_FREQUENCY),
        }
    }

    pub fn with_min_commit_frequency(mut self, frequency: Option<Duration>) -> Self {
        self.min_commit_frequency = frequency;
        self
    }
}

/// How often the commit timer checks the buffer age.
pub fn tick_interval(frequency: Duration) -> Duration {
    (frequency / 4).clamp(MIN_TICK, MAX_TICK)
}
