//! Engine-side semantic types.
//!
//! `SemanticType` is the type universe of the change stream. The table store
//! has a smaller, storage-oriented universe (see [`crate::table::ColumnType`]);
//! the mapping between the two lives in the `lake-types` codec.

use serde::{Deserialize, Serialize};

/// Column type as seen by the dataflow engine.
///
/// # YAML Format
///
/// ```yaml
/// type: int
/// type: date_time_utc
/// type: object
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Boolean value
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit IEEE 754 floating point
    Float,
    /// UTF-8 string
    String,
    /// Arbitrary byte sequence
    Bytes,
    /// Wall-clock date and time without zone
    DateTimeNaive,
    /// Instant in time, always normalized to UTC
    DateTimeUtc,
    /// Signed time span
    Duration,
    /// Semi-structured JSON document
    Json,
    /// Caller-supplied object with its own serializer
    Object,
}

impl SemanticType {
    pub const ALL: [SemanticType; 10] = [
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::Bytes,
        Self::DateTimeNaive,
        Self::DateTimeUtc,
        Self::Duration,
        Self::Json,
        Self::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::DateTimeNaive => "date_time_naive",
            Self::DateTimeUtc => "date_time_utc",
            Self::Duration => "duration",
            Self::Json => "json",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| format!("Unknown semantic type: '{s}'"))
    }
}
