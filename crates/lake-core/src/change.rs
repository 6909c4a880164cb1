//! Change records emitted by the engine.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};
use crate::values::Value;

/// Sign of a change: insertion or retraction of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diff {
    Insert,
    Retract,
}

impl Diff {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Insert => 1,
            Self::Retract => -1,
        }
    }
}

impl TryFrom<i64> for Diff {
    type Error = ConnectorError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::Insert),
            -1 => Ok(Self::Retract),
            other => Err(ConnectorError::InvalidRecord(format!(
                "diff must be +1 or -1, found {other}"
            ))),
        }
    }
}

/// One row event: values in row-schema order, a logical time and a sign.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub values: Vec<Value>,
    pub time: i64,
    pub diff: Diff,
}

impl ChangeRecord {
    pub fn new(values: Vec<Value>, time: i64, diff: i64) -> Result<Self> {
        Ok(Self {
            values,
            time,
            diff: Diff::try_from(diff)?,
        })
    }

    pub fn insert(values: Vec<Value>, time: i64) -> Self {
        Self {
            values,
            time,
            diff: Diff::Insert,
        }
    }

    pub fn retract(values: Vec<Value>, time: i64) -> Self {
        Self {
            values,
            time,
            diff: Diff::Retract,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_conversion() {
        assert_eq!(Diff::try_from(1).unwrap(), Diff::Insert);
        assert_eq!(Diff::try_from(-1).unwrap(), Diff::Retract);
        assert!(Diff::try_from(0).is_err());
        assert!(Diff::try_from(2).is_err());
        assert_eq!(Diff::Retract.as_i64(), -1);
    }

    #[test]
    fn test_record_constructors() {
        let r = ChangeRecord::new(vec![Value::Int(1)], 10, -1).unwrap();
        assert_eq!(r, ChangeRecord::retract(vec![Value::Int(1)], 10));
        assert!(ChangeRecord::new(vec![], 0, 0).is_err());
    }
}
