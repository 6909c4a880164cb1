//! Row schemas for the change stream.
//!
//! A [`RowSchema`] is the engine's view of a table: an ordered list of
//! columns, some of which form the primary key. The primary key is used only
//! to identify rows on read; the sink never enforces uniqueness.
//!
//! ## YAML format
//!
//! ```yaml
//! columns:
//!   - name: user_id
//!     type: int
//!     primary_key: true
//!   - name: name
//!     type: string
//!   - name: nickname
//!     type: string
//!     nullable: true
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, Result};
use crate::types::SemanticType;
use crate::values::Value;

/// Column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: SemanticType,

    /// Whether this column accepts `Value::Null`
    #[serde(default)]
    pub nullable: bool,

    /// Whether this column is part of the primary key
    #[serde(default)]
    pub primary_key: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: false,
        }
    }
}

/// Ordered set of columns describing the rows of the change stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSchema {
    columns: Vec<ColumnDefinition>,
}

#[derive(Deserialize)]
struct RowSchemaFile {
    columns: Vec<ColumnDefinition>,
}

impl<'de> Deserialize<'de> for RowSchema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let file = RowSchemaFile::deserialize(deserializer)?;
        RowSchema::new(file.columns).map_err(serde::de::Error::custom)
    }
}

impl RowSchema {
    /// Create a schema, rejecting empty or duplicate column names.
    pub fn new(columns: Vec<ColumnDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(ConnectorError::InvalidRecord(
                    "column name must not be empty".to_string(),
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ConnectorError::InvalidRecord(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn builder() -> RowSchemaBuilder {
        RowSchemaBuilder {
            columns: Vec::new(),
        }
    }

    /// Load a schema from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConnectorError::InvalidRecord(format!(
                "failed to read schema file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ConnectorError::InvalidRecord(format!("failed to parse schema: {e}")))
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Indices of the primary-key columns, in declaration order.
    pub fn primary_key_indices(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check that `values` has one entry per column, each matching the
    /// declared type and nullability.
    pub fn validate_values(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(ConnectorError::InvalidRecord(format!(
                "expected {} values, found {}",
                self.columns.len(),
                values.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(values) {
            match value.semantic_type() {
                None if column.nullable => {}
                None => {
                    return Err(ConnectorError::InvalidRecord(format!(
                        "column '{}' is not nullable",
                        column.name
                    )))
                }
                Some(ty) if ty == column.column_type => {}
                Some(_) => {
                    return Err(ConnectorError::type_mismatch(
                        format!("{} for column '{}'", column.column_type, column.name),
                        value.type_name(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`RowSchema`].
pub struct RowSchemaBuilder {
    columns: Vec<ColumnDefinition>,
}

impl RowSchemaBuilder {
    pub fn column(mut self, name: impl Into<String>, column_type: SemanticType) -> Self {
        self.columns.push(ColumnDefinition::new(name, column_type));
        self
    }

    pub fn nullable_column(mut self, name: impl Into<String>, column_type: SemanticType) -> Self {
        let mut column = ColumnDefinition::new(name, column_type);
        column.nullable = true;
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, column_type: SemanticType) -> Self {
        let mut column = ColumnDefinition::new(name, column_type);
        column.primary_key = true;
        self.columns.push(column);
        self
    }

    pub fn build(self) -> Result<RowSchema> {
        RowSchema::new(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn users() -> RowSchema {
        RowSchema::builder()
            .primary_key("user_id", SemanticType::Int)
            .column("name", SemanticType::String)
            .nullable_column("nickname", SemanticType::String)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_and_lookup() {
        let schema = users();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.primary_key_indices(), vec![0]);
        assert!(schema.column("nickname").unwrap().nullable);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["user_id", "name", "nickname"]);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = RowSchema::builder()
            .column("a", SemanticType::Int)
            .column("a", SemanticType::String)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_values() {
        let schema = users();
        schema
            .validate_values(&[Value::Int(1), Value::from("John"), Value::Null])
            .unwrap();

        let err = schema
            .validate_values(&[Value::Int(1), Value::from("John")])
            .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidRecord(_)));

        let err = schema
            .validate_values(&[Value::Null, Value::from("John"), Value::Null])
            .unwrap_err();
        assert!(err.to_string().contains("user_id"));

        let err = schema
            .validate_values(&[Value::from("1"), Value::from("John"), Value::Null])
            .unwrap_err();
        assert!(matches!(err, ConnectorError::TypeMismatch { .. }));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "columns:\n  - name: user_id\n    type: int\n    primary_key: true\n  - name: payload\n    type: json\n    nullable: true\n"
        )
        .unwrap();

        let schema = RowSchema::from_yaml_file(file.path()).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.columns()[0].primary_key);
        assert_eq!(schema.columns()[1].column_type, SemanticType::Json);
        assert!(schema.columns()[1].nullable);
    }

    #[test]
    fn test_yaml_duplicate_rejected() {
        let yaml = "columns:\n  - name: a\n    type: int\n  - name: a\n    type: int\n";
        assert!(RowSchema::from_yaml_str(yaml).is_err());
    }
}
