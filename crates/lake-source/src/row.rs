use std::sync::Arc;

use lake_core::{RowSchema, Value};

/// One row read back from a table, in row-schema column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<RowSchema>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(schema: Arc<RowSchema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Values of the primary key columns, in schema order.
    pub fn primary_key(&self) -> Vec<&Value> {
        self.schema
            .primary_key_indices()
            .into_iter()
            .filter_map(|i| self.values.get(i))
            .collect()
    }
}
