//! Schema resolution between a row schema and a table schema.
//!
//! Writing needs the table to hold every row column plus the `time`/`diff`
//! bookkeeping columns. Reading only needs the row columns. Columns are
//! matched by name and must map to the same storage type.

use lake_core::{
    ColumnType, ConnectorError, Result, RowSchema, TableField, TableIdentity, TableSchema,
    DIFF_COLUMN, TIME_COLUMN,
};
use lake_types::column_type_for;

use crate::gateway::{CatalogGateway, TableHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Read,
    Write,
}

/// Where the value of one table column comes from when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Row column at this index
    Data(usize),
    /// The record's logical time
    Time,
    /// The record's diff
    Diff,
    /// Not written; always null
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub handle: TableHandle,
    pub row_schema: RowSchema,
    /// One entry per table field, in table order.
    pub layout: Vec<ColumnSource>,
    /// Table field index for each row column, in row order.
    pub projection: Vec<usize>,
}

impl ResolvedSchema {
    pub fn identity(&self) -> &TableIdentity {
        &self.handle.identity
    }

    pub fn table_schema(&self) -> &TableSchema {
        &self.handle.schema
    }
}

/// Table schema for a brand new table holding `row_schema` rows.
///
/// Field ids are assigned in row order starting at 1, followed by the
/// required `time` and `diff` columns.
pub fn build_table_schema(row_schema: &RowSchema) -> TableSchema {
    let mut fields: Vec<TableField> = row_schema
        .columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            TableField::new(
                i as i32 + 1,
                &col.name,
                column_type_for(col.column_type),
                !col.nullable,
            )
        })
        .collect();
    let next_id = fields.len() as i32 + 1;
    fields.push(TableField::new(next_id, TIME_COLUMN, ColumnType::Long, true));
    fields.push(TableField::new(next_id + 1, DIFF_COLUMN, ColumnType::Long, true));
    TableSchema::new(fields)
}

/// Resolve `row_schema` against the table `identity`.
///
/// In write mode a missing table is created; in read mode it is reported
/// as `TableNotFound`.
pub async fn resolve(
    gateway: &CatalogGateway,
    row_schema: &RowSchema,
    identity: &TableIdentity,
    mode: ResolveMode,
) -> Result<ResolvedSchema> {
    if mode == ResolveMode::Write {
        for reserved in [TIME_COLUMN, DIFF_COLUMN] {
            if row_schema.column(reserved).is_some() {
                return Err(ConnectorError::schema_mismatch(
                    identity,
                    format!("column name '{reserved}' is reserved for change bookkeeping"),
                ));
            }
        }
    }

    let handle = match mode {
        ResolveMode::Write => {
            gateway
                .resolve_or_create(identity, &build_table_schema(row_schema))
                .await?
        }
        ResolveMode::Read => TableHandle::from(&gateway.load(identity).await?),
    };

    let (layout, projection) = check_compatibility(identity, row_schema, &handle.schema, mode)?;
    tracing::debug!("Resolved {identity} in {mode:?} mode: layout {layout:?}");

    Ok(ResolvedSchema {
        handle,
        row_schema: row_schema.clone(),
        layout,
        projection,
    })
}

/// Match row columns to table fields.
pub fn check_compatibility(
    identity: &TableIdentity,
    row_schema: &RowSchema,
    table: &TableSchema,
    mode: ResolveMode,
) -> Result<(Vec<ColumnSource>, Vec<usize>)> {
    let mismatch = |message: String| ConnectorError::schema_mismatch(identity, message);

    let mut projection = Vec::with_capacity(row_schema.len());
    for col in row_schema.columns() {
        let index = table
            .index_of(&col.name)
            .ok_or_else(|| mismatch(format!("column '{}' is missing from the table", col.name)))?;
        let field = &table.fields[index];
        let expected = column_type_for(col.column_type);
        if field.column_type != expected {
            return Err(mismatch(format!(
                "column '{}' is {} in the table but {} ({}) in the row schema",
                col.name, field.column_type, expected, col.column_type
            )));
        }
        if col.nullable && field.required {
            return Err(mismatch(format!(
                "nullable column '{}' targets a required table column",
                col.name
            )));
        }
        projection.push(index);
    }

    if mode == ResolveMode::Write && !table.has_bookkeeping_columns() {
        return Err(mismatch(format!(
            "table lacks the long '{TIME_COLUMN}' and '{DIFF_COLUMN}' columns"
        )));
    }

    let mut layout = Vec::with_capacity(table.fields.len());
    for field in &table.fields {
        let source = match row_schema.index_of(&field.name) {
            Some(i) => ColumnSource::Data(i),
            None if mode == ResolveMode::Write && field.name == TIME_COLUMN => ColumnSource::Time,
            None if mode == ResolveMode::Write && field.name == DIFF_COLUMN => ColumnSource::Diff,
            None if mode == ResolveMode::Write && field.required => {
                return Err(mismatch(format!(
                    "required table column '{}' has no row column",
                    field.name
                )))
            }
            None => ColumnSource::Absent,
        };
        layout.push(source);
    }

    Ok((layout, projection))
}
