//! Schema document loading.
//!
//! Introspection happens elsewhere; it hands over a JSON or YAML document
//! describing tables, columns, primary keys and declared foreign keys. This
//! module turns that document into a linked [`Schema`].

use super::{Column, ColumnId, ColumnRef, Constraint, Schema, Table, TableId, TableKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a schema document
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read schema document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML schema document: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("table '{0}' is defined more than once")]
    DuplicateTable(String),

    #[error("tables '{first}' and '{second}' would share the diagram file name '{name}'")]
    SharedTableName {
        name: String,
        first: String,
        second: String,
    },

    #[error("table '{table}' has no column '{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("foreign key on '{table}' references unknown table '{referenced}'")]
    UnknownTable { table: String, referenced: String },

    #[error("foreign key on '{table}' maps {child} column(s) onto {parent} referenced column(s)")]
    ColumnCountMismatch {
        table: String,
        child: usize,
        parent: usize,
    },
}

/// Column as described by the schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub type_code: Option<i32>,
    #[serde(default)]
    pub length: i32,
    #[serde(default)]
    pub decimal_digits: Option<i32>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
}

/// Declared foreign key as described by the schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub references_table: String,
    /// Container of the referenced table when it lives elsewhere
    #[serde(default)]
    pub references_container: Option<String>,
    #[serde(default)]
    pub references_columns: Vec<String>,
}

/// Table as described by the schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDocument {
    pub name: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub kind: TableKind,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDocument>,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Root of a schema document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableDocument>,
}

fn default_true() -> bool {
    true
}

impl SchemaDocument {
    /// Parse a JSON document
    pub fn from_json(text: &str) -> Result<Self, SchemaLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a YAML document
    pub fn from_yaml(text: &str) -> Result<Self, SchemaLoadError> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Build the schema graph: tables first, then keys, then declared
    /// foreign keys linked symmetrically.
    pub fn into_schema(self) -> Result<Schema, SchemaLoadError> {
        let mut schema = Schema::new();
        schema.name = self.name;

        for doc in &self.tables {
            let mut table = Table::new(doc.name.clone(), TableId(0));
            table.container = doc.container.clone();
            table.kind = doc.kind;
            table.num_rows = doc.rows;
            table.comment = doc.comment.clone();

            if schema.get_table_id(&table.full_name()).is_some() {
                return Err(SchemaLoadError::DuplicateTable(table.full_name()));
            }
            if let Some(other) = schema
                .table_schemas
                .iter()
                .find(|t| !t.is_remote() && t.name.eq_ignore_ascii_case(&table.name))
            {
                return Err(SchemaLoadError::SharedTableName {
                    name: table.name.clone(),
                    first: other.full_name(),
                    second: table.full_name(),
                });
            }

            for col in &doc.columns {
                let mut column = Column::new(col.name.clone(), col.type_name.clone(), ColumnId(0));
                column.type_code = col.type_code;
                column.length = col.length;
                column.decimal_digits = col.decimal_digits;
                column.is_nullable = col.nullable;
                column.is_unique = col.unique;
                table.add_column(column);
            }

            let mut pk = Vec::with_capacity(doc.primary_key.len());
            for name in &doc.primary_key {
                let id = table
                    .get_column_id(name)
                    .ok_or_else(|| SchemaLoadError::UnknownColumn {
                        table: doc.name.clone(),
                        column: name.clone(),
                    })?;
                pk.push(id);
            }
            table.set_primary_key(pk);

            schema.add_table(table);
        }

        for (index, doc) in self.tables.iter().enumerate() {
            let child_table = TableId(index as u32);
            for fk in &doc.foreign_keys {
                link_foreign_key(&mut schema, child_table, doc, fk)?;
            }
        }

        Ok(schema)
    }
}

fn link_foreign_key(
    schema: &mut Schema,
    child_table: TableId,
    doc: &TableDocument,
    fk: &ForeignKeyDocument,
) -> Result<(), SchemaLoadError> {
    let referenced_columns = if fk.references_columns.is_empty() {
        fk.columns.clone()
    } else {
        fk.references_columns.clone()
    };
    if referenced_columns.len() != fk.columns.len() {
        return Err(SchemaLoadError::ColumnCountMismatch {
            table: doc.name.clone(),
            child: fk.columns.len(),
            parent: referenced_columns.len(),
        });
    }

    let child_refs = fk
        .columns
        .iter()
        .map(|name| resolve_column(schema, child_table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let parent_table = match &fk.references_container {
        Some(container) => {
            let full_name = format!("{}.{}", container, fk.references_table);
            match schema.get_table_id(&full_name) {
                Some(id) => {
                    extend_remote_table(schema, id, &referenced_columns, &child_refs);
                    id
                }
                None => add_remote_table(schema, container, fk, &referenced_columns, &child_refs),
            }
        }
        None => schema
            .get_table_id(&fk.references_table)
            .ok_or_else(|| SchemaLoadError::UnknownTable {
                table: doc.name.clone(),
                referenced: fk.references_table.clone(),
            })?,
    };

    for (child, parent_name) in child_refs.into_iter().zip(&referenced_columns) {
        let parent = resolve_column(schema, parent_table, parent_name)?;
        schema.add_constraint(Constraint::declared(parent, child, fk.name.clone()));
    }
    Ok(())
}

fn resolve_column(schema: &Schema, table: TableId, name: &str) -> Result<ColumnRef, SchemaLoadError> {
    schema
        .table(table)
        .and_then(|t| t.get_column_id(name))
        .map(|column| ColumnRef::new(table, column))
        .ok_or_else(|| SchemaLoadError::UnknownColumn {
            table: schema
                .table(table)
                .map(|t| t.full_name())
                .unwrap_or_default(),
            column: name.to_string(),
        })
}

/// Create a placeholder for a table owned by another container; its
/// columns borrow their types from the referencing columns.
fn add_remote_table(
    schema: &mut Schema,
    container: &str,
    fk: &ForeignKeyDocument,
    referenced_columns: &[String],
    child_refs: &[ColumnRef],
) -> TableId {
    let mut table = Table::new(fk.references_table.clone(), TableId(0));
    table.container = Some(container.to_string());
    table.kind = TableKind::Remote;
    log::debug!(
        "created remote table {}.{} for foreign key reference",
        container,
        fk.references_table
    );
    let id = schema.add_table(table);
    extend_remote_table(schema, id, referenced_columns, child_refs);
    id
}

/// Add referenced columns a remote placeholder does not have yet. Tables
/// described by the document are left alone.
fn extend_remote_table(
    schema: &mut Schema,
    table: TableId,
    referenced_columns: &[String],
    child_refs: &[ColumnRef],
) {
    for (name, &child) in referenced_columns.iter().zip(child_refs) {
        let source = schema.column(child);
        let mut column = Column::new(name.clone(), source.type_name.clone(), ColumnId(0));
        column.type_code = source.type_code;
        column.length = source.length;

        let Some(remote) = schema.table_mut(table).filter(|t| t.is_remote()) else {
            return;
        };
        if remote.get_column(name).is_none() {
            remote.add_column(column);
        }
    }
}

/// Load a schema document from disk; `.yaml`/`.yml` files are parsed as
/// YAML, everything else as JSON.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaLoadError> {
    let text = fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "yaml" | "yml"))
        .unwrap_or(false);

    let document = if is_yaml {
        SchemaDocument::from_yaml(&text)?
    } else {
        SchemaDocument::from_json(&text)?
    };
    document.into_schema()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "name": "shop",
        "tables": [
            {"name": "customers", "columns": [{"name": "id", "type": "int", "length": 4, "nullable": false}],
             "primary_key": ["id"]},
            {"name": "orders", "columns": [
                {"name": "id", "type": "int", "length": 4},
                {"name": "customer_id", "type": "int", "length": 4},
                {"name": "warehouse_id", "type": "int", "length": 4}],
             "primary_key": ["id"],
             "foreign_keys": [
                {"name": "fk_customer", "columns": ["customer_id"], "references_table": "customers", "references_columns": ["id"]},
                {"columns": ["warehouse_id"], "references_table": "warehouses", "references_container": "stock", "references_columns": ["id"]}
             ]}
        ]
    }"#;

    #[test]
    fn test_declared_keys_are_linked() {
        let schema = SchemaDocument::from_json(DOC).unwrap().into_schema().unwrap();
        let parent = schema.column_ref("customers", "id").unwrap();
        let child = schema.column_ref("orders", "customer_id").unwrap();

        let constraint = schema.constraint_between(parent, child).unwrap();
        assert_eq!(constraint.name.as_deref(), Some("fk_customer"));
        assert!(!constraint.implied);
        assert!(schema.column(parent).is_primary_key);
        assert!(!schema.column(parent).is_nullable);
    }

    #[test]
    fn test_remote_reference_creates_remote_table() {
        let schema = SchemaDocument::from_json(DOC).unwrap().into_schema().unwrap();
        let remote = schema.get_table("stock.warehouses").unwrap();
        assert!(remote.is_remote());
        assert_eq!(remote.columns[0].name, "id");
        assert_eq!(schema.remote_tables().count(), 1);
    }

    #[test]
    fn test_remote_table_collects_columns_from_every_reference() {
        let doc = r#"{"tables": [
            {"name": "orders", "columns": [{"name": "warehouse_id", "type": "int", "length": 4}],
             "foreign_keys": [{"columns": ["warehouse_id"], "references_table": "warehouses",
                               "references_container": "stock", "references_columns": ["id"]}]},
            {"name": "shipments", "columns": [
                {"name": "warehouse_code", "type": "char", "length": 6},
                {"name": "origin_id", "type": "int", "length": 4}],
             "foreign_keys": [
                {"columns": ["warehouse_code"], "references_table": "warehouses",
                 "references_container": "stock", "references_columns": ["code"]},
                {"columns": ["origin_id"], "references_table": "warehouses",
                 "references_container": "stock", "references_columns": ["id"]}]}
        ]}"#;
        let schema = SchemaDocument::from_json(doc).unwrap().into_schema().unwrap();

        let remote = schema.get_table("stock.warehouses").unwrap();
        let names: Vec<&str> = remote.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "code"]);
        assert_eq!(remote.columns[1].type_name, "char");
        assert_eq!(remote.columns[1].length, 6);

        let id = schema.column_ref("stock.warehouses", "id").unwrap();
        assert_eq!(schema.column(id).children.len(), 2);
        let code = schema.column_ref("stock.warehouses", "code").unwrap();
        let child = schema.column_ref("shipments", "warehouse_code").unwrap();
        assert!(schema.constraint_between(code, child).is_some());
    }

    #[test]
    fn test_described_table_is_not_extended() {
        let doc = r#"{"tables": [
            {"name": "warehouses", "container": "stock",
             "columns": [{"name": "id", "type": "int"}], "primary_key": ["id"]},
            {"name": "orders", "columns": [{"name": "warehouse_code", "type": "char"}],
             "foreign_keys": [{"columns": ["warehouse_code"], "references_table": "warehouses",
                               "references_container": "stock", "references_columns": ["code"]}]}
        ]}"#;
        let err = SchemaDocument::from_json(doc).unwrap().into_schema().unwrap_err();
        assert!(matches!(err, SchemaLoadError::UnknownColumn { ref column, .. } if column == "code"));
    }

    #[test]
    fn test_duplicates_differing_by_case_are_rejected() {
        let doc = r#"{"tables": [{"name": "Orders"}, {"name": "orders"}]}"#;
        let err = SchemaDocument::from_json(doc).unwrap().into_schema().unwrap_err();
        assert!(matches!(err, SchemaLoadError::DuplicateTable(ref name) if name == "orders"));
    }

    #[test]
    fn test_same_name_in_two_containers_is_rejected() {
        let doc = r#"{"tables": [
            {"name": "orders", "container": "sales"},
            {"name": "orders", "container": "archive"}
        ]}"#;
        let err = SchemaDocument::from_json(doc).unwrap().into_schema().unwrap_err();
        match err {
            SchemaLoadError::SharedTableName { name, first, second } => {
                assert_eq!(name, "orders");
                assert_eq!(first, "sales.orders");
                assert_eq!(second, "archive.orders");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_table_is_rejected() {
        let doc = r#"{"tables": [{"name": "a", "columns": [{"name": "b_id", "type": "int"}],
            "foreign_keys": [{"columns": ["b_id"], "references_table": "b", "references_columns": ["id"]}]}]}"#;
        let err = SchemaDocument::from_json(doc).unwrap().into_schema().unwrap_err();
        assert!(matches!(err, SchemaLoadError::UnknownTable { .. }));
    }

    #[test]
    fn test_yaml_document() {
        let yaml = "tables:\n  - name: users\n    columns:\n      - name: id\n        type: bigint\n    primary_key: [id]\n";
        let schema = SchemaDocument::from_yaml(yaml).unwrap().into_schema().unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get_table("users").unwrap().primary_key, vec![ColumnId(0)]);
    }
}
