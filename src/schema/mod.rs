//! Schema graph model for relationship diagrams.
//!
//! This module provides:
//! - Data models for tables, columns and relationship constraints
//! - Symmetric parent/child linking between columns
//! - Loading a schema document (JSON or YAML) into the model

mod graph;
mod loader;

pub use graph::*;
pub use loader::*;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a column within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u16);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnId({})", self.0)
    }
}

/// Address of a column anywhere in the schema.
///
/// This is the non-owning back reference from a column to its table: two
/// `ColumnRef`s are equal exactly when they name the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    pub table: TableId,
    pub column: ColumnId,
}

impl ColumnRef {
    pub fn new(table: TableId, column: ColumnId) -> Self {
        Self { table, column }
    }
}

/// What kind of relation a table entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Regular base table
    #[default]
    Table,
    /// View
    View,
    /// Logical table that lives in another schema container
    Remote,
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    /// JDBC-style type code, when the source knows it
    pub type_code: Option<i32>,
    /// Database type name (e.g. `int4`, `VARCHAR`)
    pub type_name: String,
    /// Declared length or precision
    pub length: i32,
    /// Declared scale
    pub decimal_digits: Option<i32>,
    /// Whether this column allows NULL values
    pub is_nullable: bool,
    /// Whether this column has a unique constraint on its own
    pub is_unique: bool,
    /// Whether this column is part of the primary key
    pub is_primary_key: bool,
    /// Hidden from diagrams unless one of its tables is inspected directly
    pub excluded_from_direct_diagrams: bool,
    /// Hidden from every diagram
    pub excluded_from_all_diagrams: bool,
    /// Never proposed as the child of an implied relationship
    pub implied_parents_disabled: bool,
    /// Never proposed as the parent of an implied relationship
    pub implied_children_disabled: bool,
    /// Columns this column references
    pub parents: Vec<ColumnRef>,
    /// Columns referencing this column
    pub children: Vec<ColumnRef>,
}

impl Column {
    /// Create a nullable, non-key column with no relationships
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, ordinal: ColumnId) -> Self {
        Self {
            name: name.into(),
            ordinal,
            type_code: None,
            type_name: type_name.into(),
            length: 0,
            decimal_digits: None,
            is_nullable: true,
            is_unique: false,
            is_primary_key: false,
            excluded_from_direct_diagrams: false,
            excluded_from_all_diagrams: false,
            implied_parents_disabled: false,
            implied_children_disabled: false,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A column is a foreign key as soon as it references anything
    pub fn is_foreign_key(&self) -> bool {
        !self.parents.is_empty()
    }

    /// Excluded from diagrams that do not inspect one of its tables directly
    pub fn is_excluded(&self) -> bool {
        self.excluded_from_direct_diagrams || self.excluded_from_all_diagrams
    }

    /// Excluded from every diagram
    pub fn is_all_excluded(&self) -> bool {
        self.excluded_from_all_diagrams
    }

    /// Hide the column from all diagrams (and therefore from direct ones too)
    pub fn exclude_from_all_diagrams(&mut self) {
        self.excluded_from_all_diagrams = true;
        self.excluded_from_direct_diagrams = true;
    }

    /// Size suffix shown next to the type, e.g. `10,2`
    pub fn detailed_size(&self) -> String {
        match self.decimal_digits {
            Some(digits) if digits > 0 => format!("{},{}", self.length, digits),
            _ if self.length > 0 => self.length.to_string(),
            _ => String::new(),
        }
    }

    /// Type name without any parenthesised suffix
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .split('(')
            .next()
            .unwrap_or(&self.type_name)
            .trim()
    }
}

/// Complete table definition
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Table ID within the schema
    pub id: TableId,
    /// Owning schema or catalog, if known
    pub container: Option<String>,
    /// Real table, view or remote table
    pub kind: TableKind,
    /// Column definitions in order
    pub columns: Vec<Column>,
    /// Primary key column IDs (ordered for composite PKs)
    pub primary_key: Vec<ColumnId>,
    /// Row count, when the source recorded one
    pub num_rows: Option<u64>,
    /// Free-form comment
    pub comment: Option<String>,
}

impl Table {
    /// Create a new empty table
    pub fn new(name: impl Into<String>, id: TableId) -> Self {
        Self {
            name: name.into(),
            id,
            container: None,
            kind: TableKind::Table,
            columns: Vec::new(),
            primary_key: Vec::new(),
            num_rows: None,
            comment: None,
        }
    }

    /// Name qualified with the container when one is set
    pub fn full_name(&self) -> String {
        match &self.container {
            Some(container) => format!("{}.{}", container, self.name),
            None => self.name.clone(),
        }
    }

    /// Name as shown in diagrams: remote tables carry their container
    pub fn display_name(&self) -> String {
        match (&self.container, self.kind) {
            (Some(container), TableKind::Remote) => format!("{}.{}", container, self.name),
            _ => self.name.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.kind == TableKind::Remote
    }

    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }

    /// Append a column, assigning its ordinal
    pub fn add_column(&mut self, mut column: Column) -> ColumnId {
        let id = ColumnId(self.columns.len() as u16);
        column.ordinal = id;
        self.columns.push(column);
        id
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get column ID by name
    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    /// Get column by ID
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    /// Check if column is part of the primary key
    pub fn is_pk_column(&self, col_id: ColumnId) -> bool {
        self.primary_key.contains(&col_id)
    }

    /// Primary key columns in key order
    pub fn primary_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_key.iter().filter_map(|&id| self.column(id))
    }

    /// Mark the given columns as the primary key
    pub fn set_primary_key(&mut self, columns: Vec<ColumnId>) {
        for column in &mut self.columns {
            column.is_primary_key = columns.contains(&column.ordinal);
        }
        self.primary_key = columns;
    }
}

/// Complete database schema
#[derive(Debug, Default)]
pub struct Schema {
    /// Schema name, used for labels
    pub name: Option<String>,
    /// Map from table full name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Tables indexed by TableId
    pub table_schemas: Vec<Table>,
    /// Relationship constraints indexed by ConstraintId
    pub constraints: Vec<Constraint>,
    constraint_index: AHashMap<(ColumnRef, ColumnRef), ConstraintId>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Get table ID by full name; an exact match wins, otherwise the
    /// earliest table whose name matches ignoring case.
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        if let Some(&id) = self.tables.get(name) {
            return Some(id);
        }
        self.tables
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, &id)| id)
            .min()
    }

    /// Get table by ID
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.table_schemas.get(id.0 as usize)
    }

    /// Get mutable table by ID
    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.table_schemas.get_mut(id.0 as usize)
    }

    /// Get table by name
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a new table, returning its ID
    pub fn add_table(&mut self, mut table: Table) -> TableId {
        let id = TableId(self.table_schemas.len() as u32);
        table.id = id;
        self.tables.insert(table.full_name(), id);
        self.table_schemas.push(table);
        id
    }

    /// Look up a column.
    ///
    /// # Panics
    ///
    /// Panics if the reference was not produced by this schema.
    pub fn column(&self, r: ColumnRef) -> &Column {
        &self.table_schemas[r.table.0 as usize].columns[r.column.0 as usize]
    }

    pub(crate) fn column_mut(&mut self, r: ColumnRef) -> &mut Column {
        &mut self.table_schemas[r.table.0 as usize].columns[r.column.0 as usize]
    }

    /// Resolve a `table.column` pair by name
    pub fn column_ref(&self, table: &str, column: &str) -> Option<ColumnRef> {
        let table_id = self.get_table_id(table)?;
        let column_id = self.table(table_id)?.get_column_id(column)?;
        Some(ColumnRef::new(table_id, column_id))
    }

    /// `table.column` label for messages
    pub fn column_label(&self, r: ColumnRef) -> String {
        format!(
            "{}.{}",
            self.table_schemas[r.table.0 as usize].display_name(),
            self.column(r).name
        )
    }

    /// Every column of every table, in table then column order
    pub fn column_refs(&self) -> impl Iterator<Item = ColumnRef> + '_ {
        self.table_schemas.iter().flat_map(|t| {
            t.columns
                .iter()
                .map(move |c| ColumnRef::new(t.id, c.ordinal))
        })
    }

    /// Order tables by full name, ignoring case
    pub fn compare_tables(&self, a: TableId, b: TableId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        match (self.table(a), self.table(b)) {
            (Some(ta), Some(tb)) => cmp_ignore_case(&ta.full_name(), &tb.full_name()),
            _ => a.cmp(&b),
        }
    }

    /// Order columns by owning table, then by name ignoring case
    pub fn compare_columns(&self, a: ColumnRef, b: ColumnRef) -> Ordering {
        self.compare_tables(a.table, b.table)
            .then_with(|| cmp_ignore_case(&self.column(a).name, &self.column(b).name))
    }

    /// Get the number of tables
    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    /// Iterate over all tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.table_schemas.iter()
    }

    /// Tables that live in another container
    pub fn remote_tables(&self) -> impl Iterator<Item = &Table> {
        self.table_schemas.iter().filter(|t| t.is_remote())
    }

    /// Tables and views owned by this schema
    pub fn local_tables(&self) -> impl Iterator<Item = &Table> {
        self.table_schemas.iter().filter(|t| !t.is_remote())
    }
}

/// Compare two strings ignoring case
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_includes_container() {
        let mut table = Table::new("orders", TableId(0));
        assert_eq!(table.full_name(), "orders");
        table.container = Some("sales".to_string());
        assert_eq!(table.full_name(), "sales.orders");
        assert_eq!(table.display_name(), "orders");
        table.kind = TableKind::Remote;
        assert_eq!(table.display_name(), "sales.orders");
    }

    #[test]
    fn test_exclude_from_all_implies_direct() {
        let mut column = Column::new("audit_id", "int", ColumnId(0));
        assert!(!column.is_excluded());
        column.exclude_from_all_diagrams();
        assert!(column.is_excluded());
        assert!(column.is_all_excluded());
    }

    #[test]
    fn test_detailed_size() {
        let mut column = Column::new("price", "decimal(10,2)", ColumnId(0));
        column.length = 10;
        column.decimal_digits = Some(2);
        assert_eq!(column.detailed_size(), "10,2");
        assert_eq!(column.short_type_name(), "decimal");
        column.decimal_digits = None;
        assert_eq!(column.detailed_size(), "10");
    }

    #[test]
    fn test_compare_tables_ignores_case() {
        let mut schema = Schema::new();
        let a = schema.add_table(Table::new("Beta", TableId(0)));
        let b = schema.add_table(Table::new("alpha", TableId(0)));
        assert_eq!(schema.compare_tables(a, b), Ordering::Greater);
        assert_eq!(schema.get_table_id("ALPHA"), Some(b));
    }

    #[test]
    fn test_case_insensitive_lookup_prefers_earliest_table() {
        let mut schema = Schema::new();
        let first = schema.add_table(Table::new("Orders", TableId(0)));
        let second = schema.add_table(Table::new("ORDERS", TableId(0)));
        for _ in 0..16 {
            assert_eq!(schema.get_table_id("orders"), Some(first));
        }
        assert_eq!(schema.get_table_id("ORDERS"), Some(second));
    }
}
