//! Column filter chain.
//!
//! Decides which columns take part in diagram edges. A chain starts from a
//! base sequence (a table's columns, or a column's parents or children) and
//! applies filters in order. Filters never reorder.

use crate::schema::{Column, ColumnRef, Schema, TableId};

/// Base sequence of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// All columns of a table, in ordinal order
    Table(TableId),
    /// Columns referenced by a column
    Parents(ColumnRef),
    /// Columns referencing a column
    Children(ColumnRef),
}

/// A single filtering stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Drop columns excluded from every diagram
    AllExcluded,
    /// Drop columns excluded from diagrams that don't inspect them directly
    Excluded,
}

impl ColumnFilter {
    pub fn keeps(self, column: &Column) -> bool {
        match self {
            ColumnFilter::AllExcluded => !column.is_all_excluded(),
            ColumnFilter::Excluded => !column.is_excluded(),
        }
    }
}

/// An ordered list of filters applied to any base sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnChain {
    filters: Vec<ColumnFilter>,
}

impl ColumnChain {
    /// A chain that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter stage
    pub fn then(mut self, filter: ColumnFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Chain used to find diagram participants.
    ///
    /// Fully excluded columns are always dropped; directly excluded ones
    /// only when `include_excluded` is false.
    pub fn for_diagram(include_excluded: bool) -> Self {
        let chain = Self::new().then(ColumnFilter::AllExcluded);
        if include_excluded {
            chain
        } else {
            chain.then(ColumnFilter::Excluded)
        }
    }

    pub fn filters(&self) -> &[ColumnFilter] {
        &self.filters
    }

    fn keeps(&self, column: &Column) -> bool {
        self.filters.iter().all(|f| f.keeps(column))
    }

    /// Run the chain over a base sequence
    pub fn columns(&self, schema: &Schema, source: ColumnSource) -> Vec<ColumnRef> {
        let base: Vec<ColumnRef> = match source {
            ColumnSource::Table(id) => schema
                .table(id)
                .map(|t| {
                    t.columns
                        .iter()
                        .map(|c| ColumnRef::new(id, c.ordinal))
                        .collect()
                })
                .unwrap_or_default(),
            ColumnSource::Parents(r) => schema.column(r).parents.clone(),
            ColumnSource::Children(r) => schema.column(r).children.clone(),
        };
        base.into_iter()
            .filter(|&r| self.keeps(schema.column(r)))
            .collect()
    }

    pub fn table_columns(&self, schema: &Schema, table: TableId) -> Vec<ColumnRef> {
        self.columns(schema, ColumnSource::Table(table))
    }

    pub fn parents(&self, schema: &Schema, column: ColumnRef) -> Vec<ColumnRef> {
        self.columns(schema, ColumnSource::Parents(column))
    }

    pub fn children(&self, schema: &Schema, column: ColumnRef) -> Vec<ColumnRef> {
        self.columns(schema, ColumnSource::Children(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnId, Table};

    fn schema() -> (Schema, TableId) {
        let mut schema = Schema::new();
        let mut table = Table::new("events", TableId(0));
        table.add_column(Column::new("id", "int", ColumnId(0)));
        let mut audit = Column::new("audit_id", "int", ColumnId(0));
        audit.exclude_from_all_diagrams();
        table.add_column(audit);
        let mut created_by = Column::new("created_by", "int", ColumnId(0));
        created_by.excluded_from_direct_diagrams = true;
        table.add_column(created_by);
        table.add_column(Column::new("name", "text", ColumnId(0)));
        let id = schema.add_table(table);
        (schema, id)
    }

    fn names(schema: &Schema, refs: &[ColumnRef]) -> Vec<String> {
        refs.iter().map(|&r| schema.column(r).name.clone()).collect()
    }

    #[test]
    fn test_chain_preserves_order() {
        let (schema, id) = schema();
        let all = ColumnChain::new().table_columns(&schema, id);
        assert_eq!(names(&schema, &all), ["id", "audit_id", "created_by", "name"]);
    }

    #[test]
    fn test_all_excluded_only() {
        let (schema, id) = schema();
        let cols = ColumnChain::for_diagram(true).table_columns(&schema, id);
        assert_eq!(names(&schema, &cols), ["id", "created_by", "name"]);
    }

    #[test]
    fn test_direct_exclusions_dropped() {
        let (schema, id) = schema();
        let cols = ColumnChain::for_diagram(false).table_columns(&schema, id);
        assert_eq!(names(&schema, &cols), ["id", "name"]);
        assert_eq!(
            ColumnChain::for_diagram(false).filters(),
            [ColumnFilter::AllExcluded, ColumnFilter::Excluded]
        );
    }
}
