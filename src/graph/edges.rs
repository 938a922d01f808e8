//! Edge set construction for diagram scopes.

use crate::schema::{cmp_ignore_case, ColumnRef, Schema, TableId};
use ahash::AHashSet;
use std::cmp::Ordering;

/// A parent → child relationship to draw.
///
/// Equality covers the implied flag too, but a scope only ever produces
/// one flag state per column pair: the constraint's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent: ColumnRef,
    pub child: ColumnRef,
    pub implied: bool,
}

impl Edge {
    pub fn new(parent: ColumnRef, child: ColumnRef, implied: bool) -> Self {
        Self {
            parent,
            child,
            implied,
        }
    }

    pub fn parent_table(&self) -> TableId {
        self.parent.table
    }

    pub fn child_table(&self) -> TableId {
        self.child.table
    }

    /// Whether the edge ends at the given table's key
    pub fn points_to(&self, table: TableId) -> bool {
        self.parent.table == table
    }
}

/// Breadth of an edge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every edge touching one table
    Single(TableId),
    /// Edges running between two tables
    Pair(TableId, TableId),
}

/// Compute the deduplicated edges for a scope.
///
/// `Single` never reveals columns excluded from all diagrams, whatever
/// `include_excluded` says.
pub fn edges_for(
    schema: &Schema,
    scope: Scope,
    include_excluded: bool,
    include_implied: bool,
) -> AHashSet<Edge> {
    let mut edges = AHashSet::new();
    match scope {
        Scope::Single(table) => {
            for column in table_columns(schema, table) {
                related_edges(schema, column, None, false, include_implied, &mut edges);
            }
        }
        Scope::Pair(a, b) => {
            for column in table_columns(schema, a) {
                related_edges(schema, column, Some(b), include_excluded, include_implied, &mut edges);
            }
            for column in table_columns(schema, b) {
                related_edges(schema, column, Some(a), include_excluded, include_implied, &mut edges);
            }
        }
    }
    edges
}

fn table_columns(schema: &Schema, table: TableId) -> Vec<ColumnRef> {
    schema
        .table(table)
        .map(|t| {
            t.columns
                .iter()
                .map(|c| ColumnRef::new(table, c.ordinal))
                .collect()
        })
        .unwrap_or_default()
}

/// Collect the edges of one column into `out`, optionally restricted to
/// relationships with `target`.
pub fn related_edges(
    schema: &Schema,
    column: ColumnRef,
    target: Option<TableId>,
    include_excluded: bool,
    include_implied: bool,
    out: &mut AHashSet<Edge>,
) {
    let col = schema.column(column);
    if target.is_none() && !include_excluded && col.is_all_excluded() {
        return;
    }

    let keep = |other: ColumnRef| match target {
        Some(t) => other.table == t,
        None => include_excluded || !schema.column(other).is_all_excluded(),
    };

    for &parent in &col.parents {
        if !keep(parent) {
            continue;
        }
        let implied = schema.is_implied(parent, column);
        if !implied || include_implied {
            out.insert(Edge::new(parent, column, implied));
        }
    }

    for &child in &col.children {
        if !keep(child) {
            continue;
        }
        let implied = schema.is_implied(column, child);
        if !implied || include_implied {
            out.insert(Edge::new(column, child, implied));
        }
    }
}

/// Rendering order: child table, child column, parent table, parent
/// column (names ignoring case), real before implied.
pub fn compare_edges(schema: &Schema, a: &Edge, b: &Edge) -> Ordering {
    schema
        .compare_tables(a.child.table, b.child.table)
        .then_with(|| cmp_ignore_case(&schema.column(a.child).name, &schema.column(b.child).name))
        .then_with(|| schema.compare_tables(a.parent.table, b.parent.table))
        .then_with(|| cmp_ignore_case(&schema.column(a.parent).name, &schema.column(b.parent).name))
        .then_with(|| a.implied.cmp(&b.implied))
        .then_with(|| (a.child, a.parent).cmp(&(b.child, b.parent)))
}

/// Edges in rendering order
pub fn sorted_edges(schema: &Schema, edges: impl IntoIterator<Item = Edge>) -> Vec<Edge> {
    let mut sorted: Vec<Edge> = edges.into_iter().collect();
    sorted.sort_by(|a, b| compare_edges(schema, a, b));
    sorted
}
