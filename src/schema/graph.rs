//! Column relationship graph.
//!
//! Provides:
//! - Declared and implied constraints between pairs of columns
//! - Symmetric linking into each column's parent/child sets
//! - Relationship counts and orphan detection per table

use super::{ColumnRef, Schema, TableId};

/// Display name shared by all implied constraints
pub const IMPLIED_CONSTRAINT_NAME: &str = "Implied Constraint";

/// Unique identifier for a constraint within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub u32);

/// A parent → child relationship between two columns.
///
/// At most one constraint exists for any ordered column pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Declared constraint name (implied constraints have none)
    pub name: Option<String>,
    /// Referenced column
    pub parent: ColumnRef,
    /// Referencing column
    pub child: ColumnRef,
    /// Inferred from naming conventions rather than declared
    pub implied: bool,
}

impl Constraint {
    /// A declared foreign key between two columns
    pub fn declared(parent: ColumnRef, child: ColumnRef, name: Option<String>) -> Self {
        Self {
            name,
            parent,
            child,
            implied: false,
        }
    }

    /// An inferred relationship
    pub fn implied(parent: ColumnRef, child: ColumnRef) -> Self {
        Self {
            name: None,
            parent,
            child,
            implied: true,
        }
    }

    /// Name shown to users
    pub fn display_name(&self) -> Option<&str> {
        if self.implied {
            Some(IMPLIED_CONSTRAINT_NAME)
        } else {
            self.name.as_deref()
        }
    }
}

impl Schema {
    /// Add a constraint and link it into both columns.
    ///
    /// If a constraint already exists for the same ordered pair the existing
    /// one is kept and its ID returned.
    pub fn add_constraint(&mut self, constraint: Constraint) -> ConstraintId {
        let key = (constraint.parent, constraint.child);
        if let Some(&existing) = self.constraint_index.get(&key) {
            return existing;
        }

        let id = ConstraintId(self.constraints.len() as u32);
        let (parent, child) = key;

        let parent_col = self.column_mut(parent);
        if !parent_col.children.contains(&child) {
            parent_col.children.push(child);
        }
        let child_col = self.column_mut(child);
        if !child_col.parents.contains(&parent) {
            child_col.parents.push(parent);
        }

        self.constraint_index.insert(key, id);
        self.constraints.push(constraint);
        id
    }

    /// Link a batch of constraints (typically the output of implied key discovery)
    pub fn link_constraints(
        &mut self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Vec<ConstraintId> {
        constraints
            .into_iter()
            .map(|c| self.add_constraint(c))
            .collect()
    }

    /// Get constraint by ID
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.0 as usize)
    }

    /// The constraint running from `parent` to `child`, if any
    pub fn constraint_between(&self, parent: ColumnRef, child: ColumnRef) -> Option<&Constraint> {
        self.constraint_id_between(parent, child)
            .and_then(|id| self.constraint(id))
    }

    pub fn constraint_id_between(&self, parent: ColumnRef, child: ColumnRef) -> Option<ConstraintId> {
        self.constraint_index.get(&(parent, child)).copied()
    }

    /// Whether the parent → child relationship was inferred
    pub fn is_implied(&self, parent: ColumnRef, child: ColumnRef) -> bool {
        self.constraint_between(parent, child)
            .map(|c| c.implied)
            .unwrap_or(false)
    }

    /// Number of column-level parent links of a table
    pub fn num_parents(&self, table: TableId, include_implied: bool) -> usize {
        self.table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .map(|c| {
                        let child = ColumnRef::new(table, c.ordinal);
                        c.parents
                            .iter()
                            .filter(|&&p| include_implied || !self.is_implied(p, child))
                            .count()
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Number of column-level child links of a table
    pub fn num_children(&self, table: TableId, include_implied: bool) -> usize {
        self.table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .map(|c| {
                        let parent = ColumnRef::new(table, c.ordinal);
                        c.children
                            .iter()
                            .filter(|&&ch| include_implied || !self.is_implied(parent, ch))
                            .count()
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    /// A table is an orphan when it has no relationships of the considered kind
    pub fn is_orphan(&self, table: TableId, with_implied: bool) -> bool {
        self.num_parents(table, with_implied) == 0 && self.num_children(table, with_implied) == 0
    }

    /// Human readable description of a constraint
    pub fn describe_constraint(&self, constraint: &Constraint) -> String {
        let child = self.column_label(constraint.child);
        let parent = self.column_label(constraint.parent);
        if constraint.implied {
            format!(
                "{}'s name implies that it's a child of {}, but it doesn't reference that column.",
                child, parent
            )
        } else {
            match &constraint.name {
                Some(name) => format!("{} references {} via {}", child, parent, name),
                None => format!("{} references {}", child, parent),
            }
        }
    }
}
