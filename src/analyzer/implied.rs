//! Implied foreign key discovery.

use crate::schema::{cmp_ignore_case, Column, ColumnRef, Constraint, Schema, TableId};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Column name that never becomes an implied child and keeps composite
/// primary keys eligible as implied parents.
pub const LANGUAGE_ID: &str = "LanguageId";

/// Name and type signature of a column, used to match orphans against
/// primary keys.
#[derive(Debug, Clone)]
pub struct ColumnIdentityKey {
    pub full_name: String,
    pub name: String,
    pub type_code: Option<i32>,
    pub type_name: String,
    pub length: i32,
}

impl ColumnIdentityKey {
    pub fn of(schema: &Schema, column: ColumnRef) -> Self {
        let col = schema.column(column);
        let table_name = schema
            .table(column.table)
            .map(|t| t.full_name())
            .unwrap_or_default();
        Self {
            full_name: format!("{}.{}", table_name, col.name),
            name: col.name.clone(),
            type_code: col.type_code,
            type_name: col.type_name.clone(),
            length: col.length,
        }
    }

    /// Type codes are exact while type names may carry decorations, so a
    /// code match wins when both sides have one. Lengths must agree.
    pub fn type_matches(&self, other: &Self) -> bool {
        let same_code = matches!((self.type_code, other.type_code), (Some(a), Some(b)) if a == b);
        let same_name = self.type_name.eq_ignore_ascii_case(&other.type_name);
        (same_code || same_name) && self.length == other.length
    }
}

impl Ord for ColumnIdentityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.full_name, &other.full_name)
            .then_with(|| match (self.type_code, other.type_code) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => cmp_ignore_case(&self.type_name, &other.type_name),
            })
            .then_with(|| self.length.cmp(&other.length))
    }
}

impl PartialOrd for ColumnIdentityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ColumnIdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ColumnIdentityKey {}

/// Primary key eligible to be an implied parent
struct KeyedTable {
    table: TableId,
    column: ColumnRef,
    /// `<anything>_<pk>`
    suffix_re: Regex,
    /// `<table><anything><pk>`
    table_re: Regex,
}

impl KeyedTable {
    fn new(table: TableId, table_name: &str, column: ColumnRef, pk_name: &str) -> Option<Self> {
        let pk = regex::escape(pk_name);
        let suffix_re = Regex::new(&format!("(?i)^.*_{}$", pk)).ok()?;
        let table_re = Regex::new(&format!("(?i)^{}.*{}$", regex::escape(table_name), pk)).ok()?;
        Some(Self {
            table,
            column,
            suffix_re,
            table_re,
        })
    }

    fn name_matches(&self, orphan: &str, pk_name: &str) -> bool {
        orphan.eq_ignore_ascii_case(pk_name)
            || self.suffix_re.is_match(orphan)
            || self.table_re.is_match(orphan)
    }
}

fn is_orphan_candidate(column: &Column) -> bool {
    !column.is_foreign_key()
        && !column.is_primary_key
        && !column.implied_parents_disabled
        && column.name != LANGUAGE_ID
}

/// Registry of single-column primary keys (plus composite keys containing
/// `LanguageId`). Identical keys overwrite each other, last one wins.
fn primary_key_registry(schema: &Schema) -> BTreeMap<ColumnIdentityKey, KeyedTable> {
    let mut registry = BTreeMap::new();

    for table in schema.local_tables() {
        let eligible = table.primary_key.len() == 1
            || table.primary_columns().any(|c| c.name == LANGUAGE_ID);
        if !eligible {
            continue;
        }
        let Some(&first) = table.primary_key.first() else {
            continue;
        };
        let column = ColumnRef::new(table.id, first);
        let pk = schema.column(column);
        if pk.implied_children_disabled {
            continue;
        }
        let key = ColumnIdentityKey::of(schema, column);
        if let Some(keyed) = KeyedTable::new(table.id, &table.name, column, &key.name) {
            registry.insert(key, keyed);
        }
    }

    registry
}

/// The single table whose primary key the orphan appears to reference.
/// More than one candidate means the orphan is ambiguous.
fn find_parent<'a>(
    orphan: &ColumnIdentityKey,
    registry: &'a BTreeMap<ColumnIdentityKey, KeyedTable>,
) -> Option<&'a KeyedTable> {
    let mut found: Option<&KeyedTable> = None;
    for (key, keyed) in registry {
        if keyed.name_matches(&orphan.name, &key.name) && orphan.type_matches(key) {
            if found.is_some() {
                return None;
            }
            found = Some(keyed);
        }
    }
    found
}

/// Find relationships implied by column naming and typing conventions.
///
/// Returns new, unlinked implied constraints in a deterministic order:
/// by child table, then child column name. Linking them is up to the caller
/// (see [`Schema::link_constraints`]).
pub fn find_implied_constraints(schema: &Schema) -> Vec<Constraint> {
    let mut orphans: Vec<ColumnRef> = schema
        .local_tables()
        .flat_map(|t| {
            t.columns
                .iter()
                .filter(|c| is_orphan_candidate(c))
                .map(move |c| ColumnRef::new(t.id, c.ordinal))
        })
        .collect();
    orphans.sort_by(|&a, &b| schema.compare_columns(a, b));

    let registry = primary_key_registry(schema);
    let mut implied = Vec::new();

    for child in orphans {
        let key = ColumnIdentityKey::of(schema, child);
        let Some(parent) = find_parent(&key, &registry) else {
            continue;
        };
        if parent.table == child.table {
            continue;
        }
        if schema.constraint_between(parent.column, child).is_some()
            || schema.constraint_between(child, parent.column).is_some()
        {
            continue;
        }
        log::debug!(
            "implied relationship {} -> {}",
            schema.column_label(child),
            schema.column_label(parent.column)
        );
        implied.push(Constraint::implied(parent.column, child));
    }

    implied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnId, Table};

    fn column(name: &str, type_name: &str, length: i32) -> Column {
        let mut c = Column::new(name, type_name, ColumnId(0));
        c.type_code = Some(4);
        c.length = length;
        c
    }

    fn add_table(schema: &mut Schema, name: &str, columns: Vec<Column>, pk: &[u16]) -> TableId {
        let mut table = Table::new(name, TableId(0));
        for c in columns {
            table.add_column(c);
        }
        table.set_primary_key(pk.iter().map(|&i| ColumnId(i)).collect());
        schema.add_table(table)
    }

    #[test]
    fn test_type_match_prefers_codes() {
        let mut a = ColumnIdentityKey {
            full_name: "a.x".into(),
            name: "x".into(),
            type_code: Some(4),
            type_name: "int identity".into(),
            length: 10,
        };
        let b = ColumnIdentityKey {
            full_name: "b.x".into(),
            name: "x".into(),
            type_code: Some(4),
            type_name: "int".into(),
            length: 10,
        };
        assert!(a.type_matches(&b));
        a.length = 11;
        assert!(!a.type_matches(&b));
        a.length = 10;
        a.type_code = None;
        assert!(!a.type_matches(&b));
        a.type_name = "INT".into();
        assert!(a.type_matches(&b));
    }

    #[test]
    fn test_table_prefixed_name_matches() {
        let mut schema = Schema::new();
        add_table(&mut schema, "author", vec![column("id", "int", 4)], &[0]);
        let books = add_table(
            &mut schema,
            "books",
            vec![column("id", "int", 4), column("authorid", "int", 4)],
            &[0],
        );

        let implied = find_implied_constraints(&schema);
        assert_eq!(implied.len(), 1);
        assert_eq!(implied[0].child, ColumnRef::new(books, ColumnId(1)));
    }

    #[test]
    fn test_composite_key_with_language_id_is_registered() {
        let mut schema = Schema::new();
        add_table(
            &mut schema,
            "labels",
            vec![column("label_key", "int", 4), column(LANGUAGE_ID, "int", 4)],
            &[0, 1],
        );
        add_table(
            &mut schema,
            "widgets",
            vec![column("id", "int", 4), column("label_key", "int", 4), column(LANGUAGE_ID, "int", 4)],
            &[0],
        );

        let implied = find_implied_constraints(&schema);
        assert_eq!(implied.len(), 1);
        assert_eq!(schema.column(implied[0].child).name, "label_key");
    }

    #[test]
    fn test_language_id_column_is_never_a_child() {
        let mut schema = Schema::new();
        add_table(&mut schema, "language", vec![column("id", "int", 4)], &[0]);
        add_table(
            &mut schema,
            "widgets",
            vec![column("id", "int", 4), column(LANGUAGE_ID, "int", 4)],
            &[0],
        );
        assert!(find_implied_constraints(&schema).is_empty());

        // only the exact spelling is exempt
        let mut schema = Schema::new();
        add_table(&mut schema, "language", vec![column("id", "int", 4)], &[0]);
        add_table(
            &mut schema,
            "widgets",
            vec![column("id", "int", 4), column("languageid", "int", 4)],
            &[0],
        );
        let implied = find_implied_constraints(&schema);
        assert_eq!(implied.len(), 1);
        assert_eq!(schema.column(implied[0].child).name, "languageid");
        assert_eq!(schema.column_label(implied[0].parent), "language.id");
    }

    #[test]
    fn test_composite_key_is_not_registered() {
        let mut schema = Schema::new();
        add_table(
            &mut schema,
            "pairs",
            vec![column("left_id", "int", 4), column("right_id", "int", 4)],
            &[0, 1],
        );
        add_table(
            &mut schema,
            "uses",
            vec![column("id", "int", 4), column("left_id", "int", 4)],
            &[0],
        );

        assert!(find_implied_constraints(&schema).is_empty());
    }

    #[test]
    fn test_disabled_flags_are_honoured() {
        let mut schema = Schema::new();
        let customers = add_table(&mut schema, "customers", vec![column("id", "int", 4)], &[0]);
        let orders = add_table(
            &mut schema,
            "orders",
            vec![column("id", "int", 4), column("customer_id", "int", 4)],
            &[0],
        );

        schema.column_mut(ColumnRef::new(orders, ColumnId(1))).implied_parents_disabled = true;
        assert!(find_implied_constraints(&schema).is_empty());

        schema.column_mut(ColumnRef::new(orders, ColumnId(1))).implied_parents_disabled = false;
        schema.column_mut(ColumnRef::new(customers, ColumnId(0))).implied_children_disabled = true;
        assert!(find_implied_constraints(&schema).is_empty());
    }
}
