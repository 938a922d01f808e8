//! Relationships following Ruby on Rails naming conventions.
//!
//! Rails schemas usually declare no foreign keys. Every table has an `id`
//! primary key and a plural name, and a column named after the singular
//! form plus `_id` references it: `orders.customer_id -> customers.id`.

use super::inflection::pluralize;
use crate::schema::{ColumnRef, Constraint, Schema};

/// Name given to every constraint derived from Rails conventions
pub const RAILS_CONSTRAINT_NAME: &str = "ByRailsConventionConstraint";

/// Find relationships implied by Rails column naming.
///
/// Only columns that reference nothing yet and allow implied parents are
/// considered. The constraints are returned unlinked, ordered by child
/// table then column; they count as real relationships once linked.
pub fn find_rails_constraints(schema: &Schema) -> Vec<Constraint> {
    let mut candidates: Vec<ColumnRef> = schema
        .local_tables()
        .flat_map(|t| {
            t.columns
                .iter()
                .filter(|c| !c.is_foreign_key() && !c.implied_parents_disabled)
                .map(move |c| ColumnRef::new(t.id, c.ordinal))
        })
        .collect();
    candidates.sort_by(|&a, &b| schema.compare_columns(a, b));

    let mut found = Vec::new();
    for child in candidates {
        let name = schema.column(child).name.to_lowercase();
        let Some(singular) = name.strip_suffix("_id") else {
            continue;
        };
        let plural = pluralize(singular);
        let Some(parent_table) = schema
            .local_tables()
            .find(|t| t.name.eq_ignore_ascii_case(&plural))
        else {
            continue;
        };
        let Some(id) = parent_table.get_column_id("id") else {
            continue;
        };
        let parent = ColumnRef::new(parent_table.id, id);

        log::debug!(
            "rails relationship {} -> {}",
            schema.column_label(child),
            schema.column_label(parent)
        );
        found.push(Constraint::declared(
            parent,
            child,
            Some(RAILS_CONSTRAINT_NAME.to_string()),
        ));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::find_implied_constraints;
    use crate::schema::{Column, ColumnId, Table, TableId};

    fn add_table(schema: &mut Schema, name: &str, columns: &[(&str, &str)]) -> TableId {
        let mut table = Table::new(name, TableId(0));
        for (column, type_name) in columns {
            table.add_column(Column::new(*column, *type_name, ColumnId(0)));
        }
        table.set_primary_key(vec![ColumnId(0)]);
        schema.add_table(table)
    }

    fn rails_shop() -> Schema {
        let mut schema = Schema::new();
        add_table(&mut schema, "categories", &[("id", "integer")]);
        add_table(&mut schema, "people", &[("id", "integer")]);
        add_table(
            &mut schema,
            "products",
            &[
                ("id", "integer"),
                ("category_id", "bigint"),
                ("person_id", "integer"),
                ("vendor_id", "integer"),
            ],
        );
        schema
    }

    #[test]
    fn test_singular_id_columns_reference_plural_tables() {
        let schema = rails_shop();
        let found = find_rails_constraints(&schema);

        let pairs: Vec<(String, String)> = found
            .iter()
            .map(|c| (schema.column_label(c.child), schema.column_label(c.parent)))
            .collect();
        assert_eq!(
            pairs,
            [
                ("products.category_id".to_string(), "categories.id".to_string()),
                ("products.person_id".to_string(), "people.id".to_string()),
            ]
        );
        // types are not compared, and the result is a real relationship
        assert!(found.iter().all(|c| !c.implied));
        assert_eq!(found[0].display_name(), Some(RAILS_CONSTRAINT_NAME));
    }

    #[test]
    fn test_linked_columns_are_skipped() {
        let mut schema = rails_shop();
        let found = find_rails_constraints(&schema);
        schema.link_constraints(found);
        assert!(find_rails_constraints(&schema).is_empty());

        let parent = schema.column_ref("categories", "id").unwrap();
        let child = schema.column_ref("products", "category_id").unwrap();
        assert!(!schema.is_implied(parent, child));
        assert!(schema.column(child).is_foreign_key());
    }

    #[test]
    fn test_disabled_columns_are_skipped() {
        let mut schema = rails_shop();
        let products = schema.get_table_id("products").unwrap();
        if let Some(table) = schema.table_mut(products) {
            table.columns[1].implied_parents_disabled = true;
        }

        let found = find_rails_constraints(&schema);
        assert_eq!(found.len(), 1);
        assert_eq!(schema.column(found[0].child).name, "person_id");
    }

    #[test]
    fn test_rails_keys_take_precedence_over_implied_keys() {
        let mut schema = Schema::new();
        add_table(&mut schema, "users", &[("id", "int")]);
        add_table(&mut schema, "posts", &[("slug", "varchar"), ("user_id", "int")]);

        let found = find_rails_constraints(&schema);
        assert_eq!(found.len(), 1);
        schema.link_constraints(found);
        assert!(find_implied_constraints(&schema).is_empty());
    }
}
