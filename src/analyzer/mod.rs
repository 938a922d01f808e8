//! Relationship analysis over a loaded schema.
//!
//! Two kinds of undeclared relationships are discovered:
//! - implied foreign keys: columns that look like references to another
//!   table's primary key by name and type
//! - Rails conventions: `<singular>_id` columns referencing `<plural>.id`

mod implied;
mod inflection;
mod rails;

pub use implied::{find_implied_constraints, ColumnIdentityKey, LANGUAGE_ID};
pub use inflection::pluralize;
pub use rails::{find_rails_constraints, RAILS_CONSTRAINT_NAME};
