//! Relationship diagram generation.
//!
//! This module provides:
//! - Column filter chains deciding which columns take part in diagrams
//! - Scoped, deduplicated edge sets for one table or a pair of tables
//! - Graphviz DOT emission (header, nodes, edges, digraph wrapper)
//! - Relative links from diagrams to table pages
//! - Neighbourhood, summary and orphan diagram builders

pub mod columns;
pub mod diagram;
pub mod edges;
pub mod format;
pub mod link;

pub use columns::{ColumnChain, ColumnFilter, ColumnSource};
pub use diagram::{orphan_diagram, summary_diagram, table_diagram, DotDiagram};
pub use edges::{compare_edges, edges_for, related_edges, sorted_edges, Edge, Scope};
pub use format::{Degrees, DiagramName, Digraph, DotSettings, Element};
pub use link::{encode_name, table_link, SourceKind};
