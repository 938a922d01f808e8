//! Edge element: a connector between a child column and its parent.

use super::Element;
use crate::graph::edges::Edge;
use crate::schema::Schema;

/// Port attached to the title area of a node drawn without columns
pub const TITLE_PORT: &str = "elipses";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotEdge {
    pub edge: Edge,
    child_node: String,
    parent_node: String,
    child_port: String,
    parent_port: String,
    child_unique: bool,
}

impl DotEdge {
    pub fn new(schema: &Schema, edge: Edge) -> Self {
        let node_name = |r: crate::schema::ColumnRef| {
            schema
                .table(r.table)
                .map(|t| t.display_name())
                .unwrap_or_default()
        };
        let child = schema.column(edge.child);
        let parent = schema.column(edge.parent);
        Self {
            edge,
            child_node: node_name(edge.child),
            parent_node: node_name(edge.parent),
            child_port: child.name.clone(),
            parent_port: parent.name.clone(),
            child_unique: child.is_unique,
        }
    }

    /// Attach the parent end to the type column of a detailed node
    pub fn connect_to_parent_details(&mut self, schema: &Schema) {
        self.parent_port = format!("{}.type", schema.column(self.edge.parent).name);
    }

    pub fn connect_to_parent_title(&mut self) {
        self.parent_port = TITLE_PORT.to_string();
    }

    pub fn connect_to_child_title(&mut self) {
        self.child_port = TITLE_PORT.to_string();
    }

    pub fn parent_port(&self) -> &str {
        &self.parent_port
    }

    pub fn child_port(&self) -> &str {
        &self.child_port
    }
}

impl Element for DotEdge {
    fn render(&self) -> String {
        let arrowtail = if self.child_unique {
            "teeodot"
        } else {
            "crowodot"
        };
        let style = if self.edge.implied { " style=dashed" } else { "" };
        format!(
            "  \"{}\":\"{}\":w -> \"{}\":\"{}\":e [arrowhead=none dir=back arrowtail={}{}];",
            self.child_node, self.child_port, self.parent_node, self.parent_port, arrowtail, style
        )
    }
}
