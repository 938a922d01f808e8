//! Graphviz DOT text emission.
//!
//! Diagrams are assembled from [`Element`]s (header, nodes, edges) and
//! wrapped by [`Digraph`]. Output is byte-stable: identical inputs always
//! produce identical text.

mod edge;
mod header;
mod name;
mod node;

pub use edge::DotEdge;
pub use header::DotHeader;
pub use name::{DiagramName, Degrees};
pub use node::{DotNode, NodeConfig};

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Anything that can write itself into a digraph body
pub trait Element {
    fn render(&self) -> String;
}

impl Element for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl Element for &str {
    fn render(&self) -> String {
        (*self).to_string()
    }
}

/// A named directed graph.
///
/// The name is written as-is between quotes; a name containing `"`
/// produces malformed output.
pub struct Digraph<'a> {
    name: &'a str,
    header: String,
    elements: Vec<String>,
}

impl<'a> Digraph<'a> {
    pub fn new(name: &'a str, header: &dyn Element) -> Self {
        Self {
            name,
            header: header.render(),
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: &dyn Element) {
        self.elements.push(element.render());
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn render(&self) -> String {
        format!(
            "digraph \"{}\" {{\n{}\n{}\n}}",
            self.name,
            self.header,
            self.elements.join("\n")
        )
    }

    /// Degenerate form for a diagram holding one node and no edges
    pub fn single_node(name: &str, header: &dyn Element, node: &dyn Element) -> String {
        format!("digraph \"{}\" {{ {} {} }}", name, header.render(), node.render())
    }
}

/// Colours used inside node labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramColors {
    pub body_background: String,
    pub table_background: String,
    pub table_head_background: String,
    pub indexed_column_background: String,
    pub excluded_column_background: String,
}

impl Default for DiagramColors {
    fn default() -> Self {
        Self {
            body_background: "#ffffff".to_string(),
            table_background: "#ffffff".to_string(),
            table_head_background: "#f2f2f2".to_string(),
            indexed_column_background: "#f7f7f7".to_string(),
            excluded_column_background: "#dedede".to_string(),
        }
    }
}

/// Rendering options shared by every diagram of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotSettings {
    /// Font used for labels
    pub font: String,
    pub font_size: u32,
    /// Drop `rankdir` for Graphviz builds that mis-handle it
    pub rankdir_bug: bool,
    /// Links are relative to the diagram file (embedded SVG)
    pub relative_links: bool,
    /// Show row counts in node footers
    pub row_counts: bool,
    pub colors: DiagramColors,
}

impl Default for DotSettings {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            font_size: 11,
            rankdir_bug: false,
            relative_links: false,
            row_counts: true,
            colors: DiagramColors::default(),
        }
    }
}

/// Escape a string for use inside HTML-like labels and quoted attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Approximate rendered width in points of bold text at the given size.
///
/// Wide (CJK) characters count double.
pub fn text_width(text: &str, font_size: u32) -> u32 {
    let char_width = (font_size + 1) as f64 * 0.62;
    (UnicodeWidthStr::width(text) as f64 * char_width).ceil() as u32
}
