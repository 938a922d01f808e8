//! Graph, node and edge attribute block written at the top of every diagram.

use super::{DotSettings, Element};

pub struct DotHeader<'a> {
    settings: &'a DotSettings,
    show_label: bool,
}

impl<'a> DotHeader<'a> {
    pub fn new(settings: &'a DotSettings, show_label: bool) -> Self {
        Self {
            settings,
            show_label,
        }
    }
}

impl Element for DotHeader<'_> {
    fn render(&self) -> String {
        let s = self.settings;
        let mut lines = vec!["  graph [".to_string()];
        if !s.rankdir_bug {
            lines.push("    rankdir=\"RL\"".to_string());
        }
        lines.push(format!("    bgcolor=\"{}\"", s.colors.body_background));
        if self.show_label {
            if s.rankdir_bug {
                lines.push(
                    "    label=\"\\nLayout is significantly better without the rankdir workaround\""
                        .to_string(),
                );
            } else {
                lines.push(format!(
                    "    label=\"\\nGenerated by {}\"",
                    env!("CARGO_PKG_NAME")
                ));
            }
            lines.push("    labeljust=\"l\"".to_string());
        }
        lines.push("    nodesep=\"0.18\"".to_string());
        lines.push("    ranksep=\"0.46\"".to_string());
        lines.push(format!("    fontname=\"{}\"", s.font));
        lines.push(format!("    fontsize=\"{}\"", s.font_size));
        lines.push("    ration=\"compress\"".to_string());
        lines.push("  ];".to_string());
        lines.push("  node [".to_string());
        lines.push(format!("    fontname=\"{}\"", s.font));
        lines.push(format!("    fontsize=\"{}\"", s.font_size));
        lines.push("    shape=\"plaintext\"".to_string());
        lines.push("  ];".to_string());
        lines.push("  edge [".to_string());
        lines.push("    arrowsize=\"0.8\"".to_string());
        lines.push("  ];".to_string());
        lines.join("\n")
    }
}
