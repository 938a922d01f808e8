//! Node element: a table drawn as an HTML-like label.

use super::{escape_html, text_width, DotSettings, Element};
use crate::schema::{Column, Schema, Table, TableId};

const INDENT_6: &str = "      ";

/// What a node shows besides its title and footer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeConfig {
    pub show_columns: bool,
    /// Show columns that are neither keys nor unique
    pub show_trivial: bool,
    /// Add a type/size column and always print counts
    pub show_details: bool,
}

impl NodeConfig {
    /// Table name and counts only
    pub fn title_only() -> Self {
        Self::default()
    }

    pub fn columns(show_trivial: bool, show_details: bool) -> Self {
        Self {
            show_columns: true,
            show_trivial,
            show_details,
        }
    }
}

pub struct DotNode<'a> {
    schema: &'a Schema,
    settings: &'a DotSettings,
    table: TableId,
    link: String,
    config: NodeConfig,
    show_implied: bool,
}

impl<'a> DotNode<'a> {
    pub fn new(
        schema: &'a Schema,
        settings: &'a DotSettings,
        table: TableId,
        link: String,
        config: NodeConfig,
    ) -> Self {
        Self {
            schema,
            settings,
            table,
            link,
            config,
            show_implied: false,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table
    }

    /// Count implied relationships in the footer
    pub fn set_show_implied(&mut self, show: bool) {
        self.show_implied = show;
    }

    pub fn shows_implied(&self) -> bool {
        self.show_implied
    }

    fn table(&self) -> Option<&'a Table> {
        self.schema.table(self.table)
    }

    fn is_indexed(column: &Column) -> bool {
        column.is_unique && !column.is_primary_key
    }

    fn columns_markup(&self, table: &Table) -> String {
        let mut buf = String::new();
        let mut skipped_trivial = false;

        if self.config.show_columns {
            let max_width = table
                .columns
                .iter()
                .map(|c| text_width(&c.name, self.settings.font_size))
                .fold(text_width(&table.name, self.settings.font_size), u32::max);
            for column in &table.columns {
                let shown = self.config.show_trivial
                    || self.config.show_details
                    || column.is_primary_key
                    || column.is_foreign_key()
                    || Self::is_indexed(column);
                if shown {
                    buf.push_str(&self.column_markup(column, max_width));
                } else {
                    skipped_trivial = true;
                }
            }
        }

        if skipped_trivial || !self.config.show_columns {
            buf.push_str(INDENT_6);
            buf.push_str("<TR><TD PORT=\"elipses\" COLSPAN=\"3\" ALIGN=\"LEFT\">...</TD></TR>\n");
        }
        buf
    }

    fn column_markup(&self, column: &Column, max_width: u32) -> String {
        let colors = &self.settings.colors;
        let span = if self.config.show_details { 2 } else { 3 };
        let name = escape_html(&column.name);

        let mut buf = String::from(INDENT_6);
        buf.push_str(&format!("<TR><TD PORT=\"{}\" COLSPAN=\"{}\" ", name, span));
        if column.is_excluded() {
            buf.push_str(&format!("BGCOLOR=\"{}\" ", colors.excluded_column_background));
        } else if Self::is_indexed(column) {
            buf.push_str(&format!("BGCOLOR=\"{}\" ", colors.indexed_column_background));
        }
        buf.push_str("ALIGN=\"LEFT\">");
        buf.push_str("<TABLE BORDER=\"0\" CELLSPACING=\"0\" ALIGN=\"LEFT\"><TR ALIGN=\"LEFT\">");
        buf.push_str("<TD ALIGN=\"LEFT\" FIXEDSIZE=\"TRUE\" WIDTH=\"20\" HEIGHT=\"16\">");
        if column.is_primary_key {
            buf.push_str("<B>PK</B>");
        } else if column.is_foreign_key() {
            buf.push_str("FK");
        }
        buf.push_str("</TD>");
        buf.push_str(&format!(
            "<TD ALIGN=\"LEFT\" FIXEDSIZE=\"TRUE\" WIDTH=\"{}\" HEIGHT=\"16\">{}</TD>",
            max_width, name
        ));
        buf.push_str("</TR></TABLE></TD>");

        if self.config.show_details {
            buf.push_str(&format!("<TD PORT=\"{}.type\" ALIGN=\"LEFT\">", name));
            buf.push_str(&escape_html(&column.short_type_name().to_lowercase()));
            let size = column.detailed_size();
            if !size.is_empty() {
                buf.push_str(&format!("[{}]", escape_html(&size)));
            }
            buf.push_str("</TD>");
        }
        buf.push_str("</TR>\n");
        buf
    }

    fn footer_markup(&self, table: &Table) -> String {
        let body = &self.settings.colors.body_background;
        let parents = self.schema.num_parents(self.table, self.show_implied);
        let children = self.schema.num_children(self.table, self.show_implied);

        let mut buf = String::from(INDENT_6);
        buf.push_str(&format!("<TR><TD ALIGN=\"LEFT\" BGCOLOR=\"{}\">", body));
        if parents > 0 || self.config.show_details {
            buf.push_str(&format!("&lt; {}", parents));
        } else {
            buf.push_str("  ");
        }
        buf.push_str("</TD>");

        buf.push_str(&format!("<TD ALIGN=\"RIGHT\" BGCOLOR=\"{}\">", body));
        match table.num_rows {
            Some(rows) if self.settings.row_counts => {
                buf.push_str(&group_thousands(rows));
                buf.push_str(if rows == 1 { " row" } else { " rows" });
            }
            _ => buf.push_str("  "),
        }
        buf.push_str("</TD>");

        buf.push_str(&format!("<TD ALIGN=\"RIGHT\" BGCOLOR=\"{}\">", body));
        if children > 0 || self.config.show_details {
            buf.push_str(&format!("{} &gt;", children));
        } else {
            buf.push_str("  ");
        }
        buf.push_str("</TD></TR>\n");
        buf
    }
}

impl Element for DotNode<'_> {
    fn render(&self) -> String {
        let Some(table) = self.table() else {
            return String::new();
        };
        let colors = &self.settings.colors;
        let title = table.display_name();
        let escaped_title = escape_html(&title);
        let kind = if table.is_view() { "view" } else { "table" };

        let mut buf = String::new();
        buf.push_str(&format!("  \"{}\" [\n", title));
        buf.push_str("   label=<\n");
        buf.push_str(&format!(
            "    <TABLE BORDER=\"{}\" CELLBORDER=\"1\" CELLSPACING=\"0\" BGCOLOR=\"{}\">\n",
            if self.config.show_details { 2 } else { 0 },
            colors.table_background
        ));
        buf.push_str(INDENT_6);
        buf.push_str(&format!(
            "<TR><TD COLSPAN=\"{}\" BGCOLOR=\"{}\">",
            if self.config.show_details { 4 } else { 3 },
            colors.table_head_background
        ));
        buf.push_str("<TABLE BORDER=\"0\" CELLSPACING=\"0\"><TR>");
        buf.push_str(&format!(
            "<TD ALIGN=\"LEFT\" FIXEDSIZE=\"TRUE\" WIDTH=\"{}\" HEIGHT=\"16\"><B>{}</B></TD>",
            text_width(&title, self.settings.font_size),
            escaped_title
        ));
        buf.push_str(&format!("<TD ALIGN=\"RIGHT\">[{}]</TD>", kind));
        buf.push_str("</TR></TABLE></TD></TR>\n");

        buf.push_str(&self.columns_markup(table));
        if !table.is_view() {
            buf.push_str(&self.footer_markup(table));
        }

        buf.push_str("    </TABLE>>\n");
        buf.push_str(&format!("    URL=\"{}\"\n", self.link));
        buf.push_str("    target=\"_top\"\n");
        buf.push_str(&format!("    tooltip=\"{}\"\n", escaped_title));
        buf.push_str("  ];");
        buf
    }
}

/// `1234567` -> `1,234,567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
