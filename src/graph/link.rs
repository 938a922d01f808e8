//! Relative links from generated artifacts to table pages.

use crate::schema::Table;
use url::form_urlencoded;

/// Where the link is written from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A page at the output root
    TablePage,
    /// A summary or orphan diagram
    SummaryDiagram,
    /// A per-table diagram
    TableDiagram,
}

/// Form-encode a name, spaces as `%20`
pub fn encode_name(name: &str) -> String {
    form_urlencoded::byte_serialize(name.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Path to a table's page as seen from `source`.
///
/// `relative_links` produces paths relative to the diagram file itself,
/// needed when the diagram is embedded as SVG instead of an image map.
pub fn table_link(source: SourceKind, table: &Table, relative_links: bool) -> String {
    let page = format!("tables/{}.html", encode_name(&table.name));
    let container = table.container.as_deref().filter(|_| table.is_remote());

    if relative_links {
        return match container {
            Some(c) => format!("../../../{}/{}", c, page),
            None => format!("../../{}", page),
        };
    }

    match container {
        None => page,
        Some(c) => {
            let climb = match source {
                SourceKind::TablePage => "../",
                SourceKind::TableDiagram => "../../",
                SourceKind::SummaryDiagram => "../../../",
            };
            format!("{}{}/{}", climb, c, page)
        }
    }
}
