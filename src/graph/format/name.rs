//! Diagram names and the file stems derived from them.

use std::fmt;
use std::str::FromStr;

/// Degrees of separation shown around a focal table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Degrees {
    #[default]
    One,
    Two,
}

impl FromStr for Degrees {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "one" => Ok(Degrees::One),
            "2" | "two" => Ok(Degrees::Two),
            _ => Err(format!("Unknown degrees: {}. Valid options: 1, 2", s)),
        }
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degrees::One => write!(f, "1"),
            Degrees::Two => write!(f, "2"),
        }
    }
}

/// Kind of diagram, which fixes both the digraph name and the file stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramName {
    /// Neighbourhood of one table
    Table { degrees: Degrees, implied: bool },
    /// Every related table of the schema
    Summary { compact: bool, implied: bool },
    /// A table with no relationships, named after it
    Orphan(String),
}

impl DiagramName {
    /// Name written after `digraph`
    pub fn graph_name(&self) -> String {
        match self {
            DiagramName::Table { degrees, implied } => {
                let base = match degrees {
                    Degrees::One => "oneDegreeRelationshipsDiagram",
                    Degrees::Two => "twoDegreesRelationshipsDiagram",
                };
                if *implied {
                    format!("{}Implied", base)
                } else {
                    base.to_string()
                }
            }
            DiagramName::Summary { compact, implied } => {
                let size = if *compact { "compact" } else { "large" };
                let kind = if *implied { "Implied" } else { "" };
                format!("{}{}RelationshipsDiagram", size, kind)
            }
            DiagramName::Orphan(table) => table.clone(),
        }
    }

    /// File stem suffix, e.g. `1degree` or `relationships.real.compact`
    pub fn file_stem(&self) -> String {
        match self {
            DiagramName::Table { degrees, implied } => {
                match (degrees, implied) {
                    (Degrees::One, false) => "1degree",
                    (Degrees::Two, false) => "2degrees",
                    (Degrees::One, true) => "implied1degrees",
                    (Degrees::Two, true) => "implied2degrees",
                }
                .to_string()
            }
            DiagramName::Summary { compact, implied } => format!(
                "relationships.{}.{}",
                if *implied { "implied" } else { "real" },
                if *compact { "compact" } else { "large" }
            ),
            DiagramName::Orphan(table) => table.clone(),
        }
    }

    pub fn is_implied(&self) -> bool {
        match self {
            DiagramName::Table { implied, .. } | DiagramName::Summary { implied, .. } => *implied,
            DiagramName::Orphan(_) => false,
        }
    }
}

impl fmt::Display for DiagramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.graph_name())
    }
}
