//! YAML configuration for diagram generation.
//!
//! Covers rendering options, column exclusions and implied key switches.
//! Every field is optional; command line flags override file values.

use crate::graph::format::{Degrees, DotSettings};
use crate::render::ImageFormat;
use crate::schema::Schema;
use anyhow::{bail, Context};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Columns, as `table.column` regexes, that never take part in implied keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpliedKeyRules {
    /// Columns that never get an implied parent
    pub parents: Vec<String>,
    /// Primary keys that never get implied children
    pub children: Vec<String>,
}

/// Complete YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// DOT rendering options
    pub diagram: DotSettings,
    /// Image format handed to Graphviz
    pub image_format: String,
    /// Directory containing the `dot` executable
    pub graphviz_dir: Option<PathBuf>,
    /// Degrees of separation for table diagrams (1 or 2)
    pub degrees: u8,
    /// Generate implied-relationship diagrams
    pub implied: bool,
    /// Link `<singular>_id` columns to `<plural>.id` as Rails does
    pub rails: bool,
    /// Worker threads, 0 for one per CPU
    pub jobs: usize,
    /// Only draw neighbourhoods of tables matching these globs
    pub tables: Vec<String>,
    /// `table.column` regex hiding columns from every diagram
    pub exclude_columns: Option<String>,
    /// `table.column` regex hiding columns unless their table is the subject
    pub exclude_indirect_columns: Option<String>,
    pub disable_implied_keys: ImpliedKeyRules,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            diagram: DotSettings::default(),
            image_format: "png".to_string(),
            graphviz_dir: None,
            degrees: 2,
            implied: true,
            rails: false,
            jobs: 0,
            tables: Vec::new(),
            exclude_columns: None,
            exclude_indirect_columns: None,
            disable_implied_keys: ImpliedKeyRules::default(),
        }
    }
}

/// What applying the column rules changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub excluded_all: usize,
    pub excluded_indirect: usize,
    pub implied_parents_disabled: usize,
    pub implied_children_disabled: usize,
}

/// Compile a user pattern so it must match the whole `table.column` label
fn full_match(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .with_context(|| format!("invalid column pattern '{}'", pattern))
}

fn compile_all(patterns: &[String]) -> anyhow::Result<Vec<Regex>> {
    patterns.iter().map(|p| full_match(p)).collect()
}

impl AtlasConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AtlasConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.degrees()?;
        self.format()?;
        Ok(())
    }

    pub fn degrees(&self) -> anyhow::Result<Degrees> {
        match self.degrees {
            1 => Ok(Degrees::One),
            2 => Ok(Degrees::Two),
            n => bail!("degrees must be 1 or 2, got {}", n),
        }
    }

    pub fn format(&self) -> anyhow::Result<ImageFormat> {
        self.image_format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }

    /// Mark excluded and implied-disabled columns on the schema.
    ///
    /// Must run before implied key discovery.
    pub fn apply_to_schema(&self, schema: &mut Schema) -> anyhow::Result<RuleStats> {
        let exclude_all = self.exclude_columns.as_deref().map(full_match).transpose()?;
        let exclude_indirect = self
            .exclude_indirect_columns
            .as_deref()
            .map(full_match)
            .transpose()?;
        let no_parents = compile_all(&self.disable_implied_keys.parents)?;
        let no_children = compile_all(&self.disable_implied_keys.children)?;

        let mut stats = RuleStats::default();
        let refs: Vec<_> = schema.column_refs().collect();

        for r in refs {
            let label = match schema.table(r.table) {
                Some(t) => format!("{}.{}", t.name, schema.column(r).name),
                None => continue,
            };
            let matches = |re: &Regex| re.is_match(&label);
            let column = schema.column_mut(r);

            if exclude_all.as_ref().is_some_and(matches) {
                column.exclude_from_all_diagrams();
                stats.excluded_all += 1;
            } else if exclude_indirect.as_ref().is_some_and(matches) {
                column.excluded_from_direct_diagrams = true;
                stats.excluded_indirect += 1;
            }
            if no_parents.iter().any(matches) {
                column.implied_parents_disabled = true;
                stats.implied_parents_disabled += 1;
            }
            if no_children.iter().any(matches) {
                column.implied_children_disabled = true;
                stats.implied_children_disabled += 1;
            }
        }

        log::debug!("column rules applied: {:?}", stats);
        Ok(stats)
    }
}
