use crate::analyzer::find_implied_constraints;
use crate::config::AtlasConfig;
use crate::generate::prepare_schema;
use crate::schema::{load_schema, Schema};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Serialize)]
struct ImpliedRelationship {
    child: String,
    parent: String,
    child_type: String,
    parent_type: String,
    description: String,
}

#[derive(Serialize)]
struct ImpliedSummary {
    schema: Option<String>,
    tables: usize,
    rails: usize,
    relationships: Vec<ImpliedRelationship>,
}

pub fn run(
    schema_path: PathBuf,
    config: Option<PathBuf>,
    rails: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !schema_path.exists() {
        anyhow::bail!("schema document does not exist: {}", schema_path.display());
    }

    let start_time = Instant::now();
    let mut schema = load_schema(&schema_path)?;
    let mut config = match config {
        Some(path) => AtlasConfig::load(&path)?,
        None => AtlasConfig::default(),
    };
    config.rails |= rails;
    // column rules and rails keys only; inference happens below
    let prepared = prepare_schema(&mut schema, &config, false)?;

    let summary = summarize(&schema, prepared.rails);
    let elapsed = start_time.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.rails > 0 {
        println!("Linked {} relationship(s) by Rails naming.", summary.rails);
    }
    if summary.relationships.is_empty() {
        println!("No implied relationships found in {} tables.", summary.tables);
        return Ok(());
    }

    println!(
        "Found {} implied relationship(s) in {} tables:\n",
        summary.relationships.len(),
        summary.tables
    );
    println!("{:<40} {:<40}", "Child Column", "Parent Column");
    println!("{}", "─".repeat(80));
    for r in &summary.relationships {
        println!("{:<40} {:<40}", r.child, r.parent);
    }
    println!();
    for r in &summary.relationships {
        log::info!("{}", r.description);
    }
    eprintln!("✓ Completed in {:.3?}", elapsed);
    Ok(())
}

fn summarize(schema: &Schema, rails: usize) -> ImpliedSummary {
    let relationships = find_implied_constraints(schema)
        .into_iter()
        .map(|c| ImpliedRelationship {
            child: schema.column_label(c.child),
            parent: schema.column_label(c.parent),
            child_type: schema.column(c.child).type_name.clone(),
            parent_type: schema.column(c.parent).type_name.clone(),
            description: schema.describe_constraint(&c),
        })
        .collect();

    ImpliedSummary {
        schema: schema.name.clone(),
        tables: schema.len(),
        rails,
        relationships,
    }
}
