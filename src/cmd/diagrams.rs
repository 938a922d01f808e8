use crate::config::AtlasConfig;
use crate::generate::{
    generate_diagrams, prepare_schema, GenerateOptions, GenerateReport, PrepareStats,
};
use crate::graph::Degrees;
use crate::render::{DiagramProducer, GraphvizDot, ImageFormat};
use crate::schema::load_schema;
use glob::Pattern;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

pub struct DiagramArgs {
    pub schema: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub degrees: Option<String>,
    pub no_implied: bool,
    pub rails: bool,
    pub format: Option<String>,
    pub no_render: bool,
    pub graphviz_dir: Option<PathBuf>,
    pub tables: Option<String>,
    pub jobs: Option<usize>,
    pub progress: bool,
    pub fail_fast: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    tables: usize,
    rails: usize,
    implied: usize,
    artifacts: usize,
    failures: Vec<String>,
    cancelled: bool,
    elapsed_secs: f64,
}

fn parse_table_patterns(patterns: &str) -> anyhow::Result<Vec<Pattern>> {
    patterns
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            Pattern::new(s).map_err(|e| anyhow::anyhow!("invalid table pattern '{}': {}", s, e))
        })
        .collect()
}

/// Merge file configuration with command line overrides
fn resolve_config(args: &DiagramArgs) -> anyhow::Result<AtlasConfig> {
    let mut config = match &args.config {
        Some(path) => AtlasConfig::load(path)?,
        None => AtlasConfig::default(),
    };

    if let Some(degrees) = &args.degrees {
        let degrees: Degrees = degrees.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        config.degrees = match degrees {
            Degrees::One => 1,
            Degrees::Two => 2,
        };
    }
    if args.no_implied {
        config.implied = false;
    }
    if args.rails {
        config.rails = true;
    }
    if let Some(format) = &args.format {
        let format: ImageFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        config.image_format = format.to_string();
    }
    if let Some(dir) = &args.graphviz_dir {
        config.graphviz_dir = Some(dir.clone());
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(tables) = &args.tables {
        config.tables = tables.split(',').map(|s| s.trim().to_string()).collect();
    }
    Ok(config)
}

pub fn run(args: DiagramArgs) -> anyhow::Result<()> {
    if !args.schema.exists() {
        anyhow::bail!("schema document does not exist: {}", args.schema.display());
    }

    let config = resolve_config(&args)?;
    let start_time = Instant::now();

    let mut schema = load_schema(&args.schema)?;
    let prepared = prepare_schema(&mut schema, &config, config.implied)?;

    let options = GenerateOptions {
        output_dir: args.output.clone(),
        settings: config.diagram.clone(),
        degrees: config.degrees()?,
        include_implied: config.implied,
        tables: parse_table_patterns(&config.tables.join(","))?,
        jobs: config.jobs,
        fail_fast: args.fail_fast,
        progress: args.progress && !args.json,
    };

    let graphviz = if args.no_render {
        None
    } else {
        let dot = GraphvizDot::new(config.graphviz_dir.as_deref(), config.format()?);
        if !dot.exists() {
            anyhow::bail!("Graphviz 'dot' command not found. Install Graphviz or use --no-render");
        }
        log::info!("rendering with {}", dot.implementation_details());
        Some(dot)
    };
    let producer = graphviz.as_ref().map(|d| d as &dyn DiagramProducer);

    let report = generate_diagrams(&schema, &options, producer)?;
    let elapsed = start_time.elapsed();

    if args.json {
        let summary = RunSummary {
            tables: report.tables,
            rails: prepared.rails,
            implied: prepared.implied,
            artifacts: report.artifacts.len(),
            failures: report.failures.iter().map(|e| e.to_string()).collect(),
            cancelled: report.cancelled,
            elapsed_secs: elapsed.as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&report, &prepared, &options);
        eprintln!("  Time: {:.3?}", elapsed);
    }

    if !report.is_success() {
        anyhow::bail!("{} diagram(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &GenerateReport, prepared: &PrepareStats, options: &GenerateOptions) {
    for failure in &report.failures {
        eprintln!("✗ {}", failure);
    }
    if !report.failures.is_empty() {
        eprintln!();
    }

    eprintln!("Diagram summary:");
    eprintln!("  Tables: {}", report.tables);
    if prepared.rails > 0 {
        eprintln!("  Rails relationships: {}", prepared.rails);
    }
    eprintln!("  Implied relationships: {}", prepared.implied);
    eprintln!("  Diagrams written: {}", report.artifacts.len());
    if !report.failures.is_empty() {
        eprintln!("  Failed: {}", report.failures.len());
    }
    if report.cancelled {
        eprintln!("  Stopped early after a failure (--fail-fast)");
    }
    eprintln!("  Output: {}", options.output_dir.join("diagrams").display());
}
