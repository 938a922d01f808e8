//! Diagram generation run.
//!
//! Strict phases: column rules, implied key discovery and linking mutate the
//! schema; after that it is shared read-only between worker threads that
//! write one table's diagrams at a time.

use crate::analyzer::{find_implied_constraints, find_rails_constraints};
use crate::config::{AtlasConfig, RuleStats};
use crate::graph::{
    orphan_diagram, summary_diagram, table_diagram, Degrees, DotDiagram, DotSettings,
};
use crate::naming::file_name;
use crate::progress::ProgressTracker;
use crate::render::{write_diagram, DiagramError, DiagramProducer, DiagramResult};
use crate::schema::{Schema, TableId};
use ahash::AHashSet;
use glob::Pattern;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

/// Schema changes made before any diagram is drawn
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrepareStats {
    pub rules: RuleStats,
    pub rails: usize,
    pub implied: usize,
}

/// Apply column rules, link Rails convention keys when enabled, then
/// discover and link implied relationships.
pub fn prepare_schema(
    schema: &mut Schema,
    config: &AtlasConfig,
    find_implied: bool,
) -> anyhow::Result<PrepareStats> {
    let rules = config.apply_to_schema(schema)?;
    let rails = if config.rails {
        let found = find_rails_constraints(schema);
        let count = found.len();
        schema.link_constraints(found);
        log::info!("linked {} rails convention relationship(s)", count);
        count
    } else {
        0
    };
    let implied = if find_implied {
        let found = find_implied_constraints(schema);
        let count = found.len();
        schema.link_constraints(found);
        log::info!("linked {} implied relationship(s)", count);
        count
    } else {
        0
    };
    Ok(PrepareStats {
        rules,
        rails,
        implied,
    })
}

/// Options for one generation run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub output_dir: PathBuf,
    pub settings: DotSettings,
    pub degrees: Degrees,
    pub include_implied: bool,
    /// Restrict table and orphan diagrams to matching table names
    pub tables: Vec<Pattern>,
    /// Worker threads, 0 for one per CPU
    pub jobs: usize,
    pub fail_fast: bool,
    pub progress: bool,
}

impl GenerateOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            settings: DotSettings::default(),
            degrees: Degrees::Two,
            include_implied: true,
            tables: Vec::new(),
            jobs: 0,
            fail_fast: false,
            progress: false,
        }
    }

    fn diagrams_dir(&self) -> PathBuf {
        self.output_dir.join("diagrams")
    }

    fn wants(&self, name: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|p| p.matches(name))
    }

    fn worker_count(&self, job_count: usize) -> usize {
        let wanted = if self.jobs == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.jobs
        };
        wanted.min(job_count).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Table,
    Orphan,
    Summary,
}

/// One written diagram
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Table name, or `schema` for summaries
    pub subject: String,
    pub diagram: String,
    pub tables: usize,
    #[serde(flatten)]
    pub files: DiagramResult,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<DiagramError>,
    pub tables: usize,
    /// Jobs left unstarted after a failure with `fail_fast`
    pub cancelled: bool,
}

impl GenerateReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    artifact: &'a str,
    error: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generator: &'static str,
    version: &'static str,
    renderer: Option<String>,
    tables: usize,
    artifacts: Vec<Artifact>,
    failures: Vec<Failure<'a>>,
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Table(TableId),
    Orphan(TableId),
    Summary { compact: bool, implied: bool },
}

type JobOutput = Vec<Result<Artifact, DiagramError>>;

struct Writer<'a> {
    schema: &'a Schema,
    options: &'a GenerateOptions,
    producer: Option<&'a dyn DiagramProducer>,
}

impl Writer<'_> {
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        kind: ArtifactKind,
        subject: &str,
        diagram: &DotDiagram,
    ) -> Result<Artifact, DiagramError> {
        let files = write_diagram(dir, stem, &diagram.dot, self.producer)?;
        Ok(Artifact {
            kind,
            subject: subject.to_string(),
            diagram: diagram.name.to_string(),
            tables: diagram.table_count(),
            files,
        })
    }

    fn run(&self, job: Job) -> JobOutput {
        match job {
            Job::Table(table) => self.table_diagrams(table),
            Job::Orphan(table) => self.orphan(table),
            Job::Summary { compact, implied } => self.summary(compact, implied),
        }
    }

    /// 1degree always; 2degrees only when it adds tables. Implied variants
    /// only when implied relationships were left out of the real ones.
    fn table_diagrams(&self, table: TableId) -> JobOutput {
        let Some(t) = self.schema.table(table) else {
            return Vec::new();
        };
        let dir = self.options.diagrams_dir().join("tables");
        let base = file_name(&t.name);
        let settings = &self.options.settings;
        let two_degrees = self.options.degrees == Degrees::Two;

        let mut diagrams = Vec::new();
        let one = table_diagram(self.schema, settings, table, Degrees::One, false);
        let skipped_implied = !one.skipped_implied.is_empty();
        if two_degrees {
            let two = table_diagram(self.schema, settings, table, Degrees::Two, false);
            if two.table_count() > one.table_count() {
                diagrams.push(two);
            }
        }
        diagrams.insert(0, one);

        if self.options.include_implied && skipped_implied {
            let one = table_diagram(self.schema, settings, table, Degrees::One, true);
            let one_count = one.table_count();
            diagrams.push(one);
            if two_degrees {
                let two = table_diagram(self.schema, settings, table, Degrees::Two, true);
                if two.table_count() > one_count {
                    diagrams.push(two);
                }
            }
        }

        diagrams
            .iter()
            .map(|d| {
                let stem = format!("{}.{}", base, d.name.file_stem());
                self.write(&dir, &stem, ArtifactKind::Table, &t.name, d)
            })
            .collect()
    }

    fn orphan(&self, table: TableId) -> JobOutput {
        let Some(diagram) = orphan_diagram(self.schema, &self.options.settings, table) else {
            return Vec::new();
        };
        let name = self.schema.table(table).map(|t| t.name.as_str()).unwrap_or_default();
        let dir = self.options.diagrams_dir().join("orphans");
        vec![self.write(&dir, &file_name(name), ArtifactKind::Orphan, name, &diagram)]
    }

    fn summary(&self, compact: bool, implied: bool) -> JobOutput {
        let diagram = summary_diagram(self.schema, &self.options.settings, compact, implied);
        // nothing is only reachable through implied keys
        if implied && !diagram.wrote_implied {
            return Vec::new();
        }
        let dir = self.options.diagrams_dir().join("summary");
        vec![self.write(&dir, &diagram.name.file_stem(), ArtifactKind::Summary, "schema", &diagram)]
    }
}

fn plan_jobs(schema: &Schema, options: &GenerateOptions) -> Vec<Job> {
    let mut tables: Vec<TableId> = schema
        .local_tables()
        .filter(|t| options.wants(&t.name))
        .map(|t| t.id)
        .collect();
    tables.sort_by(|&a, &b| schema.compare_tables(a, b));

    // artifacts are keyed by file name; two tables must never write one path
    let mut stems = AHashSet::new();
    tables.retain(|&id| {
        let Some(t) = schema.table(id) else {
            return false;
        };
        let fresh = stems.insert(file_name(&t.name));
        if !fresh {
            log::warn!(
                "skipping {}: another table already writes diagrams named '{}'",
                t.full_name(),
                file_name(&t.name)
            );
        }
        fresh
    });

    let mut jobs: Vec<Job> = tables.iter().map(|&t| Job::Table(t)).collect();
    jobs.extend(
        tables
            .iter()
            .filter(|&&t| schema.is_orphan(t, options.include_implied))
            .map(|&t| Job::Orphan(t)),
    );
    for implied in [false, true] {
        if implied && !options.include_implied {
            continue;
        }
        for compact in [true, false] {
            jobs.push(Job::Summary { compact, implied });
        }
    }
    jobs
}

/// Write every diagram for `schema` under `<output_dir>/diagrams`.
///
/// Per-artifact failures are collected, not returned. Only a failure to
/// write the manifest is an error.
pub fn generate_diagrams(
    schema: &Schema,
    options: &GenerateOptions,
    producer: Option<&dyn DiagramProducer>,
) -> anyhow::Result<GenerateReport> {
    let jobs = plan_jobs(schema, options);
    let table_jobs = jobs.iter().filter(|j| matches!(j, Job::Table(_))).count();
    let workers = options.worker_count(jobs.len());
    log::info!("{} diagram job(s) on {} worker(s)", jobs.len(), workers);

    let mut tracker = ProgressTracker::new("diagrams", jobs.len() as u64);
    if options.progress {
        tracker = tracker.with_bar();
    }

    let writer = Writer {
        schema,
        options,
        producer,
    };
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let outputs: Mutex<Vec<(usize, JobOutput)>> = Mutex::new(Vec::with_capacity(jobs.len()));

    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                if options.fail_fast && failed.load(Ordering::Relaxed) {
                    break;
                }
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(&job) = jobs.get(index) else {
                    break;
                };
                let output = writer.run(job);
                if output.iter().any(|r| r.is_err()) {
                    failed.store(true, Ordering::Relaxed);
                }
                tracker.inc();
                if let Ok(mut outputs) = outputs.lock() {
                    outputs.push((index, output));
                }
            });
        }
    });
    tracker.finish();

    let mut outputs = outputs.into_inner().unwrap_or_else(|e| e.into_inner());
    outputs.sort_by_key(|(index, _)| *index);

    let mut report = GenerateReport {
        tables: table_jobs,
        cancelled: outputs.len() < jobs.len(),
        ..Default::default()
    };
    for result in outputs.into_iter().flat_map(|(_, output)| output) {
        match result {
            Ok(artifact) => report.artifacts.push(artifact),
            Err(e) => {
                log::warn!("{}", e);
                report.failures.push(e);
            }
        }
    }

    write_manifest(options, producer, &report)?;
    Ok(report)
}

fn relative(base: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}

fn write_manifest(
    options: &GenerateOptions,
    producer: Option<&dyn DiagramProducer>,
    report: &GenerateReport,
) -> anyhow::Result<()> {
    let dir = options.diagrams_dir();
    let artifacts = report
        .artifacts
        .iter()
        .cloned()
        .map(|mut a| {
            a.files.dot_file = relative(&dir, &a.files.dot_file);
            a.files.diagram_file = a.files.diagram_file.map(|f| relative(&dir, &f));
            a
        })
        .collect();
    let manifest = Manifest {
        generator: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        renderer: producer.map(|p| p.implementation_details()),
        tables: report.tables,
        artifacts,
        failures: report
            .failures
            .iter()
            .map(|e| Failure {
                artifact: e.artifact(),
                error: e.to_string(),
            })
            .collect(),
    };

    fs::create_dir_all(&dir)?;
    let path = dir.join("manifest.json");
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
