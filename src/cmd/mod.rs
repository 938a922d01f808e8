mod diagrams;
mod implied;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schema-atlas")]
#[command(version)]
#[command(about = "Infer implied foreign keys and draw relationship diagrams for a database schema", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List relationships implied by column names and types
    Implied {
        /// Schema document (JSON, or YAML with a .yaml/.yml extension)
        schema: PathBuf,

        /// YAML configuration file (column rules)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Link `<singular>_id` columns to `<plural>.id` before inferring
        #[arg(long)]
        rails: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write DOT diagrams for every table plus schema summaries
    Diagrams {
        /// Schema document (JSON, or YAML with a .yaml/.yml extension)
        schema: PathBuf,

        /// Output directory; diagrams land in <output>/diagrams
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Degrees of separation around each table: 1 or 2
        #[arg(long)]
        degrees: Option<String>,

        /// Skip implied relationship discovery and implied diagrams
        #[arg(long)]
        no_implied: bool,

        /// Link `<singular>_id` columns to `<plural>.id` (Ruby on Rails naming)
        #[arg(long)]
        rails: bool,

        /// Image format: png, gif or svg
        #[arg(short, long)]
        format: Option<String>,

        /// Only write .dot files, do not run Graphviz
        #[arg(long)]
        no_render: bool,

        /// Directory containing the Graphviz `dot` executable
        #[arg(long)]
        graphviz_dir: Option<PathBuf>,

        /// Only draw tables matching these glob patterns (comma-separated)
        #[arg(short, long)]
        tables: Option<String>,

        /// Worker threads (default: one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Show progress during generation
        #[arg(short, long)]
        progress: bool,

        /// Stop scheduling diagrams after the first failure
        #[arg(long)]
        fail_fast: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the file name used for each given table name
    FileName {
        /// Names to convert
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Implied {
            schema,
            config,
            rails,
            json,
        } => implied::run(schema, config, rails, json),
        Commands::Diagrams {
            schema,
            output,
            config,
            degrees,
            no_implied,
            rails,
            format,
            no_render,
            graphviz_dir,
            tables,
            jobs,
            progress,
            fail_fast,
            json,
        } => diagrams::run(diagrams::DiagramArgs {
            schema,
            output,
            config,
            degrees,
            no_implied,
            rails,
            format,
            no_render,
            graphviz_dir,
            tables,
            jobs,
            progress,
            fail_fast,
            json,
        }),
        Commands::FileName { names } => {
            for name in names {
                println!("{}", crate::naming::file_name(&name));
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "schema-atlas",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}
