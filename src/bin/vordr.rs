//! Vordr CLI - test coverage correlation for AL workspaces.
//!
//! Thin front-end over the library engine: discovers coverage data under a
//! workspace root, attributes it to tests, and answers reverse queries from
//! the persisted index.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use vordr_rs::io::workspace::WorkspaceSources;
use vordr_rs::{CoverageConfig, CoverageEngine, MethodIdentity, SourceObject, SourceProvider};

#[derive(Parser)]
#[command(name = "vordr", version, about = "Coverage-to-test correlation for AL unit tests")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WorkspaceArgs {
    /// Workspace root containing the AL sources
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (YAML); defaults to <root>/vordr.yml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Attribute the latest coverage run to a test and update the index
    Build {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Object declaring the test method
        #[arg(long)]
        test_object: String,

        /// Test method name
        #[arg(long)]
        test_method: String,
    },

    /// List the tests covering a method
    Related {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Covered object name
        #[arg(long)]
        object: String,

        /// Covered method name
        #[arg(long)]
        method: String,
    },

    /// List the test methods declared by an object
    Tests {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Object name declaring the tests
        #[arg(long)]
        object: String,
    },

    /// Coverage percentage for an object line range
    Percent {
        #[command(flatten)]
        workspace: WorkspaceArgs,

        /// Object kind, e.g. codeunit
        #[arg(long)]
        kind: String,

        /// Object id
        #[arg(long)]
        id: u32,

        /// First line of the range
        #[arg(long)]
        start: u32,

        /// Last line of the range
        #[arg(long)]
        end: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Build {
            workspace,
            test_object,
            test_method,
        } => {
            let engine = open_engine(&workspace)?;
            let test = MethodIdentity::new(test_object, test_method);
            let recorded = engine
                .build_test_coverage_from_test_item(&test)
                .with_context(|| format!("failed to build coverage for {test}"))?;
            println!("Recorded {recorded} covered methods for {test}");
        }
        Commands::Related {
            workspace,
            object,
            method,
        } => {
            let engine = open_engine(&workspace)?;
            let related = engine.related_tests(&MethodIdentity::new(object, method));
            if related.is_empty() {
                println!("No related tests");
            } else {
                for test in related {
                    println!("{test}");
                }
            }
        }
        Commands::Tests { workspace, object } => {
            let engine = open_engine(&workspace)?;
            let Some(declaring) = engine.sources().object_by_name(&object) else {
                anyhow::bail!("no object named '{object}' in the workspace");
            };
            for test in engine.test_methods(&declaring) {
                println!("{test}");
            }
        }
        Commands::Percent {
            workspace,
            kind,
            id,
            start,
            end,
        } => {
            let engine = open_engine(&workspace)?;
            let records = engine.load_coverage_records()?;
            let object = engine
                .sources()
                .find_object(&kind, id)
                .unwrap_or_else(|| SourceObject::new(kind, id, String::new()));
            let percent =
                engine.coverage_percentage_for_range(records.records(), &object, start, end);
            println!("{percent}%");
        }
    }

    Ok(())
}

fn open_engine(workspace: &WorkspaceArgs) -> anyhow::Result<CoverageEngine<WorkspaceSources>> {
    let config_path = workspace
        .config
        .clone()
        .unwrap_or_else(|| workspace.root.join("vordr.yml"));
    let config = CoverageConfig::from_yaml_file(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let sources = WorkspaceSources::scan(&workspace.root, &config)
        .with_context(|| format!("failed to scan workspace {}", workspace.root.display()))?;
    let engine = CoverageEngine::open(&workspace.root, config, sources)?;
    Ok(engine)
}
