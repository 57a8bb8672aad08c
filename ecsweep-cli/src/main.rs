//! ecsweep CLI: check, plan and run classifier parameter sweeps.
//!
//! Commands:
//! - `check` reports every selection, path and element problem at once
//! - `plan` prints the invocations a run would execute, spawning nothing
//! - `run` executes the sweep and writes `output.txt` and `manifest.json`

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ecsweep_core::{cardinality_errors, validate_paths, SweepPlan};
use ecsweep_runner::{run_request, RunOptions, SweepExecutor, SweepFile, SweepReport};

#[derive(Parser)]
#[command(
    name = "ecsweep",
    version,
    about = "Run an external classifier over every point of a parameter grid"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the selected sweep and write its output file.
    Run {
        /// Path to the TOML sweep file.
        #[arg(long)]
        config: PathBuf,

        /// Output folder. Defaults to the sweep file's `output_folder`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Launcher prefix, e.g. "java -jar" or "" to run the classifier directly.
        #[arg(long)]
        run_command: Option<String>,

        /// Skip writing manifest.json.
        #[arg(long, default_value_t = false)]
        no_manifest: bool,
    },
    /// Print every invocation the sweep would execute.
    Plan {
        /// Path to the TOML sweep file.
        #[arg(long)]
        config: PathBuf,

        /// Launcher prefix override.
        #[arg(long)]
        run_command: Option<String>,
    },
    /// Validate selections, file paths and configuration elements.
    Check {
        /// Path to the TOML sweep file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            run_command,
            no_manifest,
        } => run_sweep_cmd(&config, output_dir, run_command, no_manifest),
        Commands::Plan { config, run_command } => run_plan_cmd(&config, run_command),
        Commands::Check { config } => run_check_cmd(&config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(config: &Path, run_command: Option<String>) -> Result<SweepFile> {
    let mut file = SweepFile::from_file(config)
        .with_context(|| format!("loading sweep file {}", config.display()))?;
    if let Some(cmd) = run_command {
        file.sweep.run_command = cmd;
    }
    Ok(file)
}

fn run_sweep_cmd(
    config: &Path,
    output_dir: Option<PathBuf>,
    run_command: Option<String>,
    no_manifest: bool,
) -> Result<()> {
    let file = load(config, run_command)?;
    let request = file.resolve().context("sweep is not runnable")?;

    let folder = output_dir.unwrap_or_else(|| file.output_folder());
    let mut options = RunOptions::new(folder);
    if no_manifest {
        options = options.without_manifest();
    }

    let executor = SweepExecutor::new();
    let artifacts = run_request(&executor, &request, &options, |idx, total, invocation, _| {
        eprint!("\r[{}/{}] {}", idx + 1, total, truncate(invocation.line(), 60));
        let _ = std::io::stderr().flush();
    });
    eprintln!();
    let artifacts = artifacts.context("sweep failed")?;

    print_summary(&artifacts.report);
    println!("Output written to: {}", artifacts.output_path.display());
    if let Some(path) = &artifacts.manifest_path {
        println!("Manifest written to: {}", path.display());
    }
    Ok(())
}

fn run_plan_cmd(config: &Path, run_command: Option<String>) -> Result<()> {
    let file = load(config, run_command)?;
    let request = file.resolve().context("sweep is not runnable")?;
    let plan = request.plan();

    for invocation in &plan {
        println!("{invocation}");
    }
    print_counts(&plan);
    Ok(())
}

fn run_check_cmd(config: &Path) -> Result<()> {
    let file = load(config, None)?;
    let selections = file.selections();
    let mut problems: Vec<String> = Vec::new();

    problems.extend(cardinality_errors(&selections).iter().map(ToString::to_string));

    let missing = validate_paths(&selections);
    problems.extend(
        missing
            .iter()
            .map(|item| format!("{} '{}': file not found: {}", item.role, item.name, item.path)),
    );

    for entry in file.configurations.iter().filter(|c| c.selected) {
        if let Err(err) = entry.to_configuration().validate() {
            problems.push(format!("configuration '{}': {err}", entry.name));
        }
    }

    if problems.is_empty() {
        println!("OK: {} is ready to run", config.display());
        return Ok(());
    }

    for problem in &problems {
        eprintln!("error: {problem}");
    }
    bail!("{} problem(s) found in {}", problems.len(), config.display())
}

fn print_counts(plan: &SweepPlan) {
    println!();
    println!("Tuples:      {}", plan.tuples().len());
    println!("Invocations: {}", plan.len());
}

fn print_summary(report: &SweepReport) {
    println!();
    println!("=== Sweep Summary ===");
    println!("Classifier:    {}", report.request.classifier);
    println!("Configuration: {}", report.request.configuration.name);
    println!("Tuples:        {}", report.plan.tuples().len());
    println!("Invocations:   {}", report.plan.len());
    println!("Results:       {}", report.result.len());
    println!("Non-zero exit: {}", report.nonzero_exits);
    println!("Duration:      {:.2}s", report.duration_secs);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        format!("{text:<max$}")
    } else {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
