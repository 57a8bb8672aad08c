//! End-to-end sweep: run a resolved request and persist its artifacts.

use std::path::{Path, PathBuf};

use tracing::info;

use ecsweep_core::{Invocation, SweepRequest};

use crate::config::SweepFile;
use crate::executor::{SweepError, SweepExecutor, SweepReport};
use crate::launcher::Launcher;
use crate::manifest::{write_manifest, RunManifest};
use crate::output::write_output;

/// Where and what to persist after a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub output_folder: PathBuf,
    pub write_manifest: bool,
}

impl RunOptions {
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
            write_manifest: true,
        }
    }

    pub fn without_manifest(mut self) -> Self {
        self.write_manifest = false;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new("output")
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct SweepArtifacts {
    pub report: SweepReport,
    pub output_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

/// Execute `request` and write `output.txt` (and optionally `manifest.json`).
///
/// The output file is only written once every invocation has run; a launch
/// failure leaves the output folder untouched.
pub fn run_request<L, F>(
    executor: &SweepExecutor<L>,
    request: &SweepRequest,
    options: &RunOptions,
    progress: F,
) -> Result<SweepArtifacts, SweepError>
where
    L: Launcher,
    F: FnMut(usize, usize, &Invocation, &[String]),
{
    let report = executor.execute(request, progress)?;
    let output_path = write_output(&options.output_folder, &report.result)?;

    let manifest_path = if options.write_manifest {
        let manifest = RunManifest::from_report(&report, &output_path)?;
        Some(write_manifest(&options.output_folder, &manifest)?)
    } else {
        None
    };

    info!(output = %output_path.display(), "sweep artifacts written");
    Ok(SweepArtifacts {
        report,
        output_path,
        manifest_path,
    })
}

/// Resolve a sweep file and run it with the file's own output folder.
pub fn run_sweep_file<L, F>(
    executor: &SweepExecutor<L>,
    file: &SweepFile,
    progress: F,
) -> Result<SweepArtifacts, SweepError>
where
    L: Launcher,
    F: FnMut(usize, usize, &Invocation, &[String]),
{
    let request = file.resolve()?;
    let options = RunOptions::new(file.output_folder());
    run_request(executor, &request, &options, progress)
}

/// Load a sweep file from disk and run it.
pub fn run_config_path<L, F>(
    executor: &SweepExecutor<L>,
    path: &Path,
    progress: F,
) -> Result<SweepArtifacts, SweepError>
where
    L: Launcher,
    F: FnMut(usize, usize, &Invocation, &[String]),
{
    let file = SweepFile::from_file(path)?;
    run_sweep_file(executor, &file, progress)
}
