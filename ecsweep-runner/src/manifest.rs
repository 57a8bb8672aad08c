//! Run manifest export (JSON).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use ecsweep_core::SweepRequest;

use crate::executor::SweepReport;
use crate::output::{ensure_folder, OutputError};

/// Name of the manifest file inside the output folder.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Content hash of a sweep request (BLAKE3 over its canonical JSON).
///
/// Two requests with the same classifier, run command, elements and data
/// paths share a sweep id.
pub fn sweep_id(request: &SweepRequest) -> Result<String, OutputError> {
    let json = serde_json::to_string(request).map_err(|source| OutputError::Serialize {
        what: "sweep request",
        source,
    })?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub sweep_id: String,
    pub classifier: String,
    pub run_command: String,
    pub configuration: String,
    pub train_paths: Vec<String>,
    pub test_paths: Vec<String>,
    pub tuple_count: usize,
    pub invocation_count: usize,
    pub nonzero_exits: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub output_file: PathBuf,
}

impl RunManifest {
    pub fn from_report(report: &SweepReport, output_file: &Path) -> Result<Self, OutputError> {
        let request = &report.request;
        Ok(Self {
            sweep_id: sweep_id(request)?,
            classifier: request.classifier.clone(),
            run_command: request.run_command.clone(),
            configuration: request.configuration.name.clone(),
            train_paths: request.train_paths.clone(),
            test_paths: request.test_paths.clone(),
            tuple_count: report.plan.tuples().len(),
            invocation_count: report.plan.len(),
            nonzero_exits: report.nonzero_exits,
            started_at: report.started_at,
            finished_at: report.finished_at,
            duration_secs: report.duration_secs,
            output_file: output_file.to_path_buf(),
        })
    }
}

/// Write `<folder>/manifest.json`. Returns the path written.
pub fn write_manifest(folder: &Path, manifest: &RunManifest) -> Result<PathBuf, OutputError> {
    ensure_folder(folder)?;
    let path = folder.join(MANIFEST_FILE_NAME);

    let json = serde_json::to_string_pretty(manifest).map_err(|source| OutputError::Serialize {
        what: "run manifest",
        source,
    })?;
    std::fs::write(&path, json).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), sweep_id = %manifest.sweep_id, "wrote run manifest");
    Ok(path)
}

/// Read a manifest back.
pub fn read_manifest(path: &Path) -> Result<RunManifest, OutputError> {
    let json = std::fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| OutputError::Serialize {
        what: "run manifest",
        source,
    })
}
