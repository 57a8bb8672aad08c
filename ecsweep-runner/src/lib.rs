//! ecsweep runner: everything that touches processes or the file system.
//!
//! This crate builds on `ecsweep-core` to provide:
//! - TOML sweep files (catalog plus selection flags)
//! - Process launching with stdout capture
//! - Sequential sweep execution with progress callbacks
//! - The aggregate `output.txt` and a JSON run manifest

pub mod config;
pub mod executor;
pub mod launcher;
pub mod manifest;
pub mod output;
pub mod pipeline;

pub use config::{
    CatalogEntry, ConfigError, ConfigurationEntry, ElementEntry, SweepFile, SweepSettings,
};
pub use executor::{RunResult, SweepError, SweepExecutor, SweepReport};
pub use launcher::{split_lines, Captured, LaunchError, Launcher, ProcessLauncher};
pub use manifest::{read_manifest, sweep_id, write_manifest, RunManifest, MANIFEST_FILE_NAME};
pub use output::{render, render_to_string, write_output, OutputError, OUTPUT_FILE_NAME};
pub use pipeline::{run_config_path, run_request, run_sweep_file, RunOptions, SweepArtifacts};
