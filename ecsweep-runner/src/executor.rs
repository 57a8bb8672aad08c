//! Sequential sweep execution and output aggregation.
//!
//! Invocations run one at a time, in plan order. A process that cannot be
//! started aborts the whole sweep and discards partial results. A process
//! that starts and exits non-zero is not an error: whatever it printed is
//! captured like any other output.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use ecsweep_core::{ElementError, Invocation, PathError, SelectionError, SweepPlan, SweepRequest};

use crate::config::ConfigError;
use crate::launcher::{split_lines, LaunchError, Launcher, ProcessLauncher};
use crate::output::OutputError;

/// Errors from loading, validating, running or persisting a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("path error: {0}")]
    Paths(#[from] PathError),
    #[error("configuration error: {0}")]
    Element(#[from] ElementError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Captured output lines keyed by the exact command line issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    outputs: BTreeMap<String, Vec<String>>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the lines of one invocation. A repeated key replaces the earlier
    /// entry, which is returned.
    pub fn insert(&mut self, line: impl Into<String>, lines: Vec<String>) -> Option<Vec<String>> {
        self.outputs.insert(line.into(), lines)
    }

    pub fn get(&self, line: &str) -> Option<&[String]> {
        self.outputs.get(line).map(Vec::as_slice)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.outputs.contains_key(line)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Entries in ascending command-line order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.outputs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.outputs
    }
}

impl<'a> IntoIterator for &'a RunResult {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A completed sweep: the work performed and what it produced.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub request: SweepRequest,
    pub plan: SweepPlan,
    pub result: RunResult,
    /// Invocations that exited with a non-zero code or were killed by a signal.
    pub nonzero_exits: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Runs sweep plans through a [`Launcher`].
#[derive(Debug, Clone, Default)]
pub struct SweepExecutor<L = ProcessLauncher> {
    launcher: L,
}

impl SweepExecutor<ProcessLauncher> {
    /// Executor that spawns real processes.
    pub fn new() -> Self {
        Self {
            launcher: ProcessLauncher,
        }
    }
}

impl<L: Launcher> SweepExecutor<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Execute every invocation of `plan` and collect the outputs.
    pub fn run(&self, plan: &SweepPlan) -> Result<RunResult, SweepError> {
        self.run_with_progress(plan, |_, _, _, _| {})
            .map(|(result, _)| result)
    }

    /// Execute with progress reporting.
    ///
    /// The callback is invoked after each invocation completes with:
    /// - Current index (0-based)
    /// - Total number of invocations
    /// - The invocation
    /// - Its captured lines
    ///
    /// Also returns the number of non-zero exits.
    pub fn run_with_progress<F>(
        &self,
        plan: &SweepPlan,
        mut progress: F,
    ) -> Result<(RunResult, usize), SweepError>
    where
        F: FnMut(usize, usize, &Invocation, &[String]),
    {
        let total = plan.len();
        let mut result = RunResult::new();
        let mut nonzero_exits = 0;

        for (idx, invocation) in plan.iter().enumerate() {
            debug!(index = idx, total, command = %invocation, "launching invocation");
            let captured = self.launcher.launch(invocation)?;

            if !captured.success() {
                nonzero_exits += 1;
                warn!(
                    command = %invocation,
                    exit_code = ?captured.exit_code,
                    "classifier exited unsuccessfully; output kept"
                );
            }

            let lines = split_lines(&captured.stdout);
            debug!(index = idx, lines = lines.len(), "captured output");
            progress(idx, total, invocation, &lines);

            if result.insert(invocation.line(), lines).is_some() {
                warn!(command = %invocation, "duplicate command line; earlier output replaced");
            }
        }

        Ok((result, nonzero_exits))
    }

    /// Validate the configuration, plan the sweep and run it.
    pub fn execute<F>(&self, request: &SweepRequest, progress: F) -> Result<SweepReport, SweepError>
    where
        F: FnMut(usize, usize, &Invocation, &[String]),
    {
        request.configuration.validate()?;

        let plan = request.plan();
        info!(
            classifier = %request.classifier,
            configuration = %request.configuration.name,
            tuples = plan.tuples().len(),
            invocations = plan.len(),
            "starting sweep"
        );

        let started_at = Utc::now();
        let clock = Instant::now();
        let (result, nonzero_exits) = self.run_with_progress(&plan, progress)?;
        let duration_secs = clock.elapsed().as_secs_f64();
        let finished_at = Utc::now();

        info!(
            results = result.len(),
            nonzero_exits,
            duration_secs,
            "sweep finished"
        );

        Ok(SweepReport {
            request: request.clone(),
            plan,
            result,
            nonzero_exits,
            started_at,
            finished_at,
            duration_secs,
        })
    }
}
