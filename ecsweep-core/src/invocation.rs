//! Invocation assembly: one command line per tuple and (train, test) pair.
//!
//! Command lines have the shape
//! `<run-command> <classifier> <values...> <train> <test>`. They are split on
//! whitespace when launched; quoting is not supported, so paths and values
//! containing spaces cannot be expressed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Configuration;
use crate::grid::{format_value, ParameterGrid, Tuple};
use crate::selection::ValidatedSelection;

/// Launcher prefix used when none is configured.
pub const DEFAULT_RUN_COMMAND: &str = "java -jar";

/// One fully materialized external command line.
///
/// The line itself is the identity of an invocation and the key under which
/// its output is aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invocation {
    line: String,
    tuple_index: usize,
    train: String,
    test: String,
}

impl Invocation {
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Position of the tuple this invocation was built from.
    pub fn tuple_index(&self) -> usize {
        self.tuple_index
    }

    /// Train path; empty when the sweep has no train data.
    pub fn train(&self) -> &str {
        &self.train
    }

    pub fn test(&self) -> &str {
        &self.test
    }

    /// Whitespace-delimited argument vector. The first entry is the program.
    pub fn argv(&self) -> Vec<&str> {
        self.line.split_whitespace().collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Everything the engine needs for one sweep, already validated upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub run_command: String,
    pub classifier: String,
    pub configuration: Configuration,
    pub train_paths: Vec<String>,
    pub test_paths: Vec<String>,
}

impl SweepRequest {
    pub fn new(
        classifier: impl Into<String>,
        configuration: Configuration,
        train_paths: Vec<String>,
        test_paths: Vec<String>,
    ) -> Self {
        Self {
            run_command: DEFAULT_RUN_COMMAND.to_string(),
            classifier: classifier.into(),
            configuration,
            train_paths,
            test_paths,
        }
    }

    /// Build a request from a validated selection and the configuration it names.
    pub fn from_selection(
        selection: &ValidatedSelection<'_>,
        configuration: Configuration,
    ) -> Self {
        Self::new(
            selection.classifier.path.clone(),
            configuration,
            selection.train_paths(),
            selection.test_paths(),
        )
    }

    pub fn with_run_command(mut self, run_command: impl Into<String>) -> Self {
        self.run_command = run_command.into();
        self
    }

    /// Expand the configuration and assemble every invocation.
    pub fn plan(&self) -> SweepPlan {
        let tuples = ParameterGrid::new(&self.configuration).tuples();
        let pairs = path_pairs(&self.train_paths, &self.test_paths);

        let mut invocations = Vec::with_capacity(tuples.len() * pairs.len());
        for (tuple_index, tuple) in tuples.iter().enumerate() {
            let base = base_command(&self.run_command, &self.classifier, tuple);
            for (train, test) in &pairs {
                invocations.push(Invocation {
                    line: format!("{base} {train} {test}"),
                    tuple_index,
                    train: train.clone(),
                    test: test.clone(),
                });
            }
        }

        SweepPlan {
            tuples,
            invocations,
        }
    }
}

/// Run command, classifier and tuple values, space separated.
pub fn base_command(run_command: &str, classifier: &str, tuple: &[f64]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(tuple.len() + 2);
    let run_command = run_command.trim();
    if !run_command.is_empty() {
        parts.push(run_command.to_string());
    }
    parts.push(classifier.to_string());
    parts.extend(tuple.iter().map(|v| format_value(*v)));
    parts.join(" ")
}

/// Every (train, test) pair, train-major. No train paths pair as one empty string.
pub fn path_pairs(train_paths: &[String], test_paths: &[String]) -> Vec<(String, String)> {
    let empty = [String::new()];
    let trains: &[String] = if train_paths.is_empty() {
        &empty
    } else {
        train_paths
    };

    trains
        .iter()
        .flat_map(|train| test_paths.iter().map(move |test| (train.clone(), test.clone())))
        .collect()
}

/// Expected invocation count: `tuples * max(1, trains) * tests`.
pub fn invocation_count(tuples: usize, trains: usize, tests: usize) -> usize {
    tuples * trains.max(1) * tests
}

/// The ordered work of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    tuples: Vec<Tuple>,
    invocations: Vec<Invocation>,
}

impl SweepPlan {
    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    /// Invocations in execution order.
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Invocation> {
        self.invocations.iter()
    }
}

impl<'a> IntoIterator for &'a SweepPlan {
    type Item = &'a Invocation;
    type IntoIter = std::slice::Iter<'a, Invocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
