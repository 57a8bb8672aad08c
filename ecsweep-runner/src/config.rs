//! TOML sweep file: the catalog of classifiers, configurations and data sets.
//!
//! Every catalog item carries a `selected` flag (default `true`). Only
//! selected items take part in a run; the rest stay in the file for later.
//!
//! Relative `path` entries and a relative `output_folder` are resolved
//! against the directory holding the sweep file when it is loaded with
//! [`SweepFile::from_file`], so a run does not depend on the working
//! directory. A file parsed with [`SweepFile::from_toml`] has no base
//! directory and keeps its paths as written.
//!
//! ```toml
//! [sweep]
//! run_command = "java -jar"
//! output_folder = "output"
//!
//! [[classifiers]]
//! name = "EC1"
//! path = "bin/ec1.jar"
//!
//! [[configurations]]
//! name = "grid"
//! elements = [
//!   { name = "v1", start = 2.0, end = 8.0, step = 2.0 },
//!   { name = "alpha", value = 0.5 },
//! ]
//!
//! [[test_sets]]
//! name = "test1"
//! path = "data/test1.csv"
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use ecsweep_core::{
    ensure_paths_exist, validate, Configuration, NumericElement, Role, SelectedItem, Selections,
    SweepRequest, DEFAULT_RUN_COMMAND,
};

use crate::executor::SweepError;

/// Errors reading a sweep file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("selected configuration '{0}' is not defined")]
    UnknownConfiguration(String),
}

/// Top-level sweep file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepFile {
    #[serde(default)]
    pub sweep: SweepSettings,
    #[serde(default)]
    pub classifiers: Vec<CatalogEntry>,
    #[serde(default)]
    pub configurations: Vec<ConfigurationEntry>,
    #[serde(default)]
    pub train_sets: Vec<CatalogEntry>,
    #[serde(default)]
    pub test_sets: Vec<CatalogEntry>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// `[sweep]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Prefix placed before the classifier path. Empty runs the classifier directly.
    #[serde(default = "default_run_command")]
    pub run_command: String,
    #[serde(default = "default_output_folder")]
    pub output_folder: PathBuf,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            run_command: default_run_command(),
            output_folder: default_output_folder(),
        }
    }
}

fn default_run_command() -> String {
    DEFAULT_RUN_COMMAND.to_string()
}

fn default_output_folder() -> PathBuf {
    PathBuf::from("output")
}

fn default_selected() -> bool {
    true
}

/// A file-backed catalog item: classifier, train set or test set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub path: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
}

/// A named configuration with its numeric elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    pub name: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
    #[serde(default)]
    pub elements: Vec<ElementEntry>,
}

/// One element row: either `{ name, value }` or `{ name, start, end, step }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementEntry {
    Fixed {
        name: String,
        value: f64,
    },
    Ranged {
        name: String,
        start: f64,
        end: f64,
        step: f64,
    },
}

impl ElementEntry {
    /// A ranged row with a zero step becomes a parameter holding `start`.
    pub fn to_element(&self) -> NumericElement {
        match self {
            Self::Fixed { name, value } => NumericElement::parameter(name.clone(), *value),
            Self::Ranged {
                name,
                start,
                end,
                step,
            } => NumericElement::from_stored(name.clone(), *start, *end, *step),
        }
    }
}

impl ConfigurationEntry {
    pub fn to_configuration(&self) -> Configuration {
        Configuration::new(
            self.name.clone(),
            self.elements.iter().map(ElementEntry::to_element).collect(),
        )
    }
}

impl SweepFile {
    /// Load a sweep file from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        let file = Self::from_toml(&content)?.with_base_dir(base_dir);
        debug!(
            path = %path.display(),
            classifiers = file.classifiers.len(),
            configurations = file.configurations.len(),
            "loaded sweep file"
        );
        Ok(file)
    }

    /// Parse a sweep file from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Directory that relative paths are resolved against.
    pub fn with_base_dir(mut self, base_dir: Option<PathBuf>) -> Self {
        self.base_dir = base_dir;
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() && !path.as_os_str().is_empty() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// `[sweep] output_folder`, resolved against the base directory.
    pub fn output_folder(&self) -> PathBuf {
        self.resolve_path(&self.sweep.output_folder)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Selected items, grouped by role.
    pub fn selections(&self) -> Selections {
        let mut selections = Selections::default();
        let file_roles = [
            (Role::Classifier, &self.classifiers),
            (Role::TrainSet, &self.train_sets),
            (Role::TestSet, &self.test_sets),
        ];
        for (role, entries) in file_roles {
            for entry in entries.iter().filter(|e| e.selected) {
                let path = self.resolve_path(Path::new(&entry.path));
                selections.push(SelectedItem::new(
                    role,
                    &entry.name,
                    path.to_string_lossy(),
                ));
            }
        }
        for entry in self.configurations.iter().filter(|e| e.selected) {
            selections.push(SelectedItem::new(Role::Configuration, &entry.name, ""));
        }
        selections
    }

    /// Look up a configuration by name, selected or not.
    pub fn configuration(&self, name: &str) -> Option<Configuration> {
        self.configurations
            .iter()
            .find(|c| c.name == name)
            .map(ConfigurationEntry::to_configuration)
    }

    /// Validate the selection and turn it into an engine request.
    ///
    /// Checks role cardinality first, then that every selected file exists,
    /// then the configuration's elements. Nothing is spawned.
    pub fn resolve(&self) -> Result<SweepRequest, SweepError> {
        let selections = self.selections();
        let validated = validate(&selections)?;
        ensure_paths_exist(&selections)?;

        let name = &validated.configuration.name;
        let configuration = self
            .configuration(name)
            .ok_or_else(|| ConfigError::UnknownConfiguration(name.clone()))?;
        configuration.validate()?;

        Ok(SweepRequest::from_selection(&validated, configuration)
            .with_run_command(self.sweep.run_command.clone()))
    }
}
