//! Selection validation: gate a sweep before any process is spawned.
//!
//! A run needs exactly one classifier, exactly one configuration, at least
//! one test set and any number of train sets. Every selected item that names
//! a file must point at an existing regular file.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four selection roles of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Classifier,
    Configuration,
    TrainSet,
    TestSet,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Classifier,
        Role::Configuration,
        Role::TrainSet,
        Role::TestSet,
    ];

    /// Whether items of this role reference a file on disk.
    pub fn names_file(self) -> bool {
        !matches!(self, Role::Configuration)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Classifier => "classifier",
            Role::Configuration => "configuration",
            Role::TrainSet => "train set",
            Role::TestSet => "test set",
        };
        f.write_str(label)
    }
}

/// Cardinality failure for one role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("exactly one {role} required, found {found}")]
    ExactlyOneRequired { role: Role, found: usize },

    #[error("at least one {role} required")]
    AtLeastOneRequired { role: Role },
}

impl SelectionError {
    pub fn role(&self) -> Role {
        match self {
            Self::ExactlyOneRequired { role, .. } | Self::AtLeastOneRequired { role } => *role,
        }
    }
}

/// One or more selected files do not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid paths of the following files: {}", list_names(.missing))]
pub struct PathError {
    pub missing: Vec<SelectedItem>,
}

fn list_names(items: &[SelectedItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({})", item.name, item.path))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A catalog item the user selected for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedItem {
    pub role: Role,
    pub name: String,
    /// File path. Empty for configurations.
    pub path: String,
}

impl SelectedItem {
    pub fn new(role: Role, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            path: path.into(),
        }
    }

    /// Whether `path` names an existing regular file.
    pub fn exists(&self) -> bool {
        Path::new(&self.path).is_file()
    }
}

/// The currently selected items, one collection per role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub classifiers: Vec<SelectedItem>,
    pub configurations: Vec<SelectedItem>,
    pub train_sets: Vec<SelectedItem>,
    pub test_sets: Vec<SelectedItem>,
}

impl Selections {
    pub fn by_role(&self, role: Role) -> &[SelectedItem] {
        match role {
            Role::Classifier => &self.classifiers,
            Role::Configuration => &self.configurations,
            Role::TrainSet => &self.train_sets,
            Role::TestSet => &self.test_sets,
        }
    }

    /// Add an item to the collection matching its role.
    pub fn push(&mut self, item: SelectedItem) {
        match item.role {
            Role::Classifier => self.classifiers.push(item),
            Role::Configuration => self.configurations.push(item),
            Role::TrainSet => self.train_sets.push(item),
            Role::TestSet => self.test_sets.push(item),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedItem> {
        Role::ALL.into_iter().flat_map(|role| self.by_role(role).iter())
    }
}

/// A selection that passed [`validate`].
#[derive(Debug, Clone, Copy)]
pub struct ValidatedSelection<'a> {
    pub classifier: &'a SelectedItem,
    pub configuration: &'a SelectedItem,
    /// May be empty: no train data.
    pub train_sets: &'a [SelectedItem],
    pub test_sets: &'a [SelectedItem],
}

impl ValidatedSelection<'_> {
    pub fn train_paths(&self) -> Vec<String> {
        self.train_sets.iter().map(|i| i.path.clone()).collect()
    }

    pub fn test_paths(&self) -> Vec<String> {
        self.test_sets.iter().map(|i| i.path.clone()).collect()
    }
}

/// Every cardinality violation, in role order.
///
/// Used to report all offending roles at once; [`validate`] stops at the first.
pub fn cardinality_errors(selections: &Selections) -> Vec<SelectionError> {
    let mut errors = Vec::new();
    for role in Role::ALL {
        let found = selections.by_role(role).len();
        match role {
            Role::Classifier | Role::Configuration if found != 1 => {
                errors.push(SelectionError::ExactlyOneRequired { role, found });
            }
            Role::TestSet if found == 0 => {
                errors.push(SelectionError::AtLeastOneRequired { role });
            }
            _ => {}
        }
    }
    errors
}

/// Check role cardinalities. Pure: no file system access.
pub fn validate(selections: &Selections) -> Result<ValidatedSelection<'_>, SelectionError> {
    if let Some(err) = cardinality_errors(selections).into_iter().next() {
        return Err(err);
    }
    Ok(ValidatedSelection {
        classifier: &selections.classifiers[0],
        configuration: &selections.configurations[0],
        train_sets: &selections.train_sets,
        test_sets: &selections.test_sets,
    })
}

/// Every selected file-backed item whose file does not exist.
///
/// Configurations are exempt. An empty list means every path is valid.
pub fn validate_paths(selections: &Selections) -> Vec<SelectedItem> {
    selections
        .iter()
        .filter(|item| item.role.names_file() && !item.exists())
        .cloned()
        .collect()
}

/// [`validate_paths`] as a `Result`, carrying the full list on failure.
pub fn ensure_paths_exist(selections: &Selections) -> Result<(), PathError> {
    let missing = validate_paths(selections);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PathError { missing })
    }
}
