//! ecsweep core: domain types and the pure half of the sweep engine.
//!
//! - Numeric elements (fixed parameters, ranged variables) and configurations
//! - Selection validation (role cardinality, file existence)
//! - Parameter grid enumeration with drift-free coordinates
//! - Invocation assembly into an ordered sweep plan
//!
//! Nothing in this crate spawns processes; see `ecsweep-runner`.

pub mod element;
pub mod grid;
pub mod invocation;
pub mod selection;

pub use element::{validate_elements, Configuration, ElementError, NumericElement};
pub use grid::{
    decimal_places, enumerate, format_value, round_to, tuple_key, Axis, ParameterGrid, Tuple,
    MAX_GRID_POINTS,
};
pub use invocation::{
    base_command, invocation_count, path_pairs, Invocation, SweepPlan, SweepRequest,
    DEFAULT_RUN_COMMAND,
};
pub use selection::{
    cardinality_errors, ensure_paths_exist, validate, validate_paths, PathError, Role,
    SelectedItem, SelectionError, Selections, ValidatedSelection,
};
