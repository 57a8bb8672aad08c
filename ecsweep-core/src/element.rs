//! Numeric elements: the fixed parameters and ranged variables of a sweep.
//!
//! A [`Configuration`] is an ordered list of elements. Order matters: it is
//! the positional order of the numeric arguments handed to the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{Axis, ParameterGrid, MAX_GRID_POINTS};

/// Errors raised by [`validate_elements`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("the increase step of variable '{name}' is a negative value ({step})")]
    NegativeStep { name: String, step: f64 },

    #[error("the start value of variable '{name}' ({start}) is higher than the end value ({end})")]
    StartAfterEnd { name: String, start: f64, end: f64 },

    #[error("element '{name}' holds a non-finite number")]
    NonFinite { name: String },

    #[error("variable '{name}' spans more than {limit} grid points")]
    TooManyPoints { name: String, limit: usize },

    #[error("configuration spans more than {limit} tuples")]
    GridTooLarge { limit: usize },
}

/// A single named numeric input of the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericElement {
    /// Fixed scalar, passed unchanged to every invocation.
    Parameter { name: String, value: f64 },

    /// Ranged scalar, expanded into `start, start + step, ...` up to `end`.
    Variable {
        name: String,
        start: f64,
        end: f64,
        step: f64,
    },
}

impl NumericElement {
    pub fn parameter(name: impl Into<String>, value: f64) -> Self {
        Self::Parameter {
            name: name.into(),
            value,
        }
    }

    pub fn variable(name: impl Into<String>, start: f64, end: f64, step: f64) -> Self {
        Self::Variable {
            name: name.into(),
            start,
            end,
            step,
        }
    }

    /// Rebuild an element from a stored `(start, end, step)` row.
    ///
    /// Rows with a zero step hold a fixed value in `start`.
    pub fn from_stored(name: impl Into<String>, start: f64, end: f64, step: f64) -> Self {
        if step == 0.0 {
            Self::parameter(name, start)
        } else {
            Self::variable(name, start, end, step)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Parameter { name, .. } | Self::Variable { name, .. } => name,
        }
    }

    /// Scalar `(start, end, step)` triple. A parameter maps to `(value, value, 0)`.
    pub fn bounds(&self) -> (f64, f64, f64) {
        match *self {
            Self::Parameter { value, .. } => (value, value, 0.0),
            Self::Variable {
                start, end, step, ..
            } => (start, end, step),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable { .. })
    }
}

impl fmt::Display for NumericElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter { name, value } => write!(f, "{name} {value}"),
            Self::Variable {
                name,
                start,
                end,
                step,
            } => write!(f, "{name} {start} {end} {step}"),
        }
    }
}

/// A named, ordered set of numeric elements defining one sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub elements: Vec<NumericElement>,
}

impl Configuration {
    pub fn new(name: impl Into<String>, elements: Vec<NumericElement>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumericElement> {
        self.elements.iter()
    }

    /// Number of ranged elements.
    pub fn variable_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_variable()).count()
    }

    pub fn validate(&self) -> Result<(), ElementError> {
        validate_elements(self)
    }
}

/// Check that every variable has a non-negative step and `start <= end`,
/// and that the grid stays within [`MAX_GRID_POINTS`] tuples.
///
/// Returns the first offending element. A zero step is accepted; the grid
/// treats such a variable as fixed.
pub fn validate_elements(config: &Configuration) -> Result<(), ElementError> {
    for element in &config.elements {
        let (start, end, step) = element.bounds();
        if !(start.is_finite() && end.is_finite() && step.is_finite()) {
            return Err(ElementError::NonFinite {
                name: element.name().to_string(),
            });
        }
        if let NumericElement::Variable { name, .. } = element {
            if step < 0.0 {
                return Err(ElementError::NegativeStep {
                    name: name.clone(),
                    step,
                });
            }
            if start > end {
                return Err(ElementError::StartAfterEnd {
                    name: name.clone(),
                    start,
                    end,
                });
            }
            let points = Axis::from_element(element).checked_len();
            if points.map_or(true, |n| n > MAX_GRID_POINTS) {
                return Err(ElementError::TooManyPoints {
                    name: name.clone(),
                    limit: MAX_GRID_POINTS,
                });
            }
        }
    }
    let size = ParameterGrid::new(config).checked_size();
    if size.map_or(true, |n| n > MAX_GRID_POINTS) {
        return Err(ElementError::GridTooLarge {
            limit: MAX_GRID_POINTS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_bounds_have_zero_step() {
        let p = NumericElement::parameter("alpha", 0.5);
        assert_eq!(p.bounds(), (0.5, 0.5, 0.0));
        assert!(!p.is_variable());
    }

    #[test]
    fn variable_bounds_pass_through() {
        let v = NumericElement::variable("v1", 2.0, 8.0, 2.0);
        assert_eq!(v.bounds(), (2.0, 8.0, 2.0));
        assert_eq!(v.name(), "v1");
    }

    #[test]
    fn stored_row_with_zero_step_is_parameter() {
        let e = NumericElement::from_stored("c", 3.0, 9.0, 0.0);
        assert_eq!(e, NumericElement::parameter("c", 3.0));

        let e = NumericElement::from_stored("v", 3.0, 9.0, 1.5);
        assert_eq!(e, NumericElement::variable("v", 3.0, 9.0, 1.5));
    }

    #[test]
    fn display_matches_row_layout() {
        assert_eq!(NumericElement::parameter("k", 4.0).to_string(), "k 4");
        assert_eq!(
            NumericElement::variable("v", -1.0, 2.0, 0.25).to_string(),
            "v -1 2 0.25"
        );
    }

    #[test]
    fn validation_rejects_negative_step() {
        let config = Configuration::new(
            "bad",
            vec![
                NumericElement::parameter("p", 1.0),
                NumericElement::variable("v", 0.0, 1.0, -0.5),
            ],
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ElementError::NegativeStep { ref name, .. } if name == "v"));
    }

    #[test]
    fn validation_rejects_start_after_end() {
        let config = Configuration::new("bad", vec![NumericElement::variable("v", 5.0, 1.0, 1.0)]);
        assert!(matches!(
            validate_elements(&config),
            Err(ElementError::StartAfterEnd { .. })
        ));
    }

    #[test]
    fn validation_rejects_nan() {
        let config = Configuration::new("bad", vec![NumericElement::parameter("p", f64::NAN)]);
        assert!(matches!(
            validate_elements(&config),
            Err(ElementError::NonFinite { .. })
        ));
    }

    #[test]
    fn validation_accepts_zero_step_and_point_range() {
        let config = Configuration::new(
            "ok",
            vec![
                NumericElement::variable("flat", 1.0, 4.0, 0.0),
                NumericElement::variable("point", 2.0, 2.0, 1.0),
            ],
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.variable_count(), 2);
    }

    #[test]
    fn validation_rejects_step_too_fine_for_the_range() {
        let config = Configuration::new(
            "fine",
            vec![NumericElement::variable("v", 0.0, 1.0, 1e-300)],
        );
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ElementError::TooManyPoints {
                name: "v".into(),
                limit: MAX_GRID_POINTS,
            }
        );
    }

    #[test]
    fn validation_rejects_oversized_product() {
        // 5_001 points per axis stays under the per-axis limit, not the product.
        let config = Configuration::new(
            "wide",
            vec![
                NumericElement::variable("a", 0.0, 5_000.0, 1.0),
                NumericElement::variable("b", 0.0, 5_000.0, 1.0),
            ],
        );
        assert_eq!(
            config.validate(),
            Err(ElementError::GridTooLarge {
                limit: MAX_GRID_POINTS
            })
        );
    }
}
