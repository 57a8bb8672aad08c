//! Parameter grid: expands a configuration into every distinct value tuple.
//!
//! Each element becomes an [`Axis`] of grid points `start + k * step`. The
//! tuples are the Cartesian product of the axes, produced by a breadth-first
//! walk that starts at the all-`start` tuple and increments one coordinate at
//! a time. The walk runs over integer grid indices, so a lattice point is
//! reached once no matter how many neighbours lead to it, and coordinate
//! values are computed from the index rather than accumulated.

use std::collections::{HashSet, VecDeque};

use tracing::warn;

use crate::element::{Configuration, NumericElement};

/// One concrete value per configuration element, in configuration order.
pub type Tuple = Vec<f64>;

/// Largest number of tuples a configuration may span.
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// Absolute tolerance on the fractional part of `(end - start) / step`.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Scaled values at or above this magnitude have no fractional digits left to round.
const EXACT_INTEGER_LIMIT: f64 = 4.5e15;

/// Number of digits after the decimal point in the shortest text form of `value`.
///
/// `0.25` has 2, `3` has 0, `1e-12` has 12.
pub fn decimal_places(value: f64) -> u32 {
    let text = format!("{}", value.abs());
    text.split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as u32)
}

/// Round `value` to `places` decimal digits and fold `-0` into `0`.
///
/// Values the rounding cannot represent more exactly are returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    let rounded = match i32::try_from(places) {
        Ok(exp) if exp <= f64::MAX_10_EXP => {
            let scale = 10f64.powi(exp);
            let scaled = value * scale;
            if scaled.is_finite() && scaled.abs() < EXACT_INTEGER_LIMIT {
                scaled.round() / scale
            } else {
                value
            }
        }
        _ => value,
    };
    fold_negative_zero(rounded)
}

fn fold_negative_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Text rendering of one coordinate, as it appears on the command line.
pub fn format_value(value: f64) -> String {
    format!("{value}")
}

/// Canonical text of a whole tuple; the deduplication key.
pub fn tuple_key(tuple: &[f64]) -> String {
    let parts: Vec<String> = tuple.iter().map(|v| format_value(*v)).collect();
    format!("[{}]", parts.join(", "))
}

/// Grid points of a single element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Axis {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    pub fn from_element(element: &NumericElement) -> Self {
        let (start, end, step) = element.bounds();
        Self::new(start, end, step)
    }

    /// A fixed axis has exactly one point, `start`.
    ///
    /// Zero, negative and non-finite steps, and empty ranges, are all fixed.
    pub fn is_fixed(&self) -> bool {
        !(self.step > 0.0 && self.step.is_finite() && self.end > self.start)
    }

    /// Number of grid points, `ceil((end - start) / step) + 1`, or `None`
    /// when that count does not fit in a `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        if self.is_fixed() {
            return Some(1);
        }
        let ratio = (self.end - self.start) / self.step;
        if !ratio.is_finite() {
            return None;
        }
        let nearest = ratio.round();
        let tolerance = RATIO_TOLERANCE.max(4.0 * f64::EPSILON * ratio);
        let steps = if (ratio - nearest).abs() <= tolerance {
            nearest
        } else {
            ratio.ceil()
        };
        if steps >= usize::MAX as f64 {
            return None;
        }
        (steps as usize).checked_add(1)
    }

    /// [`Axis::checked_len`], saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// An axis always has at least one point.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value of grid point `k`.
    ///
    /// Point 0 is `start` as given. Later points are `start + k * step`
    /// rounded to the decimal resolution of `start` and `step`, so float
    /// drift never shows on the command line. The last point is clamped to
    /// `end` when `end` is not an exact multiple of `step` away from `start`.
    pub fn value_at(&self, k: usize) -> f64 {
        if k == 0 || self.is_fixed() {
            return fold_negative_zero(self.start);
        }
        let raw = self.start + k as f64 * self.step;
        if raw >= self.end {
            return fold_negative_zero(self.end);
        }
        let places = decimal_places(self.start).max(decimal_places(self.step));
        round_to(raw, places).min(self.end)
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.len()).map(|k| self.value_at(k)).collect()
    }
}

/// The Cartesian grid spanned by a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    axes: Vec<Axis>,
}

impl ParameterGrid {
    pub fn new(config: &Configuration) -> Self {
        Self::from_axes(config.iter().map(Axis::from_element).collect())
    }

    pub fn from_axes(axes: Vec<Axis>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of tuples the grid spans (saturating).
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// Number of tuples, or `None` when it does not fit in a `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        self.axes
            .iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.checked_len()?))
    }

    fn materialize(&self, indices: &[usize]) -> Tuple {
        self.axes
            .iter()
            .zip(indices)
            .map(|(axis, &k)| axis.value_at(k))
            .collect()
    }

    /// Every distinct tuple. The all-`start` tuple is always first.
    ///
    /// Tuples whose formatted text equals an earlier tuple are dropped. This
    /// only happens for steps below the float resolution of `start`.
    pub fn tuples(&self) -> Vec<Tuple> {
        let lens: Vec<usize> = self.axes.iter().map(Axis::len).collect();
        let base = vec![0usize; self.axes.len()];

        let mut visited: HashSet<Vec<usize>> = HashSet::new();
        let mut emitted: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
        let mut tuples = Vec::new();

        visited.insert(base.clone());
        queue.push_back(base);

        while let Some(indices) = queue.pop_front() {
            let tuple = self.materialize(&indices);
            let key = tuple_key(&tuple);
            if emitted.insert(key) {
                tuples.push(tuple);
            } else {
                warn!(tuple = %tuple_key(&tuple), "grid point collapsed onto an earlier tuple");
            }

            for (axis, &len) in lens.iter().enumerate() {
                if indices[axis] + 1 >= len {
                    continue;
                }
                let mut next = indices.clone();
                next[axis] += 1;
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }

        tuples
    }
}

/// Shorthand for `ParameterGrid::new(config).tuples()`.
pub fn enumerate(config: &Configuration) -> Vec<Tuple> {
    ParameterGrid::new(config).tuples()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(tuples: &[Tuple]) -> HashSet<String> {
        tuples.iter().map(|t| tuple_key(t)).collect()
    }

    #[test]
    fn parameters_only_yield_single_tuple() {
        let config = Configuration::new(
            "fixed",
            vec![
                NumericElement::parameter("a", 1.5),
                NumericElement::parameter("b", -3.0),
            ],
        );
        assert_eq!(enumerate(&config), vec![vec![1.5, -3.0]]);
    }

    #[test]
    fn single_variable_includes_both_ends() {
        let config = Configuration::new("v", vec![NumericElement::variable("v", 0.0, 2.0, 1.0)]);
        assert_eq!(enumerate(&config), vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn base_tuple_is_first() {
        let config = Configuration::new(
            "two",
            vec![
                NumericElement::variable("a", 5.0, 7.0, 1.0),
                NumericElement::variable("b", -2.0, 0.0, 1.0),
            ],
        );
        let tuples = enumerate(&config);
        assert_eq!(tuples[0], vec![5.0, -2.0]);
    }

    #[test]
    fn two_variables_form_full_product() {
        let config = Configuration::new(
            "two",
            vec![
                NumericElement::variable("v1", 2.0, 8.0, 2.0),
                NumericElement::variable("v2", -1.0, 2.0, 0.25),
            ],
        );
        let tuples = enumerate(&config);
        assert_eq!(tuples.len(), 4 * 13);
        assert_eq!(keys(&tuples).len(), 52);
    }

    #[test]
    fn drifting_step_does_not_duplicate_points() {
        let axis = Axis::new(0.0, 1.0, 0.1);
        assert_eq!(axis.len(), 11);
        let values = axis.values();
        assert_eq!(values[3], 0.3);
        assert_eq!(values[10], 1.0);
        assert_eq!(format_value(values[7]), "0.7");
    }

    #[test]
    fn uneven_range_clamps_last_point_to_end() {
        let axis = Axis::new(0.0, 1.0, 0.4);
        assert_eq!(axis.len(), 4);
        assert_eq!(axis.values(), vec![0.0, 0.4, 0.8, 1.0]);
    }

    #[test]
    fn zero_step_variable_is_fixed() {
        let axis = Axis::new(3.0, 10.0, 0.0);
        assert!(axis.is_fixed());
        assert_eq!(axis.values(), vec![3.0]);
    }

    #[test]
    fn point_range_is_fixed() {
        let axis = Axis::new(2.0, 2.0, 0.5);
        assert_eq!(axis.len(), 1);
    }

    #[test]
    fn negative_zero_is_folded() {
        assert_eq!(format_value(round_to(-0.0, 3)), "0");
        assert_eq!(format_value(Axis::new(-0.0, 0.0, 0.0).value_at(0)), "0");
        let axis = Axis::new(-0.5, 0.5, 0.25);
        assert_eq!(format_value(axis.value_at(2)), "0");
    }

    #[test]
    fn empty_configuration_has_one_empty_tuple() {
        let tuples = enumerate(&Configuration::default());
        assert_eq!(tuples, vec![Vec::<f64>::new()]);
    }

    #[test]
    fn grid_size_matches_tuples() {
        let grid = ParameterGrid::from_axes(vec![
            Axis::new(0.0, 4.0, 1.0),
            Axis::new(1.0, 1.0, 0.0),
            Axis::new(0.0, 0.5, 0.25),
        ]);
        assert_eq!(grid.size(), 15);
        assert_eq!(grid.tuples().len(), 15);
    }

    #[test]
    fn tuple_key_format() {
        assert_eq!(tuple_key(&[2.0, -0.75]), "[2, -0.75]");
    }

    #[test]
    fn tiny_parameter_passes_through() {
        let config = Configuration::new("eps", vec![NumericElement::parameter("eps", 1e-12)]);
        assert_eq!(enumerate(&config), vec![vec![1e-12]]);
    }

    #[test]
    fn step_below_nanounit_keeps_every_point() {
        let axis = Axis::new(1e-12, 5e-12, 1e-12);
        assert_eq!(axis.len(), 5);
        assert_eq!(axis.values(), vec![1e-12, 2e-12, 3e-12, 4e-12, 5e-12]);

        let config = Configuration::new(
            "lr",
            vec![NumericElement::variable("lr", 1e-12, 5e-12, 1e-12)],
        );
        assert_eq!(enumerate(&config).len(), 5);
    }

    #[test]
    fn start_precision_is_not_rounded_away() {
        let axis = Axis::new(0.123456789012, 0.323456789012, 0.1);
        assert_eq!(
            axis.values(),
            vec![0.123456789012, 0.223456789012, 0.323456789012]
        );
    }

    #[test]
    fn absurdly_fine_step_does_not_overflow() {
        let axis = Axis::new(0.0, 1.0, 1e-300);
        assert_eq!(axis.checked_len(), None);
        assert_eq!(axis.len(), usize::MAX);

        let grid = ParameterGrid::from_axes(vec![axis, Axis::new(0.0, 1.0, 0.5)]);
        assert_eq!(grid.checked_size(), None);
        assert_eq!(grid.size(), usize::MAX);
    }

    #[test]
    fn large_ratio_keeps_fractional_last_point() {
        let axis = Axis::new(0.0, 10_000_000.005, 1.0);
        assert_eq!(axis.len(), 10_000_002);
        assert_eq!(axis.value_at(10_000_000), 10_000_000.0);
        assert_eq!(axis.value_at(10_000_001), 10_000_000.005);
    }

    #[test]
    fn decimal_places_follow_shortest_text() {
        assert_eq!(decimal_places(3.0), 0);
        assert_eq!(decimal_places(-0.25), 2);
        assert_eq!(decimal_places(1e-12), 12);
    }
}
