//! Fixed and optimizable inputs of the objective function.
//!
//! The objective always sees the full input vector. The search only sees the
//! compact vector of free (optimized) inputs; [`partition`] builds the map
//! between the two and [`FreeVariableMap::expand`] rebuilds a full vector.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, Result};

/// Bounds and seed value of one optimizable input.
///
/// `lower_bound <= initial_value <= upper_bound` is expected but only the
/// bounds themselves are checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Smallest admissible value.
    pub lower_bound: f64,
    /// Largest admissible value.
    pub upper_bound: f64,
    /// Value reported when the search is disabled (zero budget).
    pub initial_value: f64,
}

impl Range {
    /// Creates a new range.
    pub fn new(lower_bound: f64, upper_bound: f64, initial_value: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            initial_value,
        }
    }

    /// Returns `true` if `x` lies within `[lower_bound, upper_bound]`.
    #[inline]
    pub fn contains(&self, x: f64) -> bool {
        self.lower_bound <= x && x <= self.upper_bound
    }
}

/// One input of the objective function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationVariable {
    /// Held at a constant value, never searched.
    Fixed(f64),
    /// Searched within a range.
    Optimized(Range),
}

/// Where a full-vector position takes its value from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Fixed(f64),
    Free(usize),
}

/// Map from every input position to a fixed value or a free-vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeVariableMap {
    slots: Vec<Slot>,
    num_free: usize,
}

/// Splits `variables` into the ranges of the free inputs (in original order)
/// and the map used to rebuild full vectors.
///
/// # Errors
///
/// Returns `CalibrationError::InvalidBounds` if a range has
/// `lower_bound > upper_bound` or a non-finite bound.
pub fn partition(variables: &[OptimizationVariable]) -> Result<(Vec<Range>, FreeVariableMap)> {
    let mut ranges = Vec::new();
    let mut slots = Vec::with_capacity(variables.len());
    for (index, variable) in variables.iter().enumerate() {
        match *variable {
            OptimizationVariable::Fixed(value) => slots.push(Slot::Fixed(value)),
            OptimizationVariable::Optimized(range) => {
                let ok = range.lower_bound.is_finite()
                    && range.upper_bound.is_finite()
                    && range.lower_bound <= range.upper_bound;
                if !ok {
                    return Err(CalibrationError::InvalidBounds {
                        index,
                        lower: range.lower_bound,
                        upper: range.upper_bound,
                    });
                }
                slots.push(Slot::Free(ranges.len()));
                ranges.push(range);
            }
        }
    }
    let num_free = ranges.len();
    Ok((ranges, FreeVariableMap { slots, num_free }))
}

impl FreeVariableMap {
    /// Number of inputs of the objective function.
    pub fn num_vars(&self) -> usize {
        self.slots.len()
    }

    /// Number of optimized inputs.
    pub fn num_free_vars(&self) -> usize {
        self.num_free
    }

    /// Returns the free-vector index of input `position`, or `None` if fixed.
    pub fn free_index(&self, position: usize) -> Option<usize> {
        match self.slots.get(position)? {
            Slot::Free(k) => Some(*k),
            Slot::Fixed(_) => None,
        }
    }

    /// Rebuilds the full input vector from a free-variable vector.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationError::DimensionMismatch` if `free` does not have
    /// exactly `num_free_vars()` entries.
    pub fn expand(&self, free: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if free.len() != self.num_free {
            return Err(CalibrationError::DimensionMismatch {
                expected: self.num_free,
                got: free.len(),
            });
        }
        Ok(self.expand_unchecked(free))
    }

    /// Length-checked by the caller: used on the hot path where every free
    /// vector comes out of the population.
    pub(crate) fn expand_unchecked(&self, free: ArrayView1<'_, f64>) -> Array1<f64> {
        self.slots
            .iter()
            .map(|slot| match *slot {
                Slot::Fixed(value) => value,
                Slot::Free(k) => free[k],
            })
            .collect()
    }
}
