use std::cmp::Ordering;

use ndarray::Array1;
use rayon::prelude::*;

/// Orders two fitness values for minimization: finite values beat
/// non-finite ones, lower beats higher, non-finite values tie.
#[inline]
pub(crate) fn compare_fitness(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Returns `true` if `trial` is strictly better than `parent`.
#[inline]
pub(crate) fn improves(trial: f64, parent: f64) -> bool {
    compare_fitness(trial, parent) == Ordering::Less
}

/// Picks the better of two `(index, fitness)` pairs; equal fitness goes to
/// the lower index. The operation is associative and commutative, so any
/// reduction tree gives the same answer.
#[inline]
pub(crate) fn better(a: (usize, f64), b: (usize, f64)) -> (usize, f64) {
    match compare_fitness(a.1, b.1).then(a.0.cmp(&b.0)) {
        Ordering::Greater => b,
        _ => a,
    }
}

/// Index and value of the best fitness, reduced in parallel.
///
/// `v` must not be empty.
pub(crate) fn argmin(v: &Array1<f64>) -> (usize, f64) {
    let slice = v.as_slice();
    match slice {
        Some(s) => s
            .par_iter()
            .copied()
            .enumerate()
            .reduce(|| (usize::MAX, f64::NAN), better),
        None => v
            .iter()
            .copied()
            .enumerate()
            .fold((usize::MAX, f64::NAN), better),
    }
}
