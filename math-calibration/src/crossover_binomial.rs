use ndarray::{Array1, ArrayView1};
use rand::Rng;

use crate::population::Bounds;

/// Binomial crossover with component-wise bound repair.
///
/// One dimension `jrand` always takes the mutant's value, every other
/// dimension does so with probability `cr`. A mutant component outside its
/// bounds is never taken: the parent's value is kept instead, so a trial
/// built from an in-bounds parent stays in bounds.
pub(crate) fn binomial_crossover<R: Rng + ?Sized>(
    target: ArrayView1<'_, f64>,
    mutant: &Array1<f64>,
    bounds: &Bounds,
    cr: f64,
    rng: &mut R,
) -> Array1<f64> {
    let n = target.len();
    let jrand = rng.random_range(0..n);
    let mut trial = target.to_owned();
    for j in 0..n {
        let crossed = rng.random::<f64>() <= cr;
        let inside = bounds.lower[j] <= mutant[j] && mutant[j] <= bounds.upper[j];
        if (j == jrand || crossed) && inside {
            trial[j] = mutant[j];
        }
    }
    trial
}
