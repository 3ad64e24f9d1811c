use ndarray::Array2;
use rand::Rng;

use crate::parallel_eval::{ParallelConfig, map_streams};
use crate::population::Bounds;
use crate::stream::RngStream;

/// Uniform initialization: row `i` is drawn from `streams[i]`, one draw per
/// dimension, in dimension order.
pub(crate) fn init_random(
    bounds: &Bounds,
    streams: &mut [RngStream],
    parallel: &ParallelConfig,
) -> Array2<f64> {
    let n = bounds.dim();
    let npop = streams.len();
    let rows = map_streams(streams, parallel, |_, rng| {
        (0..n)
            .map(|j| {
                let (lo, hi) = (bounds.lower[j], bounds.upper[j]);
                let u: f64 = rng.random::<f64>();
                // Finite even when `hi - lo` overflows.
                (lo * (1.0 - u) + hi * u).clamp(lo, hi)
            })
            .collect::<Vec<f64>>()
    });

    let mut pop = Array2::<f64>::zeros((npop, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, x) in row.into_iter().enumerate() {
            pop[(i, j)] = x;
        }
    }
    pop
}
