use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::stream::RngStream;

/// Parallel evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Enable parallel evaluation
    pub enabled: bool,
    /// Number of threads to use (None = use rayon default)
    pub num_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None, // Use rayon's default (typically num_cpus)
        }
    }
}

/// Evaluate every row of `population`.
///
/// Each row is evaluated exactly once; the result at index `i` belongs to
/// row `i` whatever the evaluation order.
pub fn evaluate_population<F>(
    population: &Array2<f64>,
    eval_fn: &F,
    config: &ParallelConfig,
) -> Array1<f64>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    let npop = population.nrows();

    if !config.enabled || npop < 4 {
        return population
            .axis_iter(Axis(0))
            .map(|row| eval_fn(&row.to_owned()))
            .collect();
    }

    let results = (0..npop)
        .into_par_iter()
        .map(|i| eval_fn(&population.row(i).to_owned()))
        .collect::<Vec<f64>>();

    Array1::from_vec(results)
}

/// Evaluate trial vectors, one result per trial, in trial order.
pub fn evaluate_trials<F>(trials: &[Array1<f64>], eval_fn: &F, config: &ParallelConfig) -> Vec<f64>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    if !config.enabled || trials.len() < 4 {
        return trials.iter().map(eval_fn).collect();
    }

    trials.par_iter().map(eval_fn).collect()
}

/// Run `task` once per stream, handing it the stream's index and exclusive
/// ownership of the stream for the duration of the call.
///
/// Results come back in stream order.
pub(crate) fn map_streams<T, G>(
    streams: &mut [RngStream],
    config: &ParallelConfig,
    task: G,
) -> Vec<T>
where
    T: Send,
    G: Fn(usize, &mut RngStream) -> T + Sync + Send,
{
    if !config.enabled || streams.len() < 4 {
        return streams
            .iter_mut()
            .enumerate()
            .map(|(i, rng)| task(i, rng))
            .collect();
    }

    streams
        .par_iter_mut()
        .enumerate()
        .map(|(i, rng)| task(i, rng))
        .collect()
}
