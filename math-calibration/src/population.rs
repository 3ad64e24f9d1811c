//! Population state: candidates, their fitness, and the current best.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};

use crate::argmin::argmin;
use crate::init_random::init_random;
use crate::parallel_eval::{ParallelConfig, evaluate_population};
use crate::stream::RngStream;
use crate::variable::Range;

/// Per-dimension search bounds of the free variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    /// Lower bound of every free dimension.
    pub lower: Array1<f64>,
    /// Upper bound of every free dimension.
    pub upper: Array1<f64>,
}

impl Bounds {
    /// Creates bounds from matching lower/upper arrays.
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        Self { lower, upper }
    }

    /// Collects the bounds of a list of ranges.
    pub fn from_ranges(ranges: &[Range]) -> Self {
        Self {
            lower: ranges.iter().map(|r| r.lower_bound).collect(),
            upper: ranges.iter().map(|r| r.upper_bound).collect(),
        }
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Returns `true` if every coordinate of `x` lies within its bounds.
    pub fn contains(&self, x: ArrayView1<'_, f64>) -> bool {
        x.len() == self.dim()
            && Zip::from(&x)
                .and(&self.lower)
                .and(&self.upper)
                .all(|&v, &lo, &hi| lo <= v && v <= hi)
    }
}

/// Candidates of one generation with their fitness values.
///
/// `fitness[i]` is always the objective value of row `i` of `candidates`,
/// and `best` is the lowest-index row among those with the best fitness.
#[derive(Debug, Clone)]
pub struct Population {
    pub(crate) candidates: Array2<f64>,
    pub(crate) fitness: Array1<f64>,
    pub(crate) best: usize,
}

impl Population {
    /// Draws `npop` candidates uniformly within `bounds` and evaluates them.
    ///
    /// Costs exactly `npop` objective evaluations. Returns the population
    /// and the continuation of `rng`. `npop` must be positive; callers go
    /// through [`CalibrationConfig::validate`](crate::CalibrationConfig::validate).
    pub(crate) fn initialize<F>(
        bounds: &Bounds,
        rng: RngStream,
        npop: usize,
        objective: &F,
        parallel: &ParallelConfig,
    ) -> (Self, RngStream)
    where
        F: Fn(&Array1<f64>) -> f64 + Sync,
    {
        debug_assert!(npop > 0, "population must not be empty");
        let mut streams = rng.split(npop);
        let candidates = init_random(bounds, &mut streams, parallel);
        let fitness = evaluate_population(&candidates, objective, parallel);
        let (best, _) = argmin(&fitness);
        let population = Self {
            candidates,
            fitness,
            best,
        };
        (population, RngStream::join(&streams))
    }

    /// Number of candidates.
    pub fn size(&self) -> usize {
        self.candidates.nrows()
    }

    /// All candidates, one per row.
    pub fn candidates(&self) -> ArrayView2<'_, f64> {
        self.candidates.view()
    }

    /// Fitness of every candidate.
    pub fn fitness(&self) -> ArrayView1<'_, f64> {
        self.fitness.view()
    }

    /// Index of the best candidate.
    pub fn best_index(&self) -> usize {
        self.best
    }

    /// The best candidate vector.
    pub fn best_candidate(&self) -> ArrayView1<'_, f64> {
        self.candidates.row(self.best)
    }

    /// Fitness of the best candidate.
    pub fn best_fitness(&self) -> f64 {
        self.fitness[self.best]
    }
}
