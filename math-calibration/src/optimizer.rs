//! Generation loop and termination policy.
//!
//! One generation draws the differential weight from the root stream,
//! splits the stream into one child per candidate, builds every trial
//! vector in parallel, evaluates the trials, keeps each trial that strictly
//! improves on its parent, recomputes the best candidate and joins the
//! children back into the next root stream.

use std::fmt;

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::argmin::{argmin, improves};
use crate::crossover_binomial::binomial_crossover;
use crate::error::{CalibrationError, Result};
use crate::mutant_best_or_rand1::mutant_best_or_rand1;
use crate::parallel_eval::{evaluate_trials, map_streams};
use crate::population::{Bounds, Population};
use crate::stream::RngStream;
use crate::CalibrationConfig;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The generation cap was hit.
    MaxIterationsReached,
    /// The evaluation budget was used up.
    MaxEvaluationsReached,
    /// The best error reached the target.
    TargetReached,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::MaxIterationsReached => "maximum iterations reached",
            Status::MaxEvaluationsReached => "maximum evaluations reached",
            Status::TargetReached => "target error reached",
        };
        f.write_str(s)
    }
}

/// State handed to the observer after initialization and each generation.
pub struct GenerationSnapshot<'a> {
    /// Generations completed so far (0 right after initialization).
    pub generation: usize,
    /// Objective evaluations used so far.
    pub evaluations: usize,
    /// Trials accepted in this generation.
    pub accepted: usize,
    /// The population at the end of the generation.
    pub population: &'a Population,
}

impl GenerationSnapshot<'_> {
    /// Current best error.
    pub fn best_fitness(&self) -> f64 {
        self.population.best_fitness()
    }

    /// Index of the current best candidate.
    pub fn best_index(&self) -> usize {
        self.population.best_index()
    }
}

/// Result of a search over the free variables.
#[derive(Clone)]
pub struct OptimizationReport {
    /// Best free-variable vector.
    pub x: Array1<f64>,
    /// Objective value of `x`.
    pub fun: f64,
    /// Why the search stopped.
    pub status: Status,
    /// Number of generations run.
    pub nit: usize,
    /// Number of objective evaluations used.
    pub nfev: usize,
    /// Final population matrix (NP x n).
    pub population: Array2<f64>,
    /// Fitness values for each population member.
    pub population_energies: Array1<f64>,
}

impl fmt::Debug for OptimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationReport")
            .field("x", &format!("len={}", self.x.len()))
            .field("fun", &self.fun)
            .field("status", &self.status)
            .field("nit", &self.nit)
            .field("nfev", &self.nfev)
            .field(
                "population",
                &format!("{}x{}", self.population.nrows(), self.population.ncols()),
            )
            .finish()
    }
}

/// Differential evolution over a box of free variables.
///
/// Use [`Optimizer::new`] to create an instance, then call
/// [`run`](Self::run).
pub struct Optimizer<'a, F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    func: &'a F,
    bounds: Bounds,
    config: CalibrationConfig,
}

impl<'a, F> Optimizer<'a, F>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    /// Creates an optimizer for `func` over `bounds`.
    ///
    /// # Errors
    ///
    /// Returns `NoFreeVariables` for empty bounds, `DimensionMismatch` if the
    /// lower and upper arrays differ in length, `InvalidBounds` for an
    /// inverted or non-finite pair, and any error of
    /// [`CalibrationConfig::validate`].
    pub fn new(func: &'a F, bounds: Bounds, config: CalibrationConfig) -> Result<Self> {
        if bounds.lower.len() != bounds.upper.len() {
            return Err(CalibrationError::DimensionMismatch {
                expected: bounds.lower.len(),
                got: bounds.upper.len(),
            });
        }
        if bounds.dim() == 0 {
            return Err(CalibrationError::NoFreeVariables);
        }
        for (index, (&lower, &upper)) in bounds.lower.iter().zip(bounds.upper.iter()).enumerate() {
            if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
                return Err(CalibrationError::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        config.validate()?;

        Ok(Self {
            func,
            bounds,
            config,
        })
    }

    /// Run the search and return a report.
    ///
    /// With `parallel.num_threads` set, the run happens on a dedicated rayon
    /// pool of that size.
    pub fn run(&mut self) -> OptimizationReport {
        if let Some(n) = self.config.parallel.num_threads {
            match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => return pool.install(|| self.run_generations()),
                Err(e) => log::warn!("could not build a {}-thread pool, using the global one: {}", n, e),
            }
        }
        self.run_generations()
    }

    fn run_generations(&mut self) -> OptimizationReport {
        let npop = self.config.mutation.population_size;
        let termination = self.config.termination;

        log::info!(
            "calibration start: {} free dimensions, population={}, max_evaluations={}, seed={:#x}",
            self.bounds.dim(),
            npop,
            termination.max_evaluations,
            self.config.seed
        );

        let (mut pop, mut rng) = Population::initialize(
            &self.bounds,
            RngStream::new(self.config.seed),
            npop,
            self.func,
            &self.config.parallel,
        );
        let mut nfev = npop;
        let mut nit = 0usize;
        self.notify(nit, nfev, 0, &pop);

        let status = loop {
            if let Some(status) = self.termination_status(nit, nfev, pop.best_fitness()) {
                break status;
            }

            let (next, accepted) = self.step(&mut pop, rng);
            rng = next;
            nfev += npop;
            nit += 1;

            if self.config.print_interval > 0 && nit % self.config.print_interval == 0 {
                log::debug!(
                    "generation {:5}: best_f={:.6e} at {}, accepted={}/{}, nfev={}",
                    nit,
                    pop.best_fitness(),
                    pop.best_index(),
                    accepted,
                    npop,
                    nfev
                );
            }
            self.notify(nit, nfev, accepted, &pop);
        };

        log::info!(
            "calibration finished: {} after {} generations, nfev={}, best_f={:.6e}",
            status,
            nit,
            nfev,
            pop.best_fitness()
        );

        OptimizationReport {
            x: pop.best_candidate().to_owned(),
            fun: pop.best_fitness(),
            status,
            nit,
            nfev,
            population: pop.candidates,
            population_energies: pop.fitness,
        }
    }

    /// Checked before every generation; the target wins over the budget,
    /// the budget over the generation cap.
    fn termination_status(&self, nit: usize, nfev: usize, best: f64) -> Option<Status> {
        let t = &self.config.termination;
        if best <= t.target_error {
            Some(Status::TargetReached)
        } else if nfev >= t.max_evaluations {
            Some(Status::MaxEvaluationsReached)
        } else if nit >= t.max_iterations {
            Some(Status::MaxIterationsReached)
        } else {
            None
        }
    }

    /// Runs one generation in place and returns the next root stream and the
    /// number of accepted trials. Costs exactly `NP` evaluations.
    fn step(&self, pop: &mut Population, mut rng: RngStream) -> (RngStream, usize) {
        let m = &self.config.mutation;
        let f = m.f_min + (m.f_max - m.f_min) * rng.random::<f64>();
        let cr = m.crossover_rate;
        let mut streams = rng.split(pop.size());

        let candidates = &pop.candidates;
        let best = pop.best;
        let bounds = &self.bounds;
        let trials = map_streams(&mut streams, &self.config.parallel, |i, local| {
            let mutant = mutant_best_or_rand1(i, candidates, best, f, local);
            binomial_crossover(candidates.row(i), &mutant, bounds, cr, local)
        });
        let trial_fitness = evaluate_trials(&trials, self.func, &self.config.parallel);

        let mut accepted = 0usize;
        for (i, (trial, fitness)) in trials.into_iter().zip(trial_fitness).enumerate() {
            if improves(fitness, pop.fitness[i]) {
                pop.candidates.row_mut(i).assign(&trial);
                pop.fitness[i] = fitness;
                accepted += 1;
            }
        }
        let (best, _) = argmin(&pop.fitness);
        pop.best = best;

        (RngStream::join(&streams), accepted)
    }

    fn notify(&mut self, generation: usize, evaluations: usize, accepted: usize, pop: &Population) {
        if let Some(cb) = self.config.callback.as_mut() {
            cb(&GenerationSnapshot {
                generation,
                evaluations,
                accepted,
                population: pop,
            });
        }
    }
}
