//! Derivative-free parameter calibration.
//!
//! This crate fits the inputs of an objective function by minimizing its
//! scalar error with a population-based differential evolution search.
//! Inputs are either fixed or bounded; only the bounded ones are searched.
//!
//! # Features
//!
//! - Hybrid best/rand mutation with a per-generation differential weight
//! - Binomial crossover with component-wise bound repair
//! - Counter-based splittable random streams: reproducible runs whatever
//!   the thread schedule
//! - Parallel initialization, mutation and evaluation with rayon
//! - Deterministic best-candidate reduction (ties go to the lowest index)
//! - Hard evaluation budget
//!
//! # Example
//!
//! ```rust
//! use math_audio_calibration::{OptimizationVariable, Range, fit};
//! use ndarray::Array1;
//!
//! // Recover the centre of a shifted paraboloid; the second input is fixed.
//! let variables = vec![
//!     OptimizationVariable::Optimized(Range::new(-5.0, 5.0, 0.0)),
//!     OptimizationVariable::Fixed(2.0),
//! ];
//! let objective = |x: &Array1<f64>| (x[0] - 1.5).powi(2) + x[1];
//!
//! let result = fit(&variables, &objective, 2_000, 20).expect("valid configuration");
//!
//! assert!((result.parameters[0] - 1.5).abs() < 1e-3);
//! assert_eq!(result.parameters[1], 2.0);
//! assert_eq!(result.evaluations_used % 20, 0);
//! ```
#![warn(missing_docs)]

pub mod error;
pub use error::{CalibrationError, Result};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Splittable random streams.
pub mod stream;
/// Fixed and optimizable inputs, and the free-variable adapter.
pub mod variable;

/// Population state and bounds.
pub mod population;
/// Uniform random initialization.
pub mod init_random;

/// Rejection sampling of distinct population indices.
pub mod distinct_indices;
/// Hybrid best/rand mutation with one difference vector.
pub mod mutant_best_or_rand1;
/// Binomial crossover with bound repair.
pub mod crossover_binomial;

/// Best-candidate reduction with deterministic tie-break.
pub mod argmin;
/// Parallel population evaluation support.
pub mod parallel_eval;

/// Generation loop and termination policy.
pub mod optimizer;
/// Top-level calibration entry points.
pub mod calibrate;


pub use calibrate::{CalibrationReport, CalibrationResult, fit, fit_with_config};
pub use optimizer::{GenerationSnapshot, OptimizationReport, Optimizer, Status};
pub use parallel_eval::ParallelConfig;
pub use population::{Bounds, Population};
pub use stream::RngStream;
pub use variable::{FreeVariableMap, OptimizationVariable, Range, partition};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x5eed_ca11_b4a7_e001;

/// Per-generation observer.
pub type CallbackFn = Box<dyn FnMut(&GenerationSnapshot<'_>) + Send>;

/// Mutation and crossover settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Number of candidates (NP), at least 4.
    pub population_size: usize,
    /// Crossover probability CR in [0, 1].
    pub crossover_rate: f64,
    /// Lower end of the differential weight F, drawn once per generation.
    pub f_min: f64,
    /// Upper end of the differential weight F.
    pub f_max: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            crossover_rate: 0.9,
            f_min: 0.5,
            f_max: 1.0,
        }
    }
}

/// When to stop searching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminationConfig {
    /// Maximum number of generations.
    pub max_iterations: usize,
    /// Maximum number of objective evaluations, initialization included.
    /// Zero disables the search entirely.
    pub max_evaluations: usize,
    /// Stop as soon as the best error is at or below this value.
    pub target_error: f64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            max_iterations: usize::MAX,
            max_evaluations: 10_000,
            target_error: 0.0,
        }
    }
}

/// Configuration of a calibration run.
pub struct CalibrationConfig {
    /// Mutation and crossover settings.
    pub mutation: MutationConfig,
    /// Termination settings.
    pub termination: TerminationConfig,
    /// Root seed of the random streams.
    pub seed: u64,
    /// Parallel evaluation configuration.
    pub parallel: ParallelConfig,
    /// Log progress every N generations at debug level (0 = never).
    pub print_interval: usize,
    /// Optional observer called after initialization and every generation.
    pub callback: Option<CallbackFn>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            mutation: MutationConfig::default(),
            termination: TerminationConfig::default(),
            seed: DEFAULT_SEED,
            parallel: ParallelConfig::default(),
            print_interval: 0,
            callback: None,
        }
    }
}

impl fmt::Debug for CalibrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalibrationConfig")
            .field("mutation", &self.mutation)
            .field("termination", &self.termination)
            .field("seed", &self.seed)
            .field("parallel", &self.parallel)
            .field("print_interval", &self.print_interval)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl CalibrationConfig {
    /// Checks the settings the search relies on.
    ///
    /// # Errors
    ///
    /// Returns `PopulationTooSmall` if fewer than 4 candidates are requested,
    /// `InvalidCrossoverRate` if CR is outside [0, 1], and
    /// `InvalidDifferentialWeight` if `0 <= f_min <= f_max <= 2` fails.
    pub fn validate(&self) -> Result<()> {
        let m = &self.mutation;
        if m.population_size < 4 {
            return Err(CalibrationError::PopulationTooSmall {
                pop_size: m.population_size,
            });
        }
        if !(0.0..=1.0).contains(&m.crossover_rate) {
            return Err(CalibrationError::InvalidCrossoverRate {
                rate: m.crossover_rate,
            });
        }
        if !(0.0 <= m.f_min && m.f_min <= m.f_max && m.f_max <= 2.0) {
            return Err(CalibrationError::InvalidDifferentialWeight {
                min: m.f_min,
                max: m.f_max,
            });
        }
        Ok(())
    }
}

/// Fluent builder for `CalibrationConfig`.
///
/// # Example
///
/// ```rust
/// use math_audio_calibration::CalibrationConfigBuilder;
///
/// let config = CalibrationConfigBuilder::new()
///     .population_size(30)
///     .crossover_rate(0.8)
///     .max_evaluations(5_000)
///     .seed(42)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.mutation.population_size, 30);
/// ```
pub struct CalibrationConfigBuilder {
    cfg: CalibrationConfig,
}

impl Default for CalibrationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationConfigBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            cfg: CalibrationConfig::default(),
        }
    }
    /// Sets the number of candidates.
    pub fn population_size(mut self, v: usize) -> Self {
        self.cfg.mutation.population_size = v;
        self
    }
    /// Sets the crossover probability (CR).
    pub fn crossover_rate(mut self, v: f64) -> Self {
        self.cfg.mutation.crossover_rate = v;
        self
    }
    /// Sets the range the differential weight F is drawn from.
    pub fn differential_weight(mut self, min: f64, max: f64) -> Self {
        self.cfg.mutation.f_min = min;
        self.cfg.mutation.f_max = max;
        self
    }
    /// Sets the maximum number of generations.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.cfg.termination.max_iterations = v;
        self
    }
    /// Sets the evaluation budget.
    pub fn max_evaluations(mut self, v: usize) -> Self {
        self.cfg.termination.max_evaluations = v;
        self
    }
    /// Sets the target error.
    pub fn target_error(mut self, v: f64) -> Self {
        self.cfg.termination.target_error = v;
        self
    }
    /// Sets the root seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.cfg.seed = v;
        self
    }
    /// Sets the parallel evaluation configuration.
    pub fn parallel(mut self, v: ParallelConfig) -> Self {
        self.cfg.parallel = v;
        self
    }
    /// Sets how often progress is logged.
    pub fn print_interval(mut self, v: usize) -> Self {
        self.cfg.print_interval = v;
        self
    }
    /// Sets a per-generation observer.
    pub fn callback(mut self, cb: CallbackFn) -> Self {
        self.cfg.callback = Some(cb);
        self
    }
    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// See [`CalibrationConfig::validate`].
    pub fn build(self) -> Result<CalibrationConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_popsize_too_small() {
        let result = CalibrationConfigBuilder::new().population_size(3).build();
        assert!(matches!(
            result,
            Err(CalibrationError::PopulationTooSmall { pop_size: 3 })
        ));
    }

    #[test]
    fn test_popsize_minimum() {
        assert!(CalibrationConfigBuilder::new().population_size(4).build().is_ok());
    }

    #[test]
    fn test_crossover_rate_range() {
        assert!(CalibrationConfigBuilder::new().crossover_rate(1.0).build().is_ok());
        assert!(CalibrationConfigBuilder::new().crossover_rate(0.0).build().is_ok());
        let err = CalibrationConfigBuilder::new()
            .crossover_rate(1.2)
            .build()
            .unwrap_err();
        assert!(err.is_config_error());
        assert!(
            CalibrationConfigBuilder::new()
                .crossover_rate(f64::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_differential_weight_range() {
        assert!(
            CalibrationConfigBuilder::new()
                .differential_weight(0.7, 0.7)
                .build()
                .is_ok()
        );
        assert!(
            CalibrationConfigBuilder::new()
                .differential_weight(1.0, 0.5)
                .build()
                .is_err()
        );
        assert!(
            CalibrationConfigBuilder::new()
                .differential_weight(0.5, 2.5)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_defaults() {
        let cfg = CalibrationConfig::default();
        assert_eq!(cfg.mutation.population_size, 20);
        assert_eq!(cfg.mutation.crossover_rate, 0.9);
        assert_eq!((cfg.mutation.f_min, cfg.mutation.f_max), (0.5, 1.0));
        assert_eq!(cfg.termination.max_iterations, usize::MAX);
        assert_eq!(cfg.termination.target_error, 0.0);
        assert_eq!(cfg.seed, DEFAULT_SEED);
        assert!(format!("{:?}", cfg).contains("callback: false"));
    }

    #[test]
    fn test_termination_json() {
        let t = TerminationConfig {
            max_iterations: 50,
            max_evaluations: 1_000,
            target_error: 1e-6,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: TerminationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
