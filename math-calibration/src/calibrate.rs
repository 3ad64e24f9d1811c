use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::optimizer::{Optimizer, Status};
use crate::population::Bounds;
use crate::variable::{OptimizationVariable, partition};
use crate::{CalibrationConfig, MutationConfig, TerminationConfig};

/// Outcome of a calibration: the full parameter vector and its error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Value of every input, fixed ones included, in the original order.
    pub parameters: Array1<f64>,
    /// Objective value of `parameters`.
    pub error: f64,
    /// Objective evaluations spent by the search (the final re-evaluation
    /// of `parameters` is not counted).
    pub evaluations_used: usize,
}

/// [`CalibrationResult`] plus how the search went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Value of every input, fixed ones included, in the original order.
    pub parameters: Array1<f64>,
    /// Objective value of `parameters`.
    pub error: f64,
    /// Objective evaluations spent by the search.
    pub evaluations_used: usize,
    /// Generations run after initialization.
    pub generations: usize,
    /// Why the search stopped, or `None` if it never ran.
    pub status: Option<Status>,
}

impl CalibrationReport {
    /// Drops the search details.
    pub fn into_result(self) -> CalibrationResult {
        CalibrationResult {
            parameters: self.parameters,
            error: self.error,
            evaluations_used: self.evaluations_used,
        }
    }

    fn without_search(parameters: Array1<f64>, error: f64) -> Self {
        Self {
            parameters,
            error,
            evaluations_used: 0,
            generations: 0,
            status: None,
        }
    }
}

/// Fits the optimized inputs of `objective` within an evaluation budget.
///
/// Runs the search with crossover rate 0.9, no generation cap and a target
/// error of zero, so only the budget (or an exact zero error) stops it.
/// A budget of zero, or a variable list without any optimized entry, skips
/// the search and reports the initial or fixed values.
///
/// # Errors
///
/// Returns `InvalidBounds` for a malformed range and `PopulationTooSmall`
/// if the search runs with fewer than 4 candidates.
///
/// # Example
///
/// ```rust
/// use math_audio_calibration::{OptimizationVariable, fit};
/// use ndarray::Array1;
///
/// let variables = [OptimizationVariable::Fixed(3.0)];
/// let result = fit(&variables, &|x: &Array1<f64>| x[0] * 2.0, 0, 20).unwrap();
/// assert_eq!(result.parameters.to_vec(), vec![3.0]);
/// assert_eq!(result.error, 6.0);
/// assert_eq!(result.evaluations_used, 0);
/// ```
pub fn fit<F>(
    variables: &[OptimizationVariable],
    objective: &F,
    max_evaluations: usize,
    population_size: usize,
) -> Result<CalibrationResult>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    let config = CalibrationConfig {
        mutation: MutationConfig {
            population_size,
            crossover_rate: 0.9,
            ..MutationConfig::default()
        },
        termination: TerminationConfig {
            max_iterations: usize::MAX,
            max_evaluations,
            target_error: 0.0,
        },
        ..CalibrationConfig::default()
    };
    fit_with_config(variables, objective, config).map(CalibrationReport::into_result)
}

/// Fits the optimized inputs of `objective` with a full configuration.
///
/// The configuration is only validated when the search actually runs.
///
/// # Errors
///
/// Returns `InvalidBounds` for a malformed range and any error of
/// [`CalibrationConfig::validate`].
pub fn fit_with_config<F>(
    variables: &[OptimizationVariable],
    objective: &F,
    config: CalibrationConfig,
) -> Result<CalibrationReport>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    let (ranges, map) = partition(variables)?;

    if map.num_free_vars() == 0 {
        let parameters = map.expand_unchecked(Array1::<f64>::zeros(0).view());
        let error = objective(&parameters);
        log::trace!("all {} variables fixed, search skipped", map.num_vars());
        return Ok(CalibrationReport::without_search(parameters, error));
    }

    if config.termination.max_evaluations == 0 {
        let initial: Array1<f64> = ranges.iter().map(|r| r.initial_value).collect();
        let parameters = map.expand_unchecked(initial.view());
        let error = objective(&parameters);
        log::trace!("zero evaluation budget, returning initial values");
        return Ok(CalibrationReport::without_search(parameters, error));
    }

    let free_objective = |free: &Array1<f64>| objective(&map.expand_unchecked(free.view()));
    let mut optimizer = Optimizer::new(&free_objective, Bounds::from_ranges(&ranges), config)?;
    let report = optimizer.run();

    let parameters = map.expand_unchecked(report.x.view());
    let error = objective(&parameters);
    Ok(CalibrationReport {
        parameters,
        error,
        evaluations_used: report.nfev,
        generations: report.nit,
        status: Some(report.status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalibrationConfigBuilder;
    use crate::variable::Range;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_all_fixed_skips_search() {
        let vars = [
            OptimizationVariable::Fixed(1.0),
            OptimizationVariable::Fixed(-2.0),
        ];
        let objective = |x: &Array1<f64>| x[0] + 10.0 * x[1];
        let result = fit(&vars, &objective, 10_000, 20).unwrap();
        assert_eq!(result.parameters, array![1.0, -2.0]);
        assert_eq!(result.error, -19.0);
        assert_eq!(result.evaluations_used, 0);
    }

    #[test]
    fn test_all_fixed_ignores_population_size() {
        let vars = [OptimizationVariable::Fixed(3.0)];
        let result = fit(&vars, &|x: &Array1<f64>| x[0], 100, 1).unwrap();
        assert_eq!(result.evaluations_used, 0);
    }

    #[test]
    fn test_zero_budget_returns_initial_values() {
        let vars = [
            OptimizationVariable::Optimized(Range::new(-1.0, 1.0, 0.25)),
            OptimizationVariable::Fixed(4.0),
        ];
        let objective = |x: &Array1<f64>| x[0] * x[1];
        let report = fit_with_config(
            &vars,
            &objective,
            CalibrationConfigBuilder::new().max_evaluations(0).build().unwrap(),
        )
        .unwrap();
        assert_eq!(report.parameters, array![0.25, 4.0]);
        assert_eq!(report.error, 1.0);
        assert_eq!(report.evaluations_used, 0);
        assert_eq!(report.status, None);
    }

    #[test]
    fn test_fixed_values_reach_objective() {
        let vars = [
            OptimizationVariable::Fixed(2.0),
            OptimizationVariable::Optimized(Range::new(-10.0, 10.0, 0.0)),
            OptimizationVariable::Fixed(-3.0),
        ];
        // Minimum at x1 = x0 - x2 = 5.
        let objective = |x: &Array1<f64>| (x[1] - (x[0] - x[2])).powi(2);
        let result = fit(&vars, &objective, 2_000, 10).unwrap();
        assert_eq!(result.parameters[0], 2.0);
        assert_eq!(result.parameters[2], -3.0);
        assert_relative_eq!(result.parameters[1], 5.0, epsilon = 1e-4);
        assert_eq!(result.error, objective(&result.parameters));
    }

    #[test]
    fn test_full_f64_range_still_searches() {
        let vars = [OptimizationVariable::Optimized(Range::new(
            -f64::MAX,
            f64::MAX,
            0.0,
        ))];
        let objective = |x: &Array1<f64>| x[0].abs();
        let report = fit_with_config(
            &vars,
            &objective,
            CalibrationConfigBuilder::new()
                .population_size(20)
                .max_evaluations(4_000)
                .build()
                .unwrap(),
        )
        .unwrap();
        assert!(report.error.is_finite());
        assert!(report.error < 1e305, "search did not move: {}", report.error);
    }

    #[test]
    fn test_invalid_range_is_reported() {
        let vars = [OptimizationVariable::Optimized(Range::new(1.0, -1.0, 0.0))];
        let err = fit(&vars, &|x: &Array1<f64>| x[0], 100, 10).unwrap_err();
        assert!(err.is_bounds_error());
    }

    #[test]
    fn test_small_population_rejected_when_searching() {
        let vars = [OptimizationVariable::Optimized(Range::new(-1.0, 1.0, 0.0))];
        let err = fit(&vars, &|x: &Array1<f64>| x[0], 100, 3).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_report_status_and_json() {
        let vars = [OptimizationVariable::Optimized(Range::new(-1.0, 1.0, 0.0))];
        let report = fit_with_config(
            &vars,
            &|x: &Array1<f64>| (x[0] - 0.3).abs() + 1.0,
            CalibrationConfigBuilder::new()
                .population_size(8)
                .max_evaluations(80)
                .build()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(report.status, Some(Status::MaxEvaluationsReached));
        assert_eq!(report.generations, 9);
        assert_eq!(report.evaluations_used, 80);

        let result = report.into_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: CalibrationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.evaluations_used, 80);
        assert_relative_eq!(back.parameters[0], result.parameters[0], max_relative = 1e-12);
        assert_relative_eq!(back.error, result.error, max_relative = 1e-12);
    }
}
