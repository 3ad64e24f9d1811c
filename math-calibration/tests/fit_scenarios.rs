//! End-to-end calibration scenarios through the public API.

use approx::assert_relative_eq;
use math_audio_calibration::{
    CalibrationConfigBuilder, OptimizationVariable, Range, Status, fit, fit_with_config,
};
use ndarray::Array1;

/// Sum of squared residuals of the polynomial `coeffs` against samples of
/// the polynomial with coefficients `truth`.
fn polynomial_residual(truth: &[f64], xs: &[f64]) -> impl Fn(&Array1<f64>) -> f64 + Sync {
    let eval = |coeffs: &[f64], x: f64| coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c);
    let samples: Vec<(f64, f64)> = xs.iter().map(|&x| (x, eval(truth, x))).collect();
    move |coeffs: &Array1<f64>| {
        let c = coeffs.as_slice().unwrap_or(&[]);
        samples
            .iter()
            .map(|&(x, y)| (eval(c, x) - y).powi(2))
            .sum::<f64>()
    }
}

#[test]
fn fibonacci_polynomial_is_recovered() {
    let truth = [1.0, 1.0, 2.0, 3.0, 5.0];
    let xs: Vec<f64> = (0..21).map(|i| -1.0 + 0.1 * i as f64).collect();
    let objective = polynomial_residual(&truth, &xs);

    let variables: Vec<OptimizationVariable> = (0..truth.len())
        .map(|_| OptimizationVariable::Optimized(Range::new(-10.0, 10.0, 0.0)))
        .collect();

    let result = fit(&variables, &objective, 10_000, 20).expect("valid configuration");

    assert_eq!(result.parameters.len(), truth.len());
    for (got, want) in result.parameters.iter().zip(truth.iter()) {
        assert_eq!(got.round(), *want, "recovered {:?}", result.parameters);
    }
    assert!(result.evaluations_used <= 10_000 && result.evaluations_used % 20 == 0);
    assert_relative_eq!(result.error, objective(&result.parameters));
}

#[test]
fn zero_budget_with_fixed_variable() {
    let objective = |x: &Array1<f64>| (x[0] - 1.0).powi(2);
    let variables = [OptimizationVariable::Fixed(3.0)];

    let result = fit(&variables, &objective, 0, 20).expect("valid configuration");

    assert_eq!(result.evaluations_used, 0);
    assert_eq!(result.parameters.to_vec(), vec![3.0]);
    assert_eq!(result.error, objective(&Array1::from_vec(vec![3.0])));
}

#[test]
fn mixed_variables_keep_fixed_positions() {
    // y = a * exp(-b * t) + c with c fixed.
    let ts: Vec<f64> = (0..30).map(|i| 0.1 * i as f64).collect();
    let data: Vec<f64> = ts.iter().map(|&t| 2.0 * (-0.7 * t).exp() + 0.25).collect();
    let objective = move |p: &Array1<f64>| {
        ts.iter()
            .zip(data.iter())
            .map(|(&t, &y)| (p[0] * (-p[1] * t).exp() + p[2] - y).powi(2))
            .sum::<f64>()
    };
    let variables = [
        OptimizationVariable::Optimized(Range::new(0.0, 5.0, 1.0)),
        OptimizationVariable::Optimized(Range::new(0.0, 3.0, 1.0)),
        OptimizationVariable::Fixed(0.25),
    ];

    let config = CalibrationConfigBuilder::new()
        .population_size(16)
        .max_evaluations(4_000)
        .target_error(1e-12)
        .seed(2024)
        .build()
        .expect("valid configuration");
    let report = fit_with_config(&variables, &objective, config).expect("valid variables");

    assert_eq!(report.parameters[2], 0.25);
    assert_relative_eq!(report.parameters[0], 2.0, epsilon = 1e-3);
    assert_relative_eq!(report.parameters[1], 0.7, epsilon = 1e-3);
    assert!(matches!(
        report.status,
        Some(Status::TargetReached) | Some(Status::MaxEvaluationsReached)
    ));
}
