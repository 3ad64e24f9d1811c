//! Error types for parameter calibration.
//!
//! The search itself is total: every draw, repair and reduction produces a
//! value. Errors are only raised while validating what the caller hands in,
//! before any objective evaluation happens.

use thiserror::Error;

/// Errors that can occur while setting up a calibration run.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// A lower bound exceeds its upper bound, or a bound is not finite.
    #[error("invalid bounds for variable {index}: lower ({lower}) > upper ({upper}) or not finite")]
    InvalidBounds {
        /// Position of the variable in the full input vector
        index: usize,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// Population size is too small (must be >= 4).
    #[error("population size ({pop_size}) must be >= 4")]
    PopulationTooSmall {
        /// The invalid population size
        pop_size: usize,
    },

    /// Crossover rate is out of valid range [0, 1].
    #[error("invalid crossover rate: {rate} (must be in [0, 1])")]
    InvalidCrossoverRate {
        /// The invalid crossover rate
        rate: f64,
    },

    /// Differential weight range is empty or leaves [0, 2].
    #[error("invalid differential weight range: [{min}, {max}] (must satisfy 0 <= min <= max <= 2)")]
    InvalidDifferentialWeight {
        /// Lower end of the range
        min: f64,
        /// Upper end of the range
        max: f64,
    },

    /// The search was asked to run over zero free dimensions.
    #[error("no free variables to optimize")]
    NoFreeVariables,

    /// A free-variable vector does not match the number of free variables.
    #[error("free vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        got: usize,
    },
}

/// A specialized `Result` type for calibration operations.
pub type Result<T> = std::result::Result<T, CalibrationError>;

impl CalibrationError {
    /// Returns `true` if this is a bounds-related error.
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, CalibrationError::InvalidBounds { .. })
    }

    /// Returns `true` if this is a configuration-related error.
    ///
    /// This includes `PopulationTooSmall`, `InvalidCrossoverRate`
    /// and `InvalidDifferentialWeight`.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CalibrationError::PopulationTooSmall { .. }
                | CalibrationError::InvalidCrossoverRate { .. }
                | CalibrationError::InvalidDifferentialWeight { .. }
        )
    }

    /// Returns `true` if this is a dimension mismatch error.
    pub fn is_dimension_error(&self) -> bool {
        matches!(
            self,
            CalibrationError::DimensionMismatch { .. } | CalibrationError::NoFreeVariables
        )
    }
}
