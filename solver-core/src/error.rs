//! Error type shared by every fallible operation of the core.

use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

/// Every failure here is a caller-input problem, surfaced synchronously.
/// A failed call leaves the solver exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// A configuration value outside its domain (α ≤ 0, μ ≤ 0, s ∉ (0,1], N < 2, NaN).
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidConfig {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Hotspot coordinate outside the N×N grid.
    #[error("cell ({x}, {y}) is outside the {n}x{n} grid")]
    OutOfBounds { x: usize, y: usize, n: usize },

    /// The context holds no solver yet.
    #[error("solver is not initialized; call configure(n) first")]
    NotInitialized,

    #[error("hotspot amplitude {amplitude} must be finite and non-negative")]
    InvalidAmplitude { amplitude: f64 },

    #[error("field buffer has {actual} values, expected {expected}")]
    FieldLength { expected: usize, actual: usize },
}

impl SolverError {
    pub(crate) fn config(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        SolverError::InvalidConfig {
            parameter,
            value,
            reason,
        }
    }
}
