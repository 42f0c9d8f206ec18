//! Setup errors shared by the solvers.
//!
//! These are the only hard failures in the crate. Numerical trouble inside
//! an iteration (a stalled Newton search, an exhausted sweep) is reported
//! through the result types instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("Horizon T must be positive and finite, got {0}.")]
    InvalidHorizon(f64),
    #[error("Time step dt must be positive and finite, got {0}.")]
    InvalidTimeStep(f64),
    #[error("Time step dt = {dt} is too large for horizon T = {horizon}: round(T/dt) is zero.")]
    EmptyGrid { horizon: f64, dt: f64 },
    #[error("Initial state must be finite, got {0}.")]
    InvalidInitialState(f64),
    #[error("Damping weight must lie strictly between 0 and 1, got {0}.")]
    InvalidDamping(f64),
    #[error("{name} must be positive, got {value}.")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be greater than zero.")]
    ZeroCount { name: &'static str },
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}.")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{0} is singular.")]
    SingularMatrix(&'static str),
}
