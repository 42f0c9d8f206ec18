//! Single-step schemes for linear systems `dp/dt = A·p`.
//!
//! Each scheme reduces to `p_{n+1} = M·p_n` for a fixed step matrix `M`,
//! which is assembled once per simulation:
//!
//! - explicit Euler: `M = I + δA`
//! - implicit Euler: `M = (I − δA)⁻¹`
//! - Crank-Nicolson: `M = (I − δA/2)⁻¹ (I + δA/2)`
//! - classical RK4: `M = I + δA + (δA)²/2 + (δA)³/6 + (δA)⁴/24`

use crate::error::SetupError;
use crate::grid::TimeGrid;
use crate::traits::DynamicalSystem;
use anyhow::{bail, Context, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSteppingScheme {
    ExplicitEuler,
    ImplicitEuler,
    CrankNicolson,
    RungeKutta4,
}

impl TimeSteppingScheme {
    pub fn step_matrix(self, matrix: &DMatrix<f64>, delta: f64) -> Result<DMatrix<f64>> {
        let dim = matrix.nrows();
        if matrix.ncols() != dim {
            bail!(SetupError::DimensionMismatch {
                what: "coefficient matrix columns",
                expected: dim,
                got: matrix.ncols(),
            });
        }
        let identity = DMatrix::<f64>::identity(dim, dim);
        let scaled = matrix * delta;

        let step = match self {
            TimeSteppingScheme::ExplicitEuler => identity + scaled,
            TimeSteppingScheme::ImplicitEuler => (identity - scaled)
                .try_inverse()
                .ok_or(SetupError::SingularMatrix("I - δA"))?,
            TimeSteppingScheme::CrankNicolson => {
                let half = scaled * 0.5;
                let lhs = (&identity - &half)
                    .try_inverse()
                    .ok_or(SetupError::SingularMatrix("I - δA/2"))?;
                lhs * (identity + half)
            }
            TimeSteppingScheme::RungeKutta4 => {
                let mut step = identity.clone();
                let mut term = identity;
                for k in 1..=4 {
                    term = &term * &scaled / k as f64;
                    step += &term;
                }
                step
            }
        };
        Ok(step)
    }
}

/// `dp/dt = A·p` as a flow, for integrators that only see the right-hand side.
pub struct LinearFlow<'a> {
    pub matrix: &'a DMatrix<f64>,
}

impl DynamicalSystem<f64> for LinearFlow<'_> {
    fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.matrix.row(i).iter().zip(x).map(|(a, p)| a * p).sum();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearTrajectory {
    pub time: Vec<f64>,
    /// One state vector per time node.
    pub points: Vec<Vec<f64>>,
}

impl LinearTrajectory {
    /// Component `index` over time.
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.points.iter().map(|p| p[index]).collect()
    }
}

/// Integrates `dp/dt = A·p` from `p0` over `[0, horizon]` with
/// `round(horizon / delta)` equal steps.
pub fn simulate_linear(
    initial: &[f64],
    matrix: &DMatrix<f64>,
    horizon: f64,
    delta: f64,
    scheme: TimeSteppingScheme,
) -> Result<LinearTrajectory> {
    if initial.is_empty() {
        bail!(SetupError::ZeroCount {
            name: "Initial state dimension"
        });
    }
    if matrix.nrows() != initial.len() {
        bail!(SetupError::DimensionMismatch {
            what: "coefficient matrix rows",
            expected: initial.len(),
            got: matrix.nrows(),
        });
    }
    let grid = TimeGrid::new(horizon, delta)?;
    let step = scheme
        .step_matrix(matrix, grid.dt)
        .with_context(|| format!("Failed to assemble {:?} step matrix.", scheme))?;

    let mut p = DVector::from_column_slice(initial);
    let mut points = Vec::with_capacity(grid.nodes());
    points.push(initial.to_vec());
    for _ in 0..grid.steps {
        p = &step * p;
        points.push(p.iter().copied().collect());
    }

    Ok(LinearTrajectory {
        time: grid.points,
        points,
    })
}
