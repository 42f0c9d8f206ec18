//! Second-order linear recurrences written as first-order 2x2 affine maps.

use crate::error::SetupError;
use crate::solvers::DiscreteMap;
use crate::traits::{DynamicalSystem, Steppable};
use anyhow::{bail, Result};
use nalgebra::{Matrix2, Vector2};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// `z_{t+1} = A·z_t + g` on the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMap {
    pub matrix: Matrix2<f64>,
    pub offset: Vector2<f64>,
}

impl AffineMap {
    /// `y_{t+1} = a1·y_t + a2·y_{t-1} + c` with state `z_t = (y_t, y_{t-1})`.
    pub fn second_order(a1: f64, a2: f64, c: f64) -> Self {
        Self {
            matrix: Matrix2::new(a1, a2, 1.0, 0.0),
            offset: Vector2::new(c, 0.0),
        }
    }
}

impl DynamicalSystem<f64> for AffineMap {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        let next = self.matrix * Vector2::new(x[0], x[1]) + self.offset;
        out[0] = next[0];
        out[1] = next[1];
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceTrajectory {
    /// `steps + 1` points, the first being the initial condition.
    pub points: Vec<[f64; 2]>,
}

impl RecurrenceTrajectory {
    /// First component over time.
    pub fn leading(&self) -> Vec<f64> {
        self.points.iter().map(|p| p[0]).collect()
    }
}

pub fn simulate_recurrence(
    map: &AffineMap,
    initial: [f64; 2],
    steps: usize,
) -> Result<RecurrenceTrajectory> {
    if steps == 0 {
        bail!(SetupError::ZeroCount { name: "steps" });
    }
    if initial.iter().any(|v| !v.is_finite()) {
        bail!("Initial point must be finite, got {:?}.", initial);
    }

    let mut stepper = DiscreteMap::<f64>::new(map.dimension());
    let mut state = initial;
    let mut t = 0.0_f64;
    let mut points = Vec::with_capacity(steps + 1);
    points.push(state);
    for _ in 0..steps {
        stepper.step(map, &mut t, &mut state[..], 1.0);
        points.push(state);
    }
    Ok(RecurrenceTrajectory { points })
}

/// Fixed point `z* = (I − A)⁻¹ g`.
pub fn steady_state(map: &AffineMap) -> Result<[f64; 2]> {
    let shifted = Matrix2::identity() - map.matrix;
    let z = shifted
        .lu()
        .solve(&map.offset)
        .ok_or(SetupError::SingularMatrix("I - A"))?;
    Ok([z[0], z[1]])
}

/// Eigenvalues of `A`; the map is stable when all moduli are below one and
/// oscillates when they are complex.
pub fn eigenvalues(map: &AffineMap) -> Vec<Complex<f64>> {
    map.matrix.complex_eigenvalues().iter().copied().collect()
}
