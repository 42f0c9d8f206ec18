//! Concrete optimal control problems and closure adapters.

use crate::traits::{ControlDynamics, Hamiltonian};
use serde::{Deserialize, Serialize};

/// Linear-quadratic problem with a single state and control.
///
/// `H = a·x² − b·u² + mu·(r·x + k·u)` with `dx/dt = r·x + k·u`, where
/// `a = state_weight`, `b = control_weight`, `r = growth_rate`,
/// `k = control_gain`. The defaults give `H = x·(x + 0.5·mu) + u·(mu − u)`
/// and `dx/dt = 0.5·x + u`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadraticProblem {
    pub state_weight: f64,
    pub control_weight: f64,
    pub growth_rate: f64,
    pub control_gain: f64,
}

impl Default for QuadraticProblem {
    fn default() -> Self {
        Self {
            state_weight: 1.0,
            control_weight: 1.0,
            growth_rate: 0.5,
            control_gain: 1.0,
        }
    }
}

impl Hamiltonian for QuadraticProblem {
    fn evaluate(&self, state: f64, control: f64, costate: f64, _time: f64) -> f64 {
        self.state_weight * state * state - self.control_weight * control * control
            + costate * self.rate(state, control, 0.0)
    }
}

impl ControlDynamics for QuadraticProblem {
    fn rate(&self, state: f64, control: f64, _time: f64) -> f64 {
        self.growth_rate * state + self.control_gain * control
    }
}

/// Wraps `Fn(x, u, mu, t) -> f64` as a [`Hamiltonian`].
#[derive(Debug, Clone, Copy)]
pub struct HamiltonianFn<F>(pub F);

impl<F> Hamiltonian for HamiltonianFn<F>
where
    F: Fn(f64, f64, f64, f64) -> f64,
{
    fn evaluate(&self, state: f64, control: f64, costate: f64, time: f64) -> f64 {
        (self.0)(state, control, costate, time)
    }
}

/// Wraps `Fn(x, u, t) -> f64` as [`ControlDynamics`].
#[derive(Debug, Clone, Copy)]
pub struct DynamicsFn<F>(pub F);

impl<F> ControlDynamics for DynamicsFn<F>
where
    F: Fn(f64, f64, f64) -> f64,
{
    fn rate(&self, state: f64, control: f64, time: f64) -> f64 {
        (self.0)(state, control, time)
    }
}
