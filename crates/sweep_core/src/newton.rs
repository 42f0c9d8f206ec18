//! Per-node control optimisation by Newton's method on `∂H/∂u = 0`.

use crate::differencing::{d2h_du2, dh_du};
use crate::traits::Hamiltonian;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 100,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonOutcome {
    pub control: f64,
    pub iterations: usize,
    /// `false` when `max_steps` ran out before `|∂H/∂u| < tolerance`.
    pub converged: bool,
}

/// Finds the control that zeroes `∂H/∂u` at a fixed `(x, mu, t)`.
///
/// Stalling is not an error: after `max_steps` the last iterate comes back
/// with `converged = false`. A vanishing `∂²H/∂u²` is not trapped either and
/// shows up as a non-finite control.
pub fn optimize_control<H: Hamiltonian + ?Sized>(
    hamiltonian: &H,
    state: f64,
    initial_control: f64,
    costate: f64,
    time: f64,
    settings: &NewtonSettings,
    eps: f64,
) -> NewtonOutcome {
    let mut control = initial_control;
    for step in 0..settings.max_steps {
        let gradient = dh_du(hamiltonian, state, control, costate, time, eps);
        let curvature = d2h_du2(hamiltonian, state, control, costate, time, eps);
        control -= gradient / curvature;

        let residual = dh_du(hamiltonian, state, control, costate, time, eps);
        if residual.abs() < settings.tolerance {
            return NewtonOutcome {
                control,
                iterations: step + 1,
                converged: true,
            };
        }
    }

    NewtonOutcome {
        control,
        iterations: settings.max_steps,
        converged: false,
    }
}
