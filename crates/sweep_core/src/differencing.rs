//! Central-difference derivatives of scalar functions and of a Hamiltonian
//! with respect to one of its arguments.

use crate::traits::Hamiltonian;
use serde::{Deserialize, Serialize};

/// Step used by every finite difference in the sweep.
///
/// `eps` trades truncation error (shrinks as `eps²`) against cancellation
/// error (grows as `1/eps`). The default suits Hamiltonians whose curvature
/// scale is of order one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferencingSettings {
    pub eps: f64,
}

impl Default for DifferencingSettings {
    fn default() -> Self {
        Self { eps: 0.01 }
    }
}

/// `(f(p + eps/2) - f(p - eps/2)) / eps`.
pub fn central_difference<F>(f: F, point: f64, eps: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let half = 0.5 * eps;
    (f(point + half) - f(point - half)) / eps
}

/// ∂H/∂u at `(x, u, mu, t)`.
pub fn dh_du<H: Hamiltonian + ?Sized>(
    hamiltonian: &H,
    state: f64,
    control: f64,
    costate: f64,
    time: f64,
    eps: f64,
) -> f64 {
    central_difference(
        |u| hamiltonian.evaluate(state, u, costate, time),
        control,
        eps,
    )
}

/// ∂H/∂x at `(x, u, mu, t)`.
pub fn dh_dx<H: Hamiltonian + ?Sized>(
    hamiltonian: &H,
    state: f64,
    control: f64,
    costate: f64,
    time: f64,
    eps: f64,
) -> f64 {
    central_difference(
        |x| hamiltonian.evaluate(x, control, costate, time),
        state,
        eps,
    )
}

/// ∂²H/∂u², taken as the central difference of [`dh_du`] with the same step.
pub fn d2h_du2<H: Hamiltonian + ?Sized>(
    hamiltonian: &H,
    state: f64,
    control: f64,
    costate: f64,
    time: f64,
    eps: f64,
) -> f64 {
    central_difference(
        |u| dh_du(hamiltonian, state, u, costate, time, eps),
        control,
        eps,
    )
}
