//! Damped update of the whole control trajectory.

use crate::newton::{optimize_control, NewtonOutcome, NewtonSettings};
use crate::traits::{Hamiltonian, MaybeSync};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Summary of one control update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlUpdate {
    /// Nodes whose Newton search ran out of steps.
    pub unconverged_nodes: usize,
}

/// Replaces every `control[i]` by `(1 - ω)·u_old + ω·u_newton`.
///
/// Nodes are independent of each other, so the order in which they are
/// visited cannot change the result. With the `parallel` feature they are
/// computed on the rayon pool.
#[allow(clippy::too_many_arguments)]
pub fn update_control<H: Hamiltonian + MaybeSync + ?Sized>(
    hamiltonian: &H,
    state: &[f64],
    control: &mut [f64],
    costate: &[f64],
    time: &[f64],
    damping: f64,
    newton: &NewtonSettings,
    eps: f64,
) -> ControlUpdate {
    debug_assert_eq!(state.len(), control.len());
    debug_assert_eq!(costate.len(), control.len());
    debug_assert_eq!(time.len(), control.len());

    let blend = |u: &mut f64, (x, mu, t): (f64, f64, f64)| -> bool {
        let NewtonOutcome {
            control: target,
            converged,
            ..
        } = optimize_control(hamiltonian, x, *u, mu, t, newton, eps);
        *u = (1.0 - damping) * *u + damping * target;
        converged
    };

    #[cfg(feature = "parallel")]
    let unconverged_nodes: usize = control
        .par_iter_mut()
        .zip(state.par_iter())
        .zip(costate.par_iter().zip(time.par_iter()))
        .map(|((u, x), (mu, t))| usize::from(!blend(u, (*x, *mu, *t))))
        .sum();

    #[cfg(not(feature = "parallel"))]
    let unconverged_nodes: usize = control
        .iter_mut()
        .zip(state)
        .zip(costate.iter().zip(time))
        .map(|((u, x), (mu, t))| usize::from(!blend(u, (*x, *mu, *t))))
        .sum();

    ControlUpdate { unconverged_nodes }
}
