//! Forward-backward sweep for scalar optimal control problems with a free
//! terminal state (`mu(T) = 0`).
//!
//! Each outer iteration integrates the state forward under the current
//! control guess, integrates the costate backward from the transversality
//! condition, and moves every control node a fraction `damping` toward the
//! Newton optimum of the Hamiltonian. The loop stops when the Euclidean norm
//! of the control change drops below `tolerance`, or after `max_iterations`.

use crate::control::update_control;
use crate::differencing::{dh_dx, DifferencingSettings};
use crate::error::SetupError;
use crate::grid::TimeGrid;
use crate::newton::NewtonSettings;
use crate::solvers::rk4_step;
use crate::traits::{ControlDynamics, Hamiltonian, MaybeSync};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub max_iterations: usize,
    /// Under-relaxation weight ω in `(0, 1)`.
    pub damping: f64,
    /// Threshold on `‖u_new − u_old‖₂`.
    pub tolerance: f64,
    pub differencing: DifferencingSettings,
    pub newton: NewtonSettings,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            damping: 0.05,
            tolerance: 1e-3,
            differencing: DifferencingSettings::default(),
            newton: NewtonSettings::default(),
        }
    }
}

impl SweepSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            bail!(SetupError::ZeroCount {
                name: "max_iterations"
            });
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            bail!(SetupError::InvalidDamping(self.damping));
        }
        if !is_positive(self.tolerance) {
            bail!(SetupError::NonPositive {
                name: "tolerance",
                value: self.tolerance,
            });
        }
        if !is_positive(self.differencing.eps) {
            bail!(SetupError::NonPositive {
                name: "eps",
                value: self.differencing.eps,
            });
        }
        if self.newton.max_steps == 0 {
            bail!(SetupError::ZeroCount {
                name: "newton.max_steps"
            });
        }
        if !is_positive(self.newton.tolerance) {
            bail!(SetupError::NonPositive {
                name: "newton.tolerance",
                value: self.newton.tolerance,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepStatus {
    /// Trajectories allocated, no sweep run yet.
    Initializing,
    Iterating,
    Converged,
    /// Iteration cap reached without meeting the tolerance.
    Exhausted,
}

impl SweepStatus {
    pub fn is_done(self) -> bool {
        matches!(self, SweepStatus::Converged | SweepStatus::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepProgress {
    pub status: SweepStatus,
    pub iterations: usize,
    pub max_iterations: usize,
    /// `‖u_new − u_old‖₂` of the last iteration, infinite before the first.
    pub change_norm: f64,
    pub unconverged_nodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub time: Vec<f64>,
    pub state: Vec<f64>,
    pub control: Vec<f64>,
    pub costate: Vec<f64>,
    /// Completed outer iterations; equals `max_iterations` when exhausted.
    pub iterations: usize,
    pub status: SweepStatus,
    pub change_norm: f64,
    /// Nodes whose Newton search stalled during the last control update.
    pub unconverged_nodes: usize,
}

impl SweepResult {
    pub fn converged(&self) -> bool {
        self.status == SweepStatus::Converged
    }
}

/// Sweep driver that can be advanced one outer iteration at a time.
pub struct SweepRunner<H, D> {
    hamiltonian: H,
    dynamics: D,
    settings: SweepSettings,
    grid: TimeGrid,
    state: Vec<f64>,
    control: Vec<f64>,
    costate: Vec<f64>,
    previous: Vec<f64>,
    iterations: usize,
    status: SweepStatus,
    change_norm: f64,
    unconverged_nodes: usize,
}

impl<H: Hamiltonian + MaybeSync, D: ControlDynamics> SweepRunner<H, D> {
    pub fn new(
        hamiltonian: H,
        dynamics: D,
        initial_state: f64,
        horizon: f64,
        dt: f64,
        settings: SweepSettings,
    ) -> Result<Self> {
        if !initial_state.is_finite() {
            bail!(SetupError::InvalidInitialState(initial_state));
        }
        settings.validate().context("Invalid sweep settings.")?;
        let grid = TimeGrid::new(horizon, dt)?;

        let nodes = grid.nodes();
        let mut state = vec![0.0; nodes];
        state[0] = initial_state;
        // Every entry but the last is overwritten by the first backward pass;
        // the last is the transversality condition mu(T) = 0.
        let costate = vec![0.0; nodes];
        let control = vec![0.0; nodes];

        Ok(Self {
            hamiltonian,
            dynamics,
            settings,
            grid,
            state,
            control,
            costate,
            previous: vec![0.0; nodes],
            iterations: 0,
            status: SweepStatus::Initializing,
            change_norm: f64::INFINITY,
            unconverged_nodes: 0,
        })
    }

    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    pub fn status(&self) -> SweepStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn control(&self) -> &[f64] {
        &self.control
    }

    pub fn costate(&self) -> &[f64] {
        &self.costate
    }

    pub fn progress(&self) -> SweepProgress {
        SweepProgress {
            status: self.status,
            iterations: self.iterations,
            max_iterations: self.settings.max_iterations,
            change_norm: self.change_norm,
            unconverged_nodes: self.unconverged_nodes,
        }
    }

    /// Runs one outer iteration. Does nothing once the sweep has finished.
    pub fn step(&mut self) -> SweepProgress {
        if self.is_done() {
            return self.progress();
        }

        self.forward_pass();
        self.backward_pass();

        self.previous.copy_from_slice(&self.control);
        let report = update_control(
            &self.hamiltonian,
            &self.state,
            &mut self.control,
            &self.costate,
            &self.grid.points,
            self.settings.damping,
            &self.settings.newton,
            self.settings.differencing.eps,
        );
        self.unconverged_nodes = report.unconverged_nodes;
        self.change_norm = l2_distance(&self.control, &self.previous);
        self.iterations += 1;

        debug!(
            "sweep iteration {}: ‖Δu‖ = {:e}, {} unconverged nodes",
            self.iterations, self.change_norm, self.unconverged_nodes
        );

        self.status = if self.change_norm < self.settings.tolerance {
            info!("convergence after {} iterations", self.iterations);
            SweepStatus::Converged
        } else if self.iterations >= self.settings.max_iterations {
            warn!(
                "sweep stopped after {} iterations without convergence (‖Δu‖ = {:e})",
                self.iterations, self.change_norm
            );
            SweepStatus::Exhausted
        } else {
            SweepStatus::Iterating
        };

        self.progress()
    }

    /// Runs up to `batch_size` iterations, stopping early when finished.
    pub fn run_steps(&mut self, batch_size: usize) -> SweepProgress {
        for _ in 0..batch_size {
            if self.is_done() {
                break;
            }
            self.step();
        }
        self.progress()
    }

    pub fn run_to_completion(&mut self) -> SweepProgress {
        while !self.is_done() {
            self.step();
        }
        self.progress()
    }

    /// Copies the current trajectories without ending the run.
    pub fn snapshot(&self) -> SweepResult {
        SweepResult {
            time: self.grid.points.clone(),
            state: self.state.clone(),
            control: self.control.clone(),
            costate: self.costate.clone(),
            iterations: self.iterations,
            status: self.status,
            change_norm: self.change_norm,
            unconverged_nodes: self.unconverged_nodes,
        }
    }

    pub fn into_result(self) -> SweepResult {
        SweepResult {
            time: self.grid.points,
            state: self.state,
            control: self.control,
            costate: self.costate,
            iterations: self.iterations,
            status: self.status,
            change_norm: self.change_norm,
            unconverged_nodes: self.unconverged_nodes,
        }
    }

    fn forward_pass(&mut self) {
        let dt = self.grid.dt;
        for i in 0..self.grid.steps {
            let u = self.control[i];
            let dynamics = &self.dynamics;
            self.state[i + 1] = rk4_step(self.state[i], self.grid.points[i], dt, |t, x| {
                dynamics.rate(x, u, t)
            });
        }
    }

    // dmu/dt = -∂H/∂x, integrated from t_i to t_{i-1} with step -dt.
    fn backward_pass(&mut self) {
        let dt = self.grid.dt;
        let eps = self.settings.differencing.eps;
        for i in (1..=self.grid.steps).rev() {
            let (x, u) = (self.state[i], self.control[i]);
            let hamiltonian = &self.hamiltonian;
            self.costate[i - 1] = rk4_step(self.costate[i], self.grid.points[i], -dt, |t, mu| {
                -dh_dx(hamiltonian, x, u, mu, t, eps)
            });
        }
    }
}

/// Runs the sweep to convergence or exhaustion and returns the trajectories.
pub fn solve_sweep<H: Hamiltonian + MaybeSync, D: ControlDynamics>(
    hamiltonian: H,
    dynamics: D,
    initial_state: f64,
    horizon: f64,
    dt: f64,
    settings: SweepSettings,
) -> Result<SweepResult> {
    let mut runner = SweepRunner::new(hamiltonian, dynamics, initial_state, horizon, dt, settings)?;
    runner.run_to_completion();
    Ok(runner.into_result())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::{DynamicsFn, HamiltonianFn, QuadraticProblem};

    fn assert_err_contains<T>(result: Result<T>, needle: &str) {
        let err = match result {
            Ok(_) => panic!("expected error containing \"{needle}\""),
            Err(err) => err,
        };
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn reference_solve() -> SweepResult {
        let problem = QuadraticProblem::default();
        solve_sweep(
            problem,
            problem,
            1.0,
            1.0,
            1.0 / 1024.0,
            SweepSettings::default(),
        )
        .expect("sweep should run")
    }

    #[test]
    fn reference_problem_converges_with_fixed_boundaries() {
        let result = reference_solve();

        assert_eq!(result.status, SweepStatus::Converged);
        assert!(result.iterations > 1 && result.iterations < 1000);
        assert!(result.change_norm < 1e-3);
        assert_eq!(result.time.len(), 1025);
        assert_eq!(result.state.len(), 1025);
        assert_eq!(result.control.len(), 1025);
        assert_eq!(result.costate.len(), 1025);
        assert_eq!(result.state[0], 1.0);
        assert_eq!(*result.costate.last().unwrap(), 0.0);
        assert_eq!(result.unconverged_nodes, 0);
    }

    #[test]
    fn reference_control_approaches_half_costate() {
        // ∂H/∂u = mu − 2u, so the optimum is u = mu/2 at every node.
        let result = reference_solve();
        for (u, mu) in result.control.iter().zip(&result.costate) {
            assert!((u - 0.5 * mu).abs() < 0.05, "u = {u}, mu = {mu}");
        }
        assert!(result.control[0] > result.control[1024]);
        assert!(result.state.iter().all(|x| x.is_finite() && *x >= 1.0));
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let first = reference_solve();
        let second = reference_solve();
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(first.state, second.state);
        assert_eq!(first.control, second.control);
        assert_eq!(first.costate, second.costate);
    }

    #[test]
    fn costate_follows_closed_form_for_time_weighted_state() {
        // H = t·x − u² + mu·u, dx/dt = u: dmu/dt = −t, mu(1) = 0,
        // so mu(t) = (1 − t²)/2 independently of the control.
        let h = HamiltonianFn(|x: f64, u: f64, mu: f64, t: f64| t * x - u * u + mu * u);
        let f = DynamicsFn(|_x: f64, u: f64, _t: f64| u);
        let mut runner =
            SweepRunner::new(h, f, 0.0, 1.0, 1.0 / 64.0, SweepSettings::default()).expect("runner");

        // The last forward pass integrates the control held before the last update.
        let mut driving = runner.snapshot();
        while !runner.is_done() {
            driving = runner.snapshot();
            runner.step();
        }
        let result = runner.into_result();

        assert!(result.converged());
        for (t, mu) in result.time.iter().zip(&result.costate) {
            let exact = 0.5 * (1.0 - t * t);
            assert!((mu - exact).abs() < 1e-10, "t = {t}: mu = {mu}, exact {exact}");
        }
        for i in 0..result.time.len() - 1 {
            let dt = result.time[i + 1] - result.time[i];
            let increment = result.state[i + 1] - result.state[i];
            assert!((increment - dt * driving.control[i]).abs() < 1e-12);
        }
        assert_ne!(driving.control, result.control);
    }

    #[test]
    fn already_optimal_zero_control_converges_in_one_iteration() {
        let h = HamiltonianFn(|_x: f64, u: f64, mu: f64, _t: f64| mu * u - u * u);
        let f = DynamicsFn(|_x: f64, u: f64, _t: f64| u);
        let result = solve_sweep(h, f, 3.0, 2.0, 0.1, SweepSettings::default()).expect("sweep");

        assert_eq!(result.status, SweepStatus::Converged);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.change_norm, 0.0);
        assert!(result.state.iter().all(|&x| x == 3.0));
        assert_eq!(result.time.len(), 21);
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn sequential_sweep_accepts_hamiltonian_with_interior_mutability() {
        use std::cell::Cell;

        let evaluations = Cell::new(0_usize);
        let h = HamiltonianFn(|_x: f64, u: f64, mu: f64, _t: f64| {
            evaluations.set(evaluations.get() + 1);
            mu * u - u * u
        });
        let f = DynamicsFn(|_x: f64, u: f64, _t: f64| u);
        let result = solve_sweep(&h, f, 1.0, 1.0, 0.25, SweepSettings::default()).expect("sweep");

        assert!(result.converged());
        assert!(evaluations.get() > 0);
    }

    #[test]
    fn iteration_cap_reports_exhaustion_and_keeps_trajectories() {
        let problem = QuadraticProblem::default();
        let settings = SweepSettings {
            max_iterations: 1,
            ..SweepSettings::default()
        };
        let result = solve_sweep(problem, problem, 1.0, 1.0, 1.0 / 128.0, settings).expect("sweep");

        assert_eq!(result.status, SweepStatus::Exhausted);
        assert_eq!(result.iterations, 1);
        assert!(result.change_norm >= 1e-3);
        assert_eq!(result.state.len(), 129);
        assert!(result.control.iter().any(|&u| u != 0.0));
    }

    #[test]
    fn stepped_runner_matches_one_shot_solve() {
        let problem = QuadraticProblem::default();
        let settings = SweepSettings::default();
        let mut runner =
            SweepRunner::new(&problem, &problem, 1.0, 1.0, 1.0 / 256.0, settings).expect("runner");
        assert_eq!(runner.status(), SweepStatus::Initializing);
        assert!(runner.progress().change_norm.is_infinite());

        let progress = runner.step();
        assert_eq!(progress.iterations, 1);
        assert_eq!(progress.status, SweepStatus::Iterating);

        let progress = runner.run_steps(5);
        assert_eq!(progress.iterations, 6);
        let partial = runner.snapshot();
        assert_eq!(partial.iterations, 6);
        assert_eq!(partial.control, runner.control());
        assert_eq!(partial.time.len(), 257);

        while !runner.is_done() {
            runner.run_steps(50);
        }
        let after_done = runner.step();
        let stepped = runner.into_result();

        let direct = solve_sweep(problem, problem, 1.0, 1.0, 1.0 / 256.0, settings).expect("sweep");
        assert_eq!(after_done.iterations, direct.iterations);
        assert_eq!(stepped.iterations, direct.iterations);
        assert_eq!(stepped.control, direct.control);
        assert_eq!(stepped.state, direct.state);
        assert_eq!(stepped.costate, direct.costate);
    }

    #[test]
    fn effective_step_is_recomputed_from_horizon() {
        let problem = QuadraticProblem::default();
        let runner =
            SweepRunner::new(problem, problem, 1.0, 2.0, 0.3, SweepSettings::default())
                .expect("runner");
        assert_eq!(runner.grid().steps, 7);
        assert!((runner.grid().dt - 2.0 / 7.0).abs() < 1e-15);
        assert_eq!(*runner.grid().points.last().unwrap(), 2.0);
        assert_eq!(runner.state().len(), 8);
    }

    #[test]
    fn runner_rejects_invalid_inputs() {
        let problem = QuadraticProblem::default();
        let with = |settings: SweepSettings| {
            SweepRunner::new(problem, problem, 1.0, 1.0, 0.01, settings).map(|_| ())
        };

        assert_err_contains(
            with(SweepSettings {
                damping: 0.0,
                ..SweepSettings::default()
            }),
            "Damping weight",
        );
        assert_err_contains(
            with(SweepSettings {
                damping: 1.0,
                ..SweepSettings::default()
            }),
            "Damping weight",
        );
        assert_err_contains(
            with(SweepSettings {
                max_iterations: 0,
                ..SweepSettings::default()
            }),
            "max_iterations",
        );
        assert_err_contains(
            with(SweepSettings {
                tolerance: -1.0,
                ..SweepSettings::default()
            }),
            "tolerance must be positive",
        );
        assert_err_contains(
            with(SweepSettings {
                differencing: DifferencingSettings { eps: 0.0 },
                ..SweepSettings::default()
            }),
            "eps must be positive",
        );
        assert_err_contains(
            SweepRunner::new(problem, problem, f64::NAN, 1.0, 0.01, SweepSettings::default())
                .map(|_| ()),
            "Initial state",
        );
        assert_err_contains(
            SweepRunner::new(problem, problem, 1.0, 1.0, -0.01, SweepSettings::default())
                .map(|_| ()),
            "Time step dt",
        );
    }
}
