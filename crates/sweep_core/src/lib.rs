pub mod control;
pub mod differencing;
pub mod error;
pub mod grid;
pub mod newton;
pub mod problems;
pub mod recurrence;
pub mod solvers;
pub mod sweep;
pub mod timestepping;
/// The `sweep_core` crate simulates small dynamical systems and solves scalar
/// optimal control problems by forward-backward sweep.
///
/// Key components:
/// - **Traits**: `Scalar`, `DynamicalSystem`, `Steppable` for flows and maps;
///   `Hamiltonian` and `ControlDynamics` for control problems.
/// - **Solvers**: RK4 (vector stepper and scalar `rk4_step`) and `DiscreteMap`.
/// - **Sweep**: state/costate RK4 sweeps, per-node Newton control search,
///   damped fixed-point iteration (`SweepRunner`, `solve_sweep`).
/// - **Recurrence / Timestepping**: affine 2x2 maps, and Euler,
///   Crank-Nicolson and RK4 step matrices for linear systems.
pub mod traits;

pub use sweep::{solve_sweep, SweepResult, SweepRunner, SweepSettings, SweepStatus};
