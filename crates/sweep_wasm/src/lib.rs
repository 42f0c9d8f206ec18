//! WASM bindings for `sweep_core`.

mod shared;
mod simulation;
mod sweep;

pub use simulation::{simulate_linear_model, simulate_second_order_recurrence};
pub use sweep::{solve_quadratic_sweep, WasmSweepRunner};
