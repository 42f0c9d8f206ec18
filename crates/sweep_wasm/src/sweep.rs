//! Forward-backward sweep runner exposed to the renderer.
//!
//! The runner advances in batches so the host can draw the trajectories
//! between batches, one frame per outer iteration if it wants.

use crate::shared::{decode_or_default, encode, stage_error};
use serde::Serialize;
use sweep_core::problems::QuadraticProblem;
use sweep_core::sweep::{solve_sweep, SweepProgress, SweepRunner, SweepSettings};
use wasm_bindgen::prelude::*;

/// Trajectories at the current iteration, shaped for plotting.
#[derive(Debug, Serialize)]
pub(crate) struct SweepFrame<'a> {
    iteration: usize,
    time: &'a [f64],
    state: &'a [f64],
    control: &'a [f64],
    costate: &'a [f64],
}

#[wasm_bindgen]
pub struct WasmSweepRunner {
    runner: SweepRunner<QuadraticProblem, QuadraticProblem>,
}

impl WasmSweepRunner {
    pub(crate) fn from_parts(
        problem: QuadraticProblem,
        initial_state: f64,
        horizon: f64,
        dt: f64,
        settings: SweepSettings,
    ) -> anyhow::Result<Self> {
        let runner = SweepRunner::new(problem, problem, initial_state, horizon, dt, settings)?;
        Ok(Self { runner })
    }

    pub(crate) fn advance(&mut self, batch_size: u32) -> SweepProgress {
        self.runner.run_steps(batch_size as usize)
    }

    pub(crate) fn frame(&self) -> SweepFrame<'_> {
        SweepFrame {
            iteration: self.runner.iterations(),
            time: &self.runner.grid().points,
            state: self.runner.state(),
            control: self.runner.control(),
            costate: self.runner.costate(),
        }
    }
}

#[wasm_bindgen]
impl WasmSweepRunner {
    #[allow(clippy::too_many_arguments)]
    #[wasm_bindgen(constructor)]
    pub fn new(
        state_weight: f64,
        control_weight: f64,
        growth_rate: f64,
        control_gain: f64,
        initial_state: f64,
        horizon: f64,
        dt: f64,
        settings: JsValue,
    ) -> Result<WasmSweepRunner, JsValue> {
        console_error_panic_hook::set_once();

        let settings: SweepSettings = decode_or_default(settings, "sweep settings")?;
        let problem = QuadraticProblem {
            state_weight,
            control_weight,
            growth_rate,
            control_gain,
        };
        Self::from_parts(problem, initial_state, horizon, dt, settings)
            .map_err(|e| stage_error("Sweep setup", e))
    }

    pub fn is_done(&self) -> bool {
        self.runner.is_done()
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let progress = self.advance(batch_size);
        encode(&progress)
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        encode(&self.runner.progress())
    }

    pub fn get_trajectories(&self) -> Result<JsValue, JsValue> {
        encode(&self.frame())
    }

    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        if !self.runner.is_done() {
            return Err(JsValue::from_str("Sweep has not finished yet."));
        }
        encode(&self.runner.snapshot())
    }
}

/// Runs the quadratic example problem to completion in one call.
#[wasm_bindgen]
pub fn solve_quadratic_sweep(
    problem: JsValue,
    initial_state: f64,
    horizon: f64,
    dt: f64,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let problem: QuadraticProblem = decode_or_default(problem, "problem")?;
    let settings: SweepSettings = decode_or_default(settings, "sweep settings")?;
    let result = solve_sweep(problem, problem, initial_state, horizon, dt, settings)
        .map_err(|e| stage_error("Sweep", e))?;
    encode(&result)
}
