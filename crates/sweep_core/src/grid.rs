//! Uniform time grids over `[0, T]`.

use crate::error::SetupError;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// `N + 1` equally spaced nodes from `0` to exactly `horizon`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    pub horizon: f64,
    /// Effective step `horizon / steps`, which may differ from the nominal one.
    pub dt: f64,
    pub steps: usize,
    pub points: Vec<f64>,
}

impl TimeGrid {
    /// Builds the grid with `N = round(T / dt)` steps, then recomputes
    /// `dt = T / N` so the last node lands on `T`.
    pub fn new(horizon: f64, nominal_dt: f64) -> Result<Self> {
        if !horizon.is_finite() || horizon <= 0.0 {
            bail!(SetupError::InvalidHorizon(horizon));
        }
        if !nominal_dt.is_finite() || nominal_dt <= 0.0 {
            bail!(SetupError::InvalidTimeStep(nominal_dt));
        }
        let ratio = (horizon / nominal_dt).round();
        if ratio < 1.0 {
            bail!(SetupError::EmptyGrid {
                horizon,
                dt: nominal_dt,
            });
        }
        if ratio > usize::MAX as f64 {
            bail!(SetupError::InvalidTimeStep(nominal_dt));
        }
        let steps = ratio as usize;

        let n = steps as f64;
        let points = (0..=steps)
            .map(|i| horizon * (i as f64) / n)
            .collect::<Vec<_>>();

        Ok(Self {
            horizon,
            dt: horizon / n,
            steps,
            points,
        })
    }

    /// Number of nodes, `steps + 1`; never below two.
    pub fn nodes(&self) -> usize {
        self.points.len()
    }
}
