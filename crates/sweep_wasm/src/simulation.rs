use crate::shared::{encode, stage_error};
use nalgebra::DMatrix;
use serde::Serialize;
use sweep_core::recurrence::{eigenvalues, simulate_recurrence, steady_state, AffineMap};
use sweep_core::timestepping::{simulate_linear, TimeSteppingScheme};
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
pub(crate) struct RecurrenceOutput {
    points: Vec<[f64; 2]>,
    /// Absent when `I - A` is singular.
    steady_state: Option<[f64; 2]>,
    /// `[re, im]` pairs.
    eigenvalues: Vec<[f64; 2]>,
}

pub(crate) fn parse_scheme(name: &str) -> Result<TimeSteppingScheme, String> {
    match name.to_ascii_lowercase().as_str() {
        "explicit_euler" | "ee" => Ok(TimeSteppingScheme::ExplicitEuler),
        "implicit_euler" | "ie" => Ok(TimeSteppingScheme::ImplicitEuler),
        "crank_nicolson" | "cn" => Ok(TimeSteppingScheme::CrankNicolson),
        "runge_kutta4" | "rk4" => Ok(TimeSteppingScheme::RungeKutta4),
        other => Err(format!("Unknown time stepping scheme: {}", other)),
    }
}

pub(crate) fn recurrence_output(
    a1: f64,
    a2: f64,
    offset: f64,
    initial: [f64; 2],
    steps: usize,
) -> anyhow::Result<RecurrenceOutput> {
    let map = AffineMap::second_order(a1, a2, offset);
    let trajectory = simulate_recurrence(&map, initial, steps)?;
    Ok(RecurrenceOutput {
        points: trajectory.points,
        steady_state: steady_state(&map).ok(),
        eigenvalues: eigenvalues(&map).iter().map(|z| [z.re, z.im]).collect(),
    })
}

pub(crate) fn row_major_matrix(entries: &[f64], dim: usize) -> Result<DMatrix<f64>, String> {
    match dim.checked_mul(dim) {
        Some(expected) if expected == entries.len() => {
            Ok(DMatrix::from_row_slice(dim, dim, entries))
        }
        expected => Err(format!(
            "Matrix must have {} entries for dimension {}, got {}.",
            expected.map_or_else(|| format!("{dim}²"), |n| n.to_string()),
            dim,
            entries.len()
        )),
    }
}

/// Simulates `y_{t+1} = a1·y_t + a2·y_{t-1} + c` from `(y_0, y_{-1})`.
#[wasm_bindgen]
pub fn simulate_second_order_recurrence(
    a1: f64,
    a2: f64,
    offset: f64,
    current: f64,
    previous: f64,
    steps: u32,
) -> Result<JsValue, JsValue> {
    let output = recurrence_output(a1, a2, offset, [current, previous], steps as usize)
        .map_err(|e| stage_error("Recurrence simulation", e))?;
    encode(&output)
}

/// `matrix` is row-major with `dim * dim` entries.
#[wasm_bindgen]
pub fn simulate_linear_model(
    matrix: Vec<f64>,
    dim: usize,
    initial: Vec<f64>,
    horizon: f64,
    delta: f64,
    scheme: &str,
) -> Result<JsValue, JsValue> {
    let scheme = parse_scheme(scheme).map_err(|e| JsValue::from_str(&e))?;
    let matrix = row_major_matrix(&matrix, dim).map_err(|e| JsValue::from_str(&e))?;
    let trajectory = simulate_linear(&initial, &matrix, horizon, delta, scheme)
        .map_err(|e| stage_error("Linear simulation", e))?;
    encode(&trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scheme_accepts_names_and_abbreviations() {
        assert_eq!(parse_scheme("cn"), Ok(TimeSteppingScheme::CrankNicolson));
        assert_eq!(
            parse_scheme("Implicit_Euler"),
            Ok(TimeSteppingScheme::ImplicitEuler)
        );
        assert_eq!(parse_scheme("ee"), Ok(TimeSteppingScheme::ExplicitEuler));
        assert_eq!(parse_scheme("RK4"), Ok(TimeSteppingScheme::RungeKutta4));
        let err = parse_scheme("rk45").unwrap_err();
        assert!(err.contains("rk45"));
    }

    #[test]
    fn row_major_matrix_checks_entry_count() {
        let m = row_major_matrix(&[1.0, 2.0, 3.0, 4.0], 2).expect("matrix");
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);

        let err = row_major_matrix(&[1.0, 2.0, 3.0], 2).unwrap_err();
        assert!(err.contains("4 entries"));

        let huge = usize::MAX / 2;
        let err = row_major_matrix(&[1.0], huge).unwrap_err();
        assert!(err.contains(&format!("dimension {huge}")));
    }

    #[test]
    fn recurrence_output_flattens_eigenvalues() {
        let output = recurrence_output(1.1, -0.6, 1100.0, [1600.0, 1300.0], 10).expect("simulate");
        assert_eq!(output.points.len(), 11);
        let ss = output.steady_state.expect("steady state");
        assert!((ss[0] - 2200.0).abs() < 1e-9);
        assert_eq!(output.eigenvalues.len(), 2);
        assert!(output.eigenvalues.iter().all(|[_, im]| im.abs() > 0.0));
    }

    #[test]
    fn recurrence_output_omits_missing_steady_state() {
        let output = recurrence_output(1.0, 0.0, 5.0, [0.0, 0.0], 4).expect("simulate");
        assert!(output.steady_state.is_none());
        assert_eq!(output.points[4][0], 20.0);
    }
}
