use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// One classical Runge-Kutta step for a scalar ODE `dy/dt = f(t, y)`.
///
/// A negative `dt` integrates backward in time; the costate sweep relies on
/// this to run the same formula from the terminal condition toward `t = 0`.
pub fn rk4_step<F>(y: f64, t: f64, dt: f64, f: F) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let half = 0.5 * dt;
    let k1 = f(t, y);
    let k2 = f(t + half, y + half * k1);
    let k3 = f(t + half, y + half * k2);
    let k4 = f(t + dt, y + dt * k3);
    y + (dt / 6.0) * (k1 + 2.0 * (k2 + k3) + k4)
}

/// Runge-Kutta 4 stepper for vector flows, reusing its stage buffers
/// across steps.
pub struct RK4<T: Scalar> {
    stages: [Vec<T>; 4],
    probe: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let zeros = vec![T::zero(); dim];
        Self {
            stages: [zeros.clone(), zeros.clone(), zeros.clone(), zeros.clone()],
            probe: zeros,
        }
    }
}

// probe = y + scale * k
fn offset_into<T: Scalar>(probe: &mut [T], y: &[T], k: &[T], scale: T) {
    for (p, (&yi, &ki)) in probe.iter_mut().zip(y.iter().zip(k)) {
        *p = yi + scale * ki;
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = dt * T::from_f64(0.5).unwrap();
        let sixth = dt * T::from_f64(1.0 / 6.0).unwrap();
        let two = T::from_f64(2.0).unwrap();
        let t0 = *t;
        let [k1, k2, k3, k4] = &mut self.stages;

        system.apply(t0, state, k1);
        offset_into(&mut self.probe, state, k1, half);
        system.apply(t0 + half, &self.probe, k2);
        offset_into(&mut self.probe, state, k2, half);
        system.apply(t0 + half, &self.probe, k3);
        offset_into(&mut self.probe, state, k3, dt);
        system.apply(t0 + dt, &self.probe, k4);

        for (i, y) in state.iter_mut().enumerate() {
            *y = *y + sixth * (k1[i] + two * (k2[i] + k3[i]) + k4[i]);
        }
        *t = t0 + dt;
    }
}

/// Iterates `x_{n+1} = f(x_n)`; `t` counts iterations in units of `dt`.
pub struct DiscreteMap<T: Scalar> {
    tmp: Vec<T>,
}

impl<T: Scalar> DiscreteMap<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for DiscreteMap<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        system.apply(*t, state, &mut self.tmp);
        state.copy_from_slice(&self.tmp);
        *t = *t + dt;
    }
}
