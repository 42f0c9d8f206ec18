use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Floating-point type usable by the generic steppers.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Vector field or map on `dimension()` coordinates.
pub trait DynamicalSystem<T: Scalar> {
    fn dimension(&self) -> usize;

    /// Writes `dx/dt` (flow) or `x_{n+1}` (map) at `(t, x)` into `out`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Advances `state` and `t` in place by one step of size `dt`.
pub trait Steppable<T: Scalar> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// Scalar Hamiltonian of a one-state, one-control optimal control problem.
///
/// Implementations must be pure and twice differentiable in `control`;
/// the sweep only ever evaluates them, never mutates them.
pub trait Hamiltonian {
    fn evaluate(&self, state: f64, control: f64, costate: f64, time: f64) -> f64;
}

/// `Sync` with the `parallel` feature, where control nodes are updated on the
/// rayon pool; no bound otherwise.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}

#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}

#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// State equation `dx/dt = f(x, u, t)` driven by a scalar control.
pub trait ControlDynamics {
    fn rate(&self, state: f64, control: f64, time: f64) -> f64;
}

impl<H: Hamiltonian + ?Sized> Hamiltonian for &H {
    fn evaluate(&self, state: f64, control: f64, costate: f64, time: f64) -> f64 {
        (**self).evaluate(state, control, costate, time)
    }
}

impl<D: ControlDynamics + ?Sized> ControlDynamics for &D {
    fn rate(&self, state: f64, control: f64, time: f64) -> f64 {
        (**self).rate(state, control, time)
    }
}
