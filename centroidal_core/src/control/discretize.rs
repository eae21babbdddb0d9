// centroidal_core/src/control/discretize.rs

use serde::Deserialize;

use crate::error::{DataError, Result};
use crate::types::{InputMatrix, StateMatrix};

/// Continuous-to-discrete conversion scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Discretization {
    /// First order: `Ā = I + dt·A`, `B̄ = dt·B`.
    #[default]
    Euler,
    /// Exact for piecewise-constant input: `[Ā B̄; 0 I] = exp(dt·[A B; 0 0])`.
    ZeroOrderHold,
}

/// Converts `(A_t, B_t)` to `(Ā_t, B̄_t)` for a fixed sample interval.
///
/// Euler is the default modeling choice: no exponential is taken, which is
/// adequate while `dt` is small against the system's time constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discretizer {
    dt: f64,
    method: Discretization,
}

impl Discretizer {
    pub fn new(dt: f64, method: Discretization) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DataError::InvalidParameter(format!(
                "sample interval must be positive and finite, got {}",
                dt
            ))
            .into());
        }
        Ok(Self { dt, method })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn method(&self) -> Discretization {
        self.method
    }

    pub fn discretize(&self, a: &StateMatrix, b: &InputMatrix) -> (StateMatrix, InputMatrix) {
        match self.method {
            Discretization::Euler => discretize_euler(a, b, self.dt),
            Discretization::ZeroOrderHold => discretize_zero_order_hold(a, b, self.dt),
        }
    }
}

/// `Ā = I + dt·A`, `B̄ = dt·B`.
pub fn discretize_euler(a: &StateMatrix, b: &InputMatrix, dt: f64) -> (StateMatrix, InputMatrix) {
    let n = a.nrows();
    let a_d = StateMatrix::identity(n, n) + a * dt;
    let b_d = b * dt;
    (a_d, b_d)
}

/// Zero-order hold through the augmented matrix exponential (Padé with
/// scaling and squaring, as implemented by nalgebra).
pub fn discretize_zero_order_hold(
    a: &StateMatrix,
    b: &InputMatrix,
    dt: f64,
) -> (StateMatrix, InputMatrix) {
    let n_x = a.nrows();
    let n_u = b.ncols();

    let mut aug = StateMatrix::zeros(n_x + n_u, n_x + n_u);
    aug.view_mut((0, 0), (n_x, n_x)).copy_from(a);
    aug.view_mut((0, n_x), (n_x, n_u)).copy_from(b);
    aug *= dt;

    let exp_aug = aug.exp();
    let a_d = exp_aug.view((0, 0), (n_x, n_x)).clone_owned();
    let b_d = exp_aug.view((0, n_x), (n_x, n_u)).clone_owned();
    (a_d, b_d)
}
