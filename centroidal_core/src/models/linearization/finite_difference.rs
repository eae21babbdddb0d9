// centroidal_core/src/models/linearization/finite_difference.rs

use nalgebra::Vector4;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::math::quaternion::relative_rotation_delta;
use crate::models::dynamics::{Dynamics, FloatingBaseModel};
use crate::models::linearization::DynamicsLinearizer;
use crate::trajectory::Trajectory;
use crate::types::{Control, InputMatrix, State, StateMatrix, CONTROL_DIM, QUATERNION_IDX, STATE_DIM};

/// Tuning of the trajectory-driven finite differences.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiniteDifferenceSettings {
    /// Step used in place of an observed change that vanishes.
    pub epsilon: f64,
    /// `B_t` is zero when `‖u_{t+1}‖` falls below this.
    pub input_threshold: f64,
}

impl Default for FiniteDifferenceSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            input_threshold: 1e-3,
        }
    }
}

/// Jacobians from one-sided differences whose step sizes come from the
/// trajectory itself.
///
/// Column `i` of `A_t` is `(f(x_t + δ_i e_i, u_t) − f(x_t, u_t)) / δ_i` where
/// `δ_i = x_{t+1,i} − x_{t,i}` for position, velocity and angular velocity.
/// For the quaternion block `δ` is the relative rotation between `q_t` and
/// `q_{t+1}` (see [`relative_rotation_delta`]); differencing the raw unit
/// quaternion components is not meaningful. The perturbed quaternion is not
/// renormalized.
///
/// `B_t` is built the same way from `u_{t+1} − u_t`, unless the next input is
/// nearly zero, in which case it is left at zero.
#[derive(Debug, Clone)]
pub struct FiniteDifferenceLinearizer {
    model: FloatingBaseModel,
    settings: FiniteDifferenceSettings,
}

impl FiniteDifferenceLinearizer {
    pub fn new(model: FloatingBaseModel, settings: FiniteDifferenceSettings) -> Self {
        Self { model, settings }
    }

    /// Returns the observed change, or `epsilon` when adding it to `value`
    /// would leave `value` unchanged (an exactly zero change included).
    fn step_size(&self, value: f64, observed: f64) -> f64 {
        if value + observed == value {
            self.settings.epsilon
        } else {
            observed
        }
    }

    fn state_deltas(&self, x: &State, x_next: &State) -> State {
        let q_t: Vector4<f64> = x.fixed_rows::<4>(QUATERNION_IDX).into_owned();
        let q_next: Vector4<f64> = x_next.fixed_rows::<4>(QUATERNION_IDX).into_owned();
        let q_delta = relative_rotation_delta(&q_t, &q_next);

        State::from_fn(STATE_DIM, |i, _| {
            let observed = if (QUATERNION_IDX..QUATERNION_IDX + 4).contains(&i) {
                q_delta[i - QUATERNION_IDX]
            } else {
                x_next[i] - x[i]
            };
            self.step_size(x[i], observed)
        })
    }
}

impl DynamicsLinearizer for FiniteDifferenceLinearizer {
    fn name(&self) -> &'static str {
        "finite-difference"
    }

    fn linearize(&self, trajectory: &Trajectory, t: usize) -> Result<(StateMatrix, InputMatrix)> {
        let x = trajectory.state(t)?;
        let u = trajectory.input(t)?;
        let x_next = trajectory.state(t + 1)?;
        let u_next = trajectory.input(t + 1)?;

        // Baseline state derivative.
        let x_dot_base = self.model.get_derivatives(&x, &u, 0.0);

        // --- Jacobian A (w.r.t. state x) ---
        let deltas = self.state_deltas(&x, &x_next);
        let mut a_jac = StateMatrix::zeros(STATE_DIM, STATE_DIM);
        for (j, delta) in deltas.iter().enumerate() {
            let mut x_perturbed = x.clone();
            x_perturbed[j] += delta;
            let x_dot_perturbed = self.model.get_derivatives(&x_perturbed, &u, 0.0);
            a_jac
                .column_mut(j)
                .copy_from(&((x_dot_perturbed - &x_dot_base) / *delta));
        }

        // --- Jacobian B (w.r.t. control u) ---
        let mut b_jac = InputMatrix::zeros(STATE_DIM, CONTROL_DIM);
        if u_next.norm() < self.settings.input_threshold {
            debug!(
                step = t,
                "next input below {:e}, leaving B_t at zero", self.settings.input_threshold
            );
            return Ok((a_jac, b_jac));
        }
        for j in 0..CONTROL_DIM {
            let delta = self.step_size(u[j], u_next[j] - u[j]);
            let mut u_perturbed: Control = u.clone();
            u_perturbed[j] += delta;
            let x_dot_perturbed = self.model.get_derivatives(&x, &u_perturbed, 0.0);
            b_jac
                .column_mut(j)
                .copy_from(&((x_dot_perturbed - &x_dot_base) / delta));
        }

        Ok((a_jac, b_jac))
    }
}
