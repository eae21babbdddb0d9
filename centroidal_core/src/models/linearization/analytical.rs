// centroidal_core/src/models/linearization/analytical.rs

use nalgebra::{Matrix3, Vector3, Vector4};

use crate::error::Result;
use crate::math::quaternion::{omega_jacobian, omega_matrix};
use crate::models::dynamics::FloatingBaseModel;
use crate::models::linearization::DynamicsLinearizer;
use crate::trajectory::Trajectory;
use crate::types::{
    InputMatrix, StateMatrix, ANGULAR_VELOCITY_IDX, CONTROL_DIM, FORCE_IDX, MOMENT_IDX,
    POSITION_IDX, QUATERNION_IDX, STATE_DIM, VELOCITY_IDX,
};

/// Closed-form Jacobians of the floating-base dynamics.
///
/// `A_t` blocks:
/// - `∂ṗ/∂v = I₃`
/// - `∂q̇/∂q = ½ Ω(ω)`
/// - `∂q̇/∂ω = ½ ∂(Ω(ω) q)/∂ω`
///
/// `B_t` blocks:
/// - `∂v̇/∂F = I₃ / m`
/// - `∂ω̇/∂M = I⁻¹`, where `I⁻¹` follows the model's [`InertiaModel`].
///
/// With [`InertiaModel::Rotated`] the orientation dependence of the rotated
/// inertia is dropped from `A_t` (`∂ω̇/∂q = 0`), a small-rotation simplification.
///
/// [`InertiaModel`]: crate::models::dynamics::InertiaModel
/// [`InertiaModel::Rotated`]: crate::models::dynamics::InertiaModel::Rotated
#[derive(Debug, Clone)]
pub struct AnalyticalLinearizer {
    model: FloatingBaseModel,
}

impl AnalyticalLinearizer {
    pub fn new(model: FloatingBaseModel) -> Self {
        Self { model }
    }
}

impl DynamicsLinearizer for AnalyticalLinearizer {
    fn name(&self) -> &'static str {
        "analytical"
    }

    fn linearize(&self, trajectory: &Trajectory, t: usize) -> Result<(StateMatrix, InputMatrix)> {
        let point = trajectory.point(t)?;
        let q: &Vector4<f64> = &point.orientation;
        let omega: &Vector3<f64> = &point.angular_velocity;

        let mut a = StateMatrix::zeros(STATE_DIM, STATE_DIM);
        a.fixed_view_mut::<3, 3>(POSITION_IDX, VELOCITY_IDX)
            .copy_from(&Matrix3::identity());
        a.fixed_view_mut::<4, 4>(QUATERNION_IDX, QUATERNION_IDX)
            .copy_from(&(omega_matrix(omega) * 0.5));
        a.fixed_view_mut::<4, 3>(QUATERNION_IDX, ANGULAR_VELOCITY_IDX)
            .copy_from(&(omega_jacobian(q) * 0.5));

        let mut b = InputMatrix::zeros(STATE_DIM, CONTROL_DIM);
        b.fixed_view_mut::<3, 3>(VELOCITY_IDX, FORCE_IDX)
            .copy_from(&(Matrix3::identity() / self.model.mass()));
        b.fixed_view_mut::<3, 3>(ANGULAR_VELOCITY_IDX, MOMENT_IDX)
            .copy_from(&self.model.inverse_inertia(q));

        Ok((a, b))
    }
}
