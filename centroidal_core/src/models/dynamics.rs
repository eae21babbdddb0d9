// centroidal_core/src/models/dynamics.rs

use nalgebra::{Matrix3, Vector3, Vector4};
use serde::Deserialize;
use std::fmt::Debug;

use crate::error::{DataError, NumericalError, Result};
use crate::math::quaternion::{quaternion_derivative, rotation_matrix};
use crate::types::{
    Control, State, ANGULAR_VELOCITY_IDX, CONTROL_DIM, FORCE_IDX, MOMENT_IDX, QUATERNION_IDX,
    STATE_DIM, VELOCITY_IDX,
};
use crate::utils::integrators::Integrator;

// --- DYNAMICS MODEL TRAIT ---
// Represents the physics of the floating base. `x_dot = f(x, u)`
/// The continuous-time model of an entity: how its state evolves under an input.
pub trait Dynamics: Debug + Send + Sync {
    /// Returns the total number of states (the length of the state vector `x`).
    fn get_state_dim(&self) -> usize;

    /// Returns the number of dimensions in the control input vector `u`.
    fn get_control_dim(&self) -> usize;

    /// Computes the time derivative of the state vector: `x_dot = f(x, u, t)`.
    fn get_derivatives(&self, x: &State, u: &Control, t: f64) -> State;

    /// Propagates the state forward by `dt` with `u` held constant.
    ///
    /// # Arguments
    /// * `x`: Current state vector.
    /// * `u`: Control input, assumed constant over `dt`.
    /// * `t`: Current time.
    /// * `dt`: Time step duration. Must be non-negative.
    /// * `integrator`: The numerical scheme (e.g. `RK4`).
    fn propagate(
        &self,
        x: &State,
        u: &Control,
        t: f64,
        dt: f64,
        integrator: &dyn Integrator<f64>,
    ) -> State {
        debug_assert!(dt >= 0.0, "Dynamics::propagate: dt cannot be negative");

        let func = |func_x: &State, func_t: f64| -> State { self.get_derivatives(func_x, u, func_t) };
        integrator.step(&func, x, t, t + dt)
    }
}

/// How the angular dynamics map the moment input to angular acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum InertiaModel {
    /// `ω̇ = I_body⁻¹ M`. Orientation does not enter the angular dynamics.
    #[default]
    BodyFrame,
    /// `ω̇ = (R(q) I_body R(q)ᵀ)⁻¹ M`, the inertia rotated into the base frame.
    Rotated,
}

/// Fixed physical parameters of the floating base.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyParams {
    /// Total mass in kg.
    pub mass: f64,
    /// Body-frame inertia tensor about the center of mass.
    pub inertia_body: Matrix3<f64>,
    pub inertia_model: InertiaModel,
}

impl RigidBodyParams {
    /// Solo quadruped base: 2.17 kg with its diagonal body inertia.
    pub fn solo() -> Self {
        Self {
            mass: 2.17,
            inertia_body: Matrix3::from_diagonal(&Vector3::new(0.00578574, 0.01938108, 0.02476124)),
            inertia_model: InertiaModel::BodyFrame,
        }
    }
}

impl Default for RigidBodyParams {
    fn default() -> Self {
        Self::solo()
    }
}

/// Single rigid body with a quaternion orientation state:
///
/// ```text
/// ṗ = v
/// v̇ = F / m
/// q̇ = ½ Ω(ω) q
/// ω̇ = I⁻¹ M
/// ```
#[derive(Debug, Clone)]
pub struct FloatingBaseModel {
    params: RigidBodyParams,
    inertia_body_inv: Matrix3<f64>,
}

impl FloatingBaseModel {
    /// Validates the parameters and caches the inverse body inertia.
    pub fn new(params: RigidBodyParams) -> Result<Self> {
        if !(params.mass.is_finite() && params.mass > 0.0) {
            return Err(DataError::InvalidParameter(format!(
                "mass must be positive and finite, got {}",
                params.mass
            ))
            .into());
        }
        let inertia_body_inv = params
            .inertia_body
            .try_inverse()
            .filter(|inv| inv.iter().all(|v| v.is_finite()))
            .ok_or(NumericalError::SingularInertia)?;

        Ok(Self {
            params,
            inertia_body_inv,
        })
    }

    pub fn params(&self) -> &RigidBodyParams {
        &self.params
    }

    pub fn mass(&self) -> f64 {
        self.params.mass
    }

    /// Inverse inertia used by the angular dynamics at orientation `q` (`[x, y, z, w]`).
    pub fn inverse_inertia(&self, q: &Vector4<f64>) -> Matrix3<f64> {
        match self.params.inertia_model {
            InertiaModel::BodyFrame => self.inertia_body_inv,
            InertiaModel::Rotated => {
                // (R I Rᵀ)⁻¹ = R I⁻¹ Rᵀ for orthonormal R.
                let r = rotation_matrix(q);
                r * self.inertia_body_inv * r.transpose()
            }
        }
    }

    /// Rescales the quaternion block of `x` to unit norm.
    pub fn normalize_orientation(x: &mut State) {
        let mut q = x.fixed_rows_mut::<4>(QUATERNION_IDX);
        let norm = q.norm();
        if norm > f64::EPSILON {
            q /= norm;
        }
    }
}

impl Dynamics for FloatingBaseModel {
    fn get_state_dim(&self) -> usize {
        STATE_DIM
    }

    /// The input is the wrench `[Fx, Fy, Fz, Mx, My, Mz]`.
    fn get_control_dim(&self) -> usize {
        CONTROL_DIM
    }

    fn get_derivatives(&self, x: &State, u: &Control, _t: f64) -> State {
        let mut x_dot = State::zeros(STATE_DIM);

        let velocity: Vector3<f64> = x.fixed_rows::<3>(VELOCITY_IDX).into_owned();
        let q: Vector4<f64> = x.fixed_rows::<4>(QUATERNION_IDX).into_owned();
        let omega: Vector3<f64> = x.fixed_rows::<3>(ANGULAR_VELOCITY_IDX).into_owned();
        let force: Vector3<f64> = u.fixed_rows::<3>(FORCE_IDX).into_owned();
        let moment: Vector3<f64> = u.fixed_rows::<3>(MOMENT_IDX).into_owned();

        x_dot.fixed_rows_mut::<3>(0).copy_from(&velocity);
        x_dot
            .fixed_rows_mut::<3>(VELOCITY_IDX)
            .copy_from(&(force / self.params.mass));
        x_dot
            .fixed_rows_mut::<4>(QUATERNION_IDX)
            .copy_from(&quaternion_derivative(&q, &omega));
        x_dot
            .fixed_rows_mut::<3>(ANGULAR_VELOCITY_IDX)
            .copy_from(&(self.inverse_inertia(&q) * moment));

        x_dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LqrError;
    use crate::utils::integrators::RK4;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;

    fn rest_state() -> State {
        let mut x = State::zeros(STATE_DIM);
        x[QUATERNION_IDX + 3] = 1.0;
        x
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut params = RigidBodyParams::solo();
        params.mass = 0.0;
        assert!(matches!(
            FloatingBaseModel::new(params),
            Err(LqrError::Data(DataError::InvalidParameter(_)))
        ));

        let mut params = RigidBodyParams::solo();
        params.inertia_body[(1, 1)] = 0.0;
        assert!(matches!(
            FloatingBaseModel::new(params),
            Err(LqrError::Numerical(NumericalError::SingularInertia))
        ));
    }

    #[test]
    fn test_derivatives_of_pushed_body() {
        let model = FloatingBaseModel::new(RigidBodyParams::solo()).unwrap();
        let mut x = rest_state();
        x[VELOCITY_IDX] = 0.5;
        let mut u = Control::zeros(CONTROL_DIM);
        u[FORCE_IDX + 2] = 2.17;
        u[MOMENT_IDX] = 0.00578574;

        assert_eq!(model.get_state_dim(), x.len());
        assert_eq!(model.get_control_dim(), u.len());

        let x_dot = model.get_derivatives(&x, &u, 0.0);
        assert_relative_eq!(x_dot[0], 0.5);
        assert_relative_eq!(x_dot[VELOCITY_IDX + 2], 1.0);
        assert_relative_eq!(x_dot[ANGULAR_VELOCITY_IDX], 1.0, epsilon = 1e-12);
        // Zero angular velocity leaves the quaternion still.
        assert_relative_eq!(x_dot.fixed_rows::<4>(QUATERNION_IDX).norm(), 0.0);
    }

    #[test]
    fn test_rotated_inertia_follows_orientation() {
        let mut params = RigidBodyParams::solo();
        params.inertia_model = InertiaModel::Rotated;
        let model = FloatingBaseModel::new(params).unwrap();

        // A quarter turn about z swaps the x and y principal axes.
        let q = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2)
            .into_inner()
            .coords;
        let inv = model.inverse_inertia(&q);
        assert_relative_eq!(inv[(0, 0)], 1.0 / 0.01938108, max_relative = 1e-9);
        assert_relative_eq!(inv[(1, 1)], 1.0 / 0.00578574, max_relative = 1e-9);
    }

    #[test]
    fn test_constant_spin_keeps_unit_quaternion() {
        let model = FloatingBaseModel::new(RigidBodyParams::solo()).unwrap();
        let mut x = rest_state();
        x[ANGULAR_VELOCITY_IDX + 2] = 1.0;
        let u = Control::zeros(CONTROL_DIM);

        let dt = 0.001;
        for k in 0..1000 {
            x = model.propagate(&x, &u, k as f64 * dt, dt, &RK4);
        }
        let q = x.fixed_rows::<4>(QUATERNION_IDX);
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-9);
        // After 1 s at 1 rad/s about z: q = [0, 0, sin(0.5), cos(0.5)].
        assert_relative_eq!(q[2], 0.5_f64.sin(), epsilon = 1e-9);
        assert_relative_eq!(q[3], 0.5_f64.cos(), epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_orientation() {
        let mut x = rest_state();
        x[QUATERNION_IDX + 3] = 2.0;
        x[QUATERNION_IDX] = 2.0;
        FloatingBaseModel::normalize_orientation(&mut x);
        assert_relative_eq!(x.fixed_rows::<4>(QUATERNION_IDX).norm(), 1.0, epsilon = 1e-15);
    }
}
