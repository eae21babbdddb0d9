// centroidal_core/src/math/quaternion.rs

//! Quaternion kinematics for the 4-parameter orientation state.
//!
//! Every function here reads quaternions in the state-vector layout
//! `[x, y, z, w]` (vector part first). nalgebra's `Quaternion::new` takes
//! `(w, i, j, k)`, so conversions go through [`unit_from_xyzw`].

use nalgebra::{Matrix3, Matrix4, Matrix4x3, Quaternion, UnitQuaternion, Vector3, Vector4};

/// Builds a unit quaternion from `[x, y, z, w]` coordinates, normalizing.
pub fn unit_from_xyzw(q: &Vector4<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]))
}

/// The 4x4 quaternion-kinematics matrix `Ω(ω)` such that `q̇ = ½ Ω(ω) q`
/// for `q = [x, y, z, w]` and body angular velocity `ω`.
///
/// `½ Ω(ω) q` equals the coordinates of `½ q ⊗ (0, ω)`.
pub fn omega_matrix(w: &Vector3<f64>) -> Matrix4<f64> {
    let (wx, wy, wz) = (w.x, w.y, w.z);
    Matrix4::new(
        0.0, wz, -wy, wx, //
        -wz, 0.0, wx, wy, //
        wy, -wx, 0.0, wz, //
        -wx, -wy, -wz, 0.0,
    )
}

/// `∂(Ω(ω) q)/∂ω`, the 4x3 block that couples angular velocity into the
/// quaternion rate. Scale by ½ for the Jacobian of `q̇`.
pub fn omega_jacobian(q: &Vector4<f64>) -> Matrix4x3<f64> {
    let (x, y, z, w) = (q[0], q[1], q[2], q[3]);
    Matrix4x3::new(
        w, -z, y, //
        z, w, -x, //
        -y, x, w, //
        -x, -y, -z,
    )
}

/// `q̇ = ½ Ω(ω) q`. No normalization is applied to `q`.
pub fn quaternion_derivative(q: &Vector4<f64>, w: &Vector3<f64>) -> Vector4<f64> {
    omega_matrix(w) * q * 0.5
}

/// Rotation matrix (body to world) of a possibly non-unit `[x, y, z, w]` quaternion.
pub fn rotation_matrix(q: &Vector4<f64>) -> Matrix3<f64> {
    unit_from_xyzw(q).to_rotation_matrix().into_inner()
}

/// Orientation difference between two consecutive samples, as a 4-vector
/// perturbation in the state's quaternion coordinates.
///
/// The relative rotation is `R(q_next)ᵀ R(q_t)`, i.e. `q_next⁻¹ ⊗ q_t`, taken
/// in the hemisphere `w ≥ 0` so that `q` and `-q` compare equal. The returned
/// delta is that rotation minus the identity `[0, 0, 0, 1]`, hence exactly zero
/// for identical orientations.
pub fn relative_rotation_delta(q_t: &Vector4<f64>, q_next: &Vector4<f64>) -> Vector4<f64> {
    let relative = unit_from_xyzw(q_next).inverse() * unit_from_xyzw(q_t);
    let mut coords = relative.into_inner().coords; // [x, y, z, w]
    if coords[3] < 0.0 {
        coords = -coords;
    }
    coords[3] -= 1.0;
    coords
}
