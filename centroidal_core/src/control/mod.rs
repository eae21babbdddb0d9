// centroidal_core/src/control/mod.rs

pub mod discretize;
pub mod riccati;
pub mod rollout;
pub mod schedule;

use nalgebra::Vector4;

use crate::types::{State, QUATERNION_IDX};

/// Deviation `x − x_ref` used by the feedback law.
///
/// The quaternion of `x` is first flipped into the hemisphere of the reference
/// quaternion, since `q` and `-q` describe the same orientation.
pub fn state_error(x: &State, x_ref: &State) -> State {
    let mut error = x - x_ref;
    let q: Vector4<f64> = x.fixed_rows::<4>(QUATERNION_IDX).into_owned();
    let q_ref: Vector4<f64> = x_ref.fixed_rows::<4>(QUATERNION_IDX).into_owned();
    if q.dot(&q_ref) < 0.0 {
        error
            .fixed_rows_mut::<4>(QUATERNION_IDX)
            .copy_from(&(-q - q_ref));
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STATE_DIM;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_state_error_ignores_quaternion_sign() {
        let mut x_ref = State::zeros(STATE_DIM);
        x_ref[QUATERNION_IDX + 3] = 1.0;
        x_ref[1] = 0.4;

        let mut x = x_ref.clone();
        x[QUATERNION_IDX + 3] = -1.0;
        x[1] = 0.5;

        let error = state_error(&x, &x_ref);
        assert_abs_diff_eq!(error[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(error.fixed_rows::<4>(QUATERNION_IDX).norm(), 0.0);
    }
}
