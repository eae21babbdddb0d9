// centroidal_core/src/types.rs

use nalgebra::{DMatrix, DVector};

// --- Core Type Aliases ---
pub type State = DVector<f64>;
pub type Control = DVector<f64>;

/// A 13x13 state-space matrix (`A_t`, `Ā_t`, `Q`, `P_t`).
pub type StateMatrix = DMatrix<f64>;
/// A 13x6 input matrix (`B_t`, `B̄_t`).
pub type InputMatrix = DMatrix<f64>;
/// A 6x13 feedback gain matrix (`K_t`).
pub type GainMatrix = DMatrix<f64>;

/// Dimension of the floating-base state `[p(3), v(3), q(4), ω(3)]`.
pub const STATE_DIM: usize = 13;
/// Dimension of the wrench input `[F(3), M(3)]`.
pub const CONTROL_DIM: usize = 6;

// --- State vector block offsets ---
pub const POSITION_IDX: usize = 0;
pub const VELOCITY_IDX: usize = 3;
/// Quaternion block, stored vector-first as `[x, y, z, w]`.
pub const QUATERNION_IDX: usize = 6;
pub const ANGULAR_VELOCITY_IDX: usize = 10;

// --- Input vector block offsets ---
pub const FORCE_IDX: usize = 0;
pub const MOMENT_IDX: usize = 3;

/// Number of values in one flattened 6x13 gain.
pub const FLAT_GAIN_LEN: usize = STATE_DIM * CONTROL_DIM;
