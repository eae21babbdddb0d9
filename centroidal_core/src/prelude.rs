// centroidal_core/src/prelude.rs

//! The types a driver needs to go from a trajectory to a gain schedule.

pub use crate::control::discretize::{Discretization, Discretizer};
pub use crate::control::riccati::{lqr_step, CostWeights, RiccatiBackwardPass, FIRST_GAIN_STEP};
pub use crate::control::rollout::{ClosedLoopRollout, RolloutReport};
pub use crate::control::schedule::{GainSchedule, GAIN_SPLIT_POINT};
pub use crate::control::state_error;
pub use crate::error::{DataError, LqrError, NumericalError};
pub use crate::layout::StateBlock;
pub use crate::models::dynamics::{Dynamics, FloatingBaseModel, InertiaModel, RigidBodyParams};
pub use crate::models::linearization::{
    compare_linearizers, DynamicsLinearizer, FiniteDifferenceSettings, LinearizationStrategy,
};
pub use crate::trajectory::{Trajectory, TrajectoryPoint};
pub use crate::types::{Control, GainMatrix, State, CONTROL_DIM, STATE_DIM};
pub use crate::utils::integrators::IntegratorKind;
