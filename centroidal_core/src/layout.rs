// centroidal_core/src/layout.rs

use std::ops::Range;

use crate::types::{ANGULAR_VELOCITY_IDX, POSITION_IDX, QUATERNION_IDX, VELOCITY_IDX};

/// The four physical blocks of the floating-base state vector.
///
/// The order defines the state indices:
/// - Position (3), indices 0-2
/// - Velocity (3), indices 3-5
/// - Orientation (4, quaternion stored `[x, y, z, w]`), indices 6-9
/// - Angular velocity (3), indices 10-12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateBlock {
    Position,
    Velocity,
    Orientation,
    AngularVelocity,
}

impl StateBlock {
    pub const ALL: [StateBlock; 4] = [
        StateBlock::Position,
        StateBlock::Velocity,
        StateBlock::Orientation,
        StateBlock::AngularVelocity,
    ];

    /// Index range of this block inside the 13-state vector.
    pub fn range(self) -> Range<usize> {
        match self {
            StateBlock::Position => POSITION_IDX..POSITION_IDX + 3,
            StateBlock::Velocity => VELOCITY_IDX..VELOCITY_IDX + 3,
            StateBlock::Orientation => QUATERNION_IDX..QUATERNION_IDX + 4,
            StateBlock::AngularVelocity => ANGULAR_VELOCITY_IDX..ANGULAR_VELOCITY_IDX + 3,
        }
    }
}
