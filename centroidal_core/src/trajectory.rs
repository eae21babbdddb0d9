// centroidal_core/src/trajectory.rs

use nalgebra::{Vector3, Vector4};

use crate::error::{DataError, Result};
use crate::types::{
    Control, State, ANGULAR_VELOCITY_IDX, CONTROL_DIM, FORCE_IDX, MOMENT_IDX, POSITION_IDX,
    QUATERNION_IDX, STATE_DIM, VELOCITY_IDX,
};

/// Minimum number of samples a trajectory must hold for a backward pass.
pub const MIN_TRAJECTORY_SAMPLES: usize = 2;

/// One sample of the reference trajectory: the base state and the wrench
/// that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    /// Center-of-mass position, world frame.
    pub position: Vector3<f64>,
    /// Center-of-mass velocity, world frame.
    pub velocity: Vector3<f64>,
    /// Base orientation stored `[x, y, z, w]`.
    pub orientation: Vector4<f64>,
    /// Base angular velocity, body frame.
    pub angular_velocity: Vector3<f64>,
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl TrajectoryPoint {
    /// A motionless sample with identity orientation and zero wrench.
    pub fn at_rest(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            orientation: Vector4::new(0.0, 0.0, 0.0, 1.0),
            angular_velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            moment: Vector3::zeros(),
        }
    }

    /// Packs `[p, v, q, ω]` into a 13-state vector.
    pub fn state(&self) -> State {
        let mut x = State::zeros(STATE_DIM);
        x.fixed_rows_mut::<3>(POSITION_IDX).copy_from(&self.position);
        x.fixed_rows_mut::<3>(VELOCITY_IDX).copy_from(&self.velocity);
        x.fixed_rows_mut::<4>(QUATERNION_IDX).copy_from(&self.orientation);
        x.fixed_rows_mut::<3>(ANGULAR_VELOCITY_IDX)
            .copy_from(&self.angular_velocity);
        x
    }

    /// Packs `[F, M]` into a 6-input vector.
    pub fn input(&self) -> Control {
        let mut u = Control::zeros(CONTROL_DIM);
        u.fixed_rows_mut::<3>(FORCE_IDX).copy_from(&self.force);
        u.fixed_rows_mut::<3>(MOMENT_IDX).copy_from(&self.moment);
        u
    }
}

/// The reference trajectory, immutable once validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Validates and wraps a sequence of samples.
    ///
    /// Rejects fewer than two samples, non-finite entries and zero-norm
    /// quaternions. Quaternions are kept as given (no renormalization).
    pub fn new(points: Vec<TrajectoryPoint>) -> Result<Self> {
        if points.len() < MIN_TRAJECTORY_SAMPLES {
            return Err(DataError::TooShort {
                required: MIN_TRAJECTORY_SAMPLES,
                actual: points.len(),
            }
            .into());
        }

        for (index, p) in points.iter().enumerate() {
            let series: [(&'static str, &[f64]); 6] = [
                ("position", p.position.as_slice()),
                ("velocity", p.velocity.as_slice()),
                ("orientation", p.orientation.as_slice()),
                ("angular_velocity", p.angular_velocity.as_slice()),
                ("force", p.force.as_slice()),
                ("moment", p.moment.as_slice()),
            ];
            for (name, values) in series {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(DataError::NonFinite {
                        series: name,
                        index,
                    }
                    .into());
                }
            }
            if p.orientation.norm() < f64::EPSILON {
                return Err(DataError::DegenerateQuaternion { index }.into());
            }
        }

        Ok(Self { points })
    }

    /// Assembles a trajectory from per-quantity time series.
    ///
    /// All series must have the same length. Missing wrench series are the
    /// caller's business: pass zeros explicitly.
    pub fn from_series(
        position: &[Vector3<f64>],
        velocity: &[Vector3<f64>],
        orientation: &[Vector4<f64>],
        angular_velocity: &[Vector3<f64>],
        force: &[Vector3<f64>],
        moment: &[Vector3<f64>],
    ) -> Result<Self> {
        let expected = position.len();
        let lengths: [(&'static str, usize); 5] = [
            ("velocity", velocity.len()),
            ("orientation", orientation.len()),
            ("angular_velocity", angular_velocity.len()),
            ("force", force.len()),
            ("moment", moment.len()),
        ];
        for (series, actual) in lengths {
            if actual != expected {
                return Err(DataError::LengthMismatch {
                    series,
                    expected,
                    actual,
                }
                .into());
            }
        }

        let points = (0..expected)
            .map(|t| TrajectoryPoint {
                position: position[t],
                velocity: velocity[t],
                orientation: orientation[t],
                angular_velocity: angular_velocity[t],
                force: force[t],
                moment: moment[t],
            })
            .collect();
        Self::new(points)
    }

    /// Number of samples.
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn point(&self, t: usize) -> Result<&TrajectoryPoint> {
        self.points.get(t).ok_or_else(|| {
            DataError::IndexOutOfRange {
                index: t,
                horizon: self.horizon(),
            }
            .into()
        })
    }

    /// Reference state at index `t`.
    pub fn state(&self, t: usize) -> Result<State> {
        self.point(t).map(TrajectoryPoint::state)
    }

    /// Reference input at index `t`.
    pub fn input(&self, t: usize) -> Result<Control> {
        self.point(t).map(TrajectoryPoint::input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LqrError;

    #[test]
    fn test_rejects_single_sample() {
        let err = Trajectory::new(vec![TrajectoryPoint::at_rest(Vector3::zeros())]).unwrap_err();
        assert_eq!(
            err,
            LqrError::Data(DataError::TooShort {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_rejects_mismatched_series() {
        let p = vec![Vector3::zeros(); 4];
        let q = vec![Vector4::new(0.0, 0.0, 0.0, 1.0); 3];
        let err = Trajectory::from_series(&p, &p, &q, &p, &p, &p).unwrap_err();
        assert!(matches!(
            err,
            LqrError::Data(DataError::LengthMismatch {
                series: "orientation",
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rejects_zero_quaternion_and_nan() {
        let mut bad_quat = TrajectoryPoint::at_rest(Vector3::zeros());
        bad_quat.orientation = Vector4::zeros();
        let err = Trajectory::new(vec![TrajectoryPoint::at_rest(Vector3::zeros()), bad_quat])
            .unwrap_err();
        assert_eq!(err, LqrError::Data(DataError::DegenerateQuaternion { index: 1 }));

        let mut bad_force = TrajectoryPoint::at_rest(Vector3::zeros());
        bad_force.force.y = f64::NAN;
        let err = Trajectory::new(vec![bad_force, TrajectoryPoint::at_rest(Vector3::zeros())])
            .unwrap_err();
        assert_eq!(
            err,
            LqrError::Data(DataError::NonFinite {
                series: "force",
                index: 0
            })
        );
    }

    #[test]
    fn test_state_and_input_packing() {
        let mut p = TrajectoryPoint::at_rest(Vector3::new(1.0, 2.0, 3.0));
        p.velocity = Vector3::new(4.0, 5.0, 6.0);
        p.angular_velocity = Vector3::new(7.0, 8.0, 9.0);
        p.force = Vector3::new(-1.0, -2.0, -3.0);
        p.moment = Vector3::new(-4.0, -5.0, -6.0);

        let x = p.state();
        assert_eq!(x.len(), STATE_DIM);
        assert_eq!(x[2], 3.0);
        assert_eq!(x[VELOCITY_IDX], 4.0);
        assert_eq!(x[QUATERNION_IDX + 3], 1.0);
        assert_eq!(x[ANGULAR_VELOCITY_IDX + 2], 9.0);

        let u = p.input();
        assert_eq!(u.len(), CONTROL_DIM);
        assert_eq!(u[MOMENT_IDX], -4.0);
    }

    #[test]
    fn test_index_out_of_range() {
        let traj = Trajectory::new(vec![TrajectoryPoint::at_rest(Vector3::zeros()); 3]).unwrap();
        assert!(matches!(
            traj.state(3),
            Err(LqrError::Data(DataError::IndexOutOfRange {
                index: 3,
                horizon: 3
            }))
        ));
    }
}
