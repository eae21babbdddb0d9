// centroidal_core/src/control/schedule.rs

use crate::control::state_error;
use crate::error::{DataError, Result};
use crate::types::{Control, GainMatrix, State, CONTROL_DIM, FLAT_GAIN_LEN, STATE_DIM};

/// Column where a flattened 78-value gain row is cut into two 39-value halves.
pub const GAIN_SPLIT_POINT: usize = FLAT_GAIN_LEN / 2;

/// The time-indexed sequence of 6x13 feedback gains produced by a backward pass.
///
/// Gains are stored forward in time: `gains[0]` belongs to trajectory index
/// `first_step`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GainSchedule {
    first_step: usize,
    gains: Vec<GainMatrix>,
}

impl GainSchedule {
    pub fn new(first_step: usize, gains: Vec<GainMatrix>) -> Result<Self> {
        for k in &gains {
            check_gain_shape(k.nrows(), k.ncols())?;
        }
        Ok(Self { first_step, gains })
    }

    pub fn len(&self) -> usize {
        self.gains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gains.is_empty()
    }

    /// Trajectory index of the earliest gain.
    pub fn first_step(&self) -> usize {
        self.first_step
    }

    /// Trajectory indices covered by this schedule.
    pub fn steps(&self) -> std::ops::Range<usize> {
        self.first_step..self.first_step + self.gains.len()
    }

    pub fn gains(&self) -> &[GainMatrix] {
        &self.gains
    }

    /// Gain for trajectory index `t`, if the schedule covers it.
    pub fn get(&self, t: usize) -> Option<&GainMatrix> {
        t.checked_sub(self.first_step)
            .and_then(|offset| self.gains.get(offset))
    }

    /// `(trajectory index, gain)` pairs in increasing time.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &GainMatrix)> + '_ {
        self.gains
            .iter()
            .enumerate()
            .map(move |(offset, k)| (self.first_step + offset, k))
    }

    /// Feedback correction `K_t (x − x_ref)`, added to the reference wrench.
    pub fn feedback(&self, t: usize, x: &State, x_ref: &State) -> Option<Control> {
        self.get(t).map(|k| k * state_error(x, x_ref))
    }

    /// Every gain flattened row-major into 78 values (`K[i, j]` at `13 i + j`).
    pub fn to_flat_rows(&self) -> Vec<Vec<f64>> {
        self.gains.iter().map(flatten_row_major).collect()
    }

    /// Flattened rows cut at `GAIN_SPLIT_POINT` into a first and a second half.
    pub fn to_split_rows(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        self.to_flat_rows()
            .into_iter()
            .map(|mut row| {
                let tail = row.split_off(GAIN_SPLIT_POINT);
                (row, tail)
            })
            .unzip()
    }

    /// Rebuilds a schedule from flattened 78-value rows.
    pub fn from_flat_rows(first_step: usize, rows: &[Vec<f64>]) -> Result<Self> {
        let gains = rows
            .iter()
            .map(|row| {
                if row.len() != FLAT_GAIN_LEN {
                    return Err(DataError::Dimension {
                        name: "flattened gain row",
                        expected_rows: 1,
                        expected_cols: FLAT_GAIN_LEN,
                        rows: 1,
                        cols: row.len(),
                    }
                    .into());
                }
                Ok(GainMatrix::from_row_slice(CONTROL_DIM, STATE_DIM, row))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(first_step, gains)
    }

    /// Rebuilds a schedule from the two halves written by [`Self::to_split_rows`].
    pub fn from_split_rows(
        first_step: usize,
        first: &[Vec<f64>],
        second: &[Vec<f64>],
    ) -> Result<Self> {
        if first.len() != second.len() {
            return Err(DataError::LengthMismatch {
                series: "second gain half",
                expected: first.len(),
                actual: second.len(),
            }
            .into());
        }
        let rows: Vec<Vec<f64>> = first
            .iter()
            .zip(second)
            .map(|(head, tail)| head.iter().chain(tail).copied().collect())
            .collect();
        Self::from_flat_rows(first_step, &rows)
    }
}

fn check_gain_shape(rows: usize, cols: usize) -> Result<()> {
    if (rows, cols) != (CONTROL_DIM, STATE_DIM) {
        return Err(DataError::Dimension {
            name: "gain",
            expected_rows: CONTROL_DIM,
            expected_cols: STATE_DIM,
            rows,
            cols,
        }
        .into());
    }
    Ok(())
}

fn flatten_row_major(k: &GainMatrix) -> Vec<f64> {
    // DMatrix storage is column-major; the transpose's storage is K row by row.
    k.transpose().as_slice().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QUATERNION_IDX;

    fn numbered_gain(seed: f64) -> GainMatrix {
        GainMatrix::from_fn(CONTROL_DIM, STATE_DIM, |i, j| seed + (i * STATE_DIM + j) as f64)
    }

    #[test]
    fn test_lookup_by_trajectory_index() {
        let schedule = GainSchedule::new(1, vec![numbered_gain(0.0), numbered_gain(100.0)]).unwrap();
        assert_eq!(schedule.steps(), 1..3);
        assert!(schedule.get(0).is_none());
        assert_eq!(schedule.get(2).unwrap()[(0, 0)], 100.0);
        assert!(schedule.get(3).is_none());

        let indices: Vec<usize> = schedule.iter().map(|(t, _)| t).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_flat_rows_are_row_major_and_split_in_halves() {
        let schedule = GainSchedule::new(1, vec![numbered_gain(0.0)]).unwrap();
        let rows = schedule.to_flat_rows();
        assert_eq!(rows[0].len(), FLAT_GAIN_LEN);
        for (idx, value) in rows[0].iter().enumerate() {
            assert_eq!(*value, idx as f64);
        }

        let (first, second) = schedule.to_split_rows();
        assert_eq!(first[0].len(), 39);
        assert_eq!(second[0].len(), 39);
        assert_eq!(first[0][38], 38.0);
        assert_eq!(second[0][0], 39.0);

        let rebuilt = GainSchedule::from_split_rows(1, &first, &second).unwrap();
        assert_eq!(rebuilt, schedule);
    }

    #[test]
    fn test_rejects_malformed_rows() {
        assert!(GainSchedule::from_flat_rows(1, &[vec![0.0; 77]]).is_err());
        assert!(GainSchedule::from_split_rows(1, &[vec![0.0; 39]], &[]).is_err());
        assert!(GainSchedule::new(1, vec![GainMatrix::zeros(13, 6)]).is_err());
    }

    #[test]
    fn test_feedback_uses_state_error() {
        let mut k = GainMatrix::zeros(CONTROL_DIM, STATE_DIM);
        k[(0, 0)] = -2.0;
        let schedule = GainSchedule::new(5, vec![k]).unwrap();

        let mut x_ref = State::zeros(STATE_DIM);
        x_ref[QUATERNION_IDX + 3] = 1.0;
        let mut x = x_ref.clone();
        x[0] = 0.25;

        let u = schedule.feedback(5, &x, &x_ref).unwrap();
        assert_eq!(u[0], -0.5);
        assert!(schedule.feedback(4, &x, &x_ref).is_none());
    }
}
