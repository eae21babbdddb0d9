// centroidal_core/src/control/riccati.rs

use nalgebra::DMatrix;
use tracing::{debug, info};

use crate::control::discretize::Discretizer;
use crate::control::schedule::GainSchedule;
use crate::error::{DataError, NumericalError, Result};
use crate::math::linalg::{all_finite, spd_factor, symmetrize};
use crate::models::linearization::DynamicsLinearizer;
use crate::trajectory::Trajectory;
use crate::types::{GainMatrix, InputMatrix, StateMatrix, CONTROL_DIM, STATE_DIM};

/// Earliest trajectory index that receives a gain. Index 0 never does.
pub const FIRST_GAIN_STEP: usize = 1;

/// Fixed quadratic weights `xᵀQx + uᵀRu` for the whole horizon.
///
/// `R` is only checked for shape and finiteness here. Whether
/// `R + B̄ᵀPB̄` is positive definite is decided step by step during the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CostWeights {
    q: StateMatrix,
    r: DMatrix<f64>,
}

impl CostWeights {
    pub fn new(q: StateMatrix, r: DMatrix<f64>) -> Result<Self> {
        check_square("Q", &q, STATE_DIM)?;
        check_square("R", &r, CONTROL_DIM)?;
        for (name, m) in [("Q", &q), ("R", &r)] {
            if !all_finite(m) {
                return Err(DataError::InvalidParameter(format!(
                    "{} has non-finite entries",
                    name
                ))
                .into());
            }
            if (m - m.transpose()).amax() > 1e-9 * m.amax().max(1.0) {
                return Err(DataError::InvalidParameter(format!("{} must be symmetric", name)).into());
            }
        }
        Ok(Self { q, r })
    }

    /// Diagonal weights, the usual way they are tuned.
    pub fn from_diagonals(q_diagonal: &[f64], r_diagonal: &[f64]) -> Result<Self> {
        for (name, diag, dim) in [("Q", q_diagonal, STATE_DIM), ("R", r_diagonal, CONTROL_DIM)] {
            if diag.len() != dim {
                return Err(DataError::Dimension {
                    name,
                    expected_rows: dim,
                    expected_cols: dim,
                    rows: diag.len(),
                    cols: diag.len(),
                }
                .into());
            }
        }
        Self::new(
            DMatrix::from_diagonal(&nalgebra::DVector::from_column_slice(q_diagonal)),
            DMatrix::from_diagonal(&nalgebra::DVector::from_column_slice(r_diagonal)),
        )
    }

    pub fn q(&self) -> &StateMatrix {
        &self.q
    }

    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }
}

fn check_square(name: &'static str, m: &DMatrix<f64>, dim: usize) -> Result<()> {
    if m.shape() != (dim, dim) {
        return Err(DataError::Dimension {
            name,
            expected_rows: dim,
            expected_cols: dim,
            rows: m.nrows(),
            cols: m.ncols(),
        }
        .into());
    }
    Ok(())
}

/// One step of the backward recursion at trajectory index `step`.
///
/// ```text
/// K = -(R + B̄ᵀ P' B̄)⁻¹ B̄ᵀ P' Ā
/// P = Q + Kᵀ R K + (Ā + B̄K)ᵀ P' (Ā + B̄K)
/// ```
///
/// `P'` is the cost-to-go of the later step. The update is the Joseph form of
/// the discrete Riccati recursion; `P` is symmetrized before it is returned.
pub fn lqr_step(
    weights: &CostWeights,
    a: &StateMatrix,
    b: &InputMatrix,
    p_prev: &StateMatrix,
    step: usize,
) -> Result<(GainMatrix, StateMatrix)> {
    let bt_p = b.transpose() * p_prev;
    let input_hessian = &weights.r + &bt_p * b;
    let chol = spd_factor(input_hessian).ok_or(NumericalError::SingularInputHessian { step })?;

    let k: GainMatrix = -chol.solve(&(&bt_p * a));
    if !all_finite(&k) {
        return Err(NumericalError::NonFinite { what: "gain", step }.into());
    }

    let closed_loop = a + b * &k;
    let mut p = &weights.q
        + k.transpose() * &weights.r * &k
        + closed_loop.transpose() * p_prev * &closed_loop;
    symmetrize(&mut p);
    if !all_finite(&p) {
        return Err(NumericalError::NonFinite {
            what: "cost-to-go",
            step,
        }
        .into());
    }

    Ok((k, p))
}

/// Finite-horizon, time-varying LQR about a reference trajectory.
///
/// Walks `t = horizon-2 … 1` backward from a zero terminal cost, linearizing
/// and discretizing at each index. Produces `horizon − 2` gains ordered
/// forward in time, the first one belonging to index 1.
#[derive(Debug, Clone)]
pub struct RiccatiBackwardPass {
    linearizer: Box<dyn DynamicsLinearizer>,
    discretizer: Discretizer,
    weights: CostWeights,
}

impl RiccatiBackwardPass {
    pub fn new(
        linearizer: Box<dyn DynamicsLinearizer>,
        discretizer: Discretizer,
        weights: CostWeights,
    ) -> Self {
        Self {
            linearizer,
            discretizer,
            weights,
        }
    }

    pub fn linearizer(&self) -> &dyn DynamicsLinearizer {
        self.linearizer.as_ref()
    }

    pub fn discretizer(&self) -> &Discretizer {
        &self.discretizer
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn run(&self, trajectory: &Trajectory) -> Result<GainSchedule> {
        self.run_with_value(trajectory).map(|(schedule, _)| schedule)
    }

    /// Like [`Self::run`], also returning the cost-to-go at the earliest gain step
    /// (zero when the horizon holds no gain step).
    pub fn run_with_value(&self, trajectory: &Trajectory) -> Result<(GainSchedule, StateMatrix)> {
        let horizon = trajectory.horizon();
        info!(
            horizon,
            strategy = self.linearizer.name(),
            dt = self.discretizer.dt(),
            "starting Riccati backward pass"
        );

        let terminal = StateMatrix::zeros(STATE_DIM, STATE_DIM);
        let capacity = horizon.saturating_sub(2);
        let (mut gains, value) = (FIRST_GAIN_STEP..horizon - 1).rev().try_fold(
            (Vec::with_capacity(capacity), terminal),
            |(mut gains, p_prev), t| -> Result<_> {
                let (a, b) = self.linearizer.linearize(trajectory, t)?;
                let (a_d, b_d) = self.discretizer.discretize(&a, &b);
                let (k, p) = lqr_step(&self.weights, &a_d, &b_d, &p_prev, t)?;
                debug!(step = t, gain_norm = k.norm(), "riccati step");
                gains.push(k);
                Ok((gains, p))
            },
        )?;
        gains.reverse();

        let schedule = GainSchedule::new(FIRST_GAIN_STEP, gains)?;
        info!(gains = schedule.len(), "Riccati backward pass finished");
        Ok((schedule, value))
    }
}
