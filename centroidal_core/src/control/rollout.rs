// centroidal_core/src/control/rollout.rs

use tracing::debug;

use crate::control::schedule::GainSchedule;
use crate::control::state_error;
use crate::error::{DataError, NumericalError, Result};
use crate::layout::StateBlock;
use crate::models::dynamics::{Dynamics, FloatingBaseModel};
use crate::trajectory::Trajectory;
use crate::types::{State, STATE_DIM};
use crate::utils::integrators::IntegratorKind;

/// Tracking quality of one simulated run against the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutReport {
    /// Trajectory index of `states[0]`.
    pub start_step: usize,
    /// Simulated states, one per trajectory index from `start_step` on.
    pub states: Vec<State>,
    /// Root-mean-square of the per-block error norm over all states.
    pub block_rms: [(StateBlock, f64); 4],
    /// Norm of the full state error at the last simulated state.
    pub final_error: f64,
}

impl RolloutReport {
    pub fn rms(&self, block: StateBlock) -> f64 {
        self.block_rms
            .iter()
            .find(|(b, _)| *b == block)
            .map(|(_, rms)| *rms)
            .unwrap_or(0.0)
    }
}

/// Simulates the nonlinear floating-base model along the span of a gain
/// schedule, applying `u = u_ref + K_t (x − x_ref)` at every scheduled index.
///
/// The quaternion is renormalized after every integration step.
#[derive(Debug, Clone)]
pub struct ClosedLoopRollout {
    model: FloatingBaseModel,
    integrator: IntegratorKind,
    dt: f64,
}

impl ClosedLoopRollout {
    pub fn new(model: FloatingBaseModel, integrator: IntegratorKind, dt: f64) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(DataError::InvalidParameter(format!(
                "rollout step must be positive and finite, got {}",
                dt
            ))
            .into());
        }
        Ok(Self {
            model,
            integrator,
            dt,
        })
    }

    /// Runs from `x0` at `schedule.first_step()` to the index after the last gain.
    ///
    /// With `feedback` off the reference wrench is replayed open loop, which
    /// gives the baseline the closed-loop run is compared against.
    pub fn run(
        &self,
        trajectory: &Trajectory,
        schedule: &GainSchedule,
        x0: State,
        feedback: bool,
    ) -> Result<RolloutReport> {
        if x0.len() != STATE_DIM {
            return Err(DataError::Dimension {
                name: "initial state",
                expected_rows: STATE_DIM,
                expected_cols: 1,
                rows: x0.len(),
                cols: 1,
            }
            .into());
        }

        let integrator = self.integrator.integrator();
        let steps = schedule.steps();
        let start_step = steps.start;
        let mut states = Vec::with_capacity(steps.len() + 1);
        let mut x = x0;

        for t in steps {
            let x_ref = trajectory.state(t)?;
            let mut u = trajectory.input(t)?;
            if feedback {
                if let Some(correction) = schedule.feedback(t, &x, &x_ref) {
                    u += correction;
                }
            }
            let mut x_next = self
                .model
                .propagate(&x, &u, t as f64 * self.dt, self.dt, integrator);
            FloatingBaseModel::normalize_orientation(&mut x_next);
            if x_next.iter().any(|v| !v.is_finite()) {
                return Err(NumericalError::NonFinite {
                    what: "rollout state",
                    step: t,
                }
                .into());
            }
            states.push(std::mem::replace(&mut x, x_next));
        }
        states.push(x);

        let errors = states
            .iter()
            .enumerate()
            .map(|(offset, x)| -> Result<State> {
                Ok(state_error(x, &trajectory.state(start_step + offset)?))
            })
            .collect::<Result<Vec<State>>>()?;

        let block_rms = StateBlock::ALL.map(|block| {
            let range = block.range();
            let mean_sq = errors
                .iter()
                .map(|e| e.rows(range.start, range.len()).norm_squared())
                .sum::<f64>()
                / errors.len() as f64;
            (block, mean_sq.sqrt())
        });
        let final_error = errors.last().map(|e| e.norm()).unwrap_or(0.0);

        debug!(
            start_step,
            states = states.len(),
            feedback,
            final_error,
            "rollout finished"
        );

        Ok(RolloutReport {
            start_step,
            states,
            block_rms,
            final_error,
        })
    }
}
