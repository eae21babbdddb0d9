// centroidal_core/src/models/linearization/mod.rs

use dyn_clone::DynClone;
use serde::Deserialize;
use std::fmt::Debug;

use crate::error::Result;
use crate::models::dynamics::FloatingBaseModel;
use crate::trajectory::Trajectory;
use crate::types::{InputMatrix, StateMatrix};

// --- LINEARIZER TRAIT ---
// Produces the continuous-time Jacobians of the floating-base dynamics
// about one sample of the reference trajectory.
pub trait DynamicsLinearizer: DynClone + Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Computes `(A_t, B_t)` with `A_t = ∂ẋ/∂x` (13x13) and `B_t = ∂ẋ/∂u` (13x6)
    /// at trajectory index `t`.
    ///
    /// Deterministic in the trajectory; strategies that difference against the
    /// next sample require `t + 1 < horizon`.
    fn linearize(&self, trajectory: &Trajectory, t: usize) -> Result<(StateMatrix, InputMatrix)>;
}

// This macro automatically generates the implementation of `Clone` for `Box<dyn DynamicsLinearizer>`.
dyn_clone::clone_trait_object!(DynamicsLinearizer);

/// Linearizer selection as it appears in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LinearizationStrategy {
    #[default]
    Analytical,
    FiniteDifference,
}

impl LinearizationStrategy {
    pub fn build(
        self,
        model: FloatingBaseModel,
        settings: FiniteDifferenceSettings,
    ) -> Box<dyn DynamicsLinearizer> {
        match self {
            LinearizationStrategy::Analytical => Box::new(AnalyticalLinearizer::new(model)),
            LinearizationStrategy::FiniteDifference => {
                Box::new(FiniteDifferenceLinearizer::new(model, settings))
            }
        }
    }
}

/// Maximum disagreement between two linearizations of the same sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearizationDiscrepancy {
    pub max_abs_a: f64,
    pub max_abs_b: f64,
    /// `max_abs_a` divided by the largest entry magnitude of either `A`.
    pub normalized_a: f64,
    /// `max_abs_b` divided by the largest entry magnitude of either `B`.
    pub normalized_b: f64,
}

impl LinearizationDiscrepancy {
    pub fn within(&self, tolerance: f64) -> bool {
        self.normalized_a <= tolerance && self.normalized_b <= tolerance
    }
}

/// Linearizes sample `t` with both strategies and reports how far apart they are.
pub fn compare_linearizers(
    reference: &dyn DynamicsLinearizer,
    candidate: &dyn DynamicsLinearizer,
    trajectory: &Trajectory,
    t: usize,
) -> Result<LinearizationDiscrepancy> {
    let (a_ref, b_ref) = reference.linearize(trajectory, t)?;
    let (a_cand, b_cand) = candidate.linearize(trajectory, t)?;

    let normalized = |diff: f64, scale: f64| if scale > 0.0 { diff / scale } else { diff };

    let max_abs_a = (&a_ref - &a_cand).amax();
    let max_abs_b = (&b_ref - &b_cand).amax();
    Ok(LinearizationDiscrepancy {
        max_abs_a,
        max_abs_b,
        normalized_a: normalized(max_abs_a, a_ref.amax().max(a_cand.amax())),
        normalized_b: normalized(max_abs_b, b_ref.amax().max(b_cand.amax())),
    })
}

mod analytical;
mod finite_difference;

pub use analytical::AnalyticalLinearizer;
pub use finite_difference::{FiniteDifferenceLinearizer, FiniteDifferenceSettings};
