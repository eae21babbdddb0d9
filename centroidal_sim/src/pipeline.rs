// centroidal_sim/src/pipeline.rs

//! One trajectory directory in, one gain schedule (and optionally a rollout
//! report) out.

use std::fs;
use std::path::{Path, PathBuf};

use centroidal_core::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::GainConfig;
use crate::error::SimError;
use crate::io;
use crate::prng::SimulationRng;

/// File name of the rollout summary written next to the gains.
pub const ROLLOUT_REPORT_FILE: &str = "rollout_report.toml";

/// Per-block tracking error of one simulated run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingError {
    pub position_rms: f64,
    pub velocity_rms: f64,
    pub orientation_rms: f64,
    pub angular_velocity_rms: f64,
    pub final_error: f64,
}

impl From<&RolloutReport> for TrackingError {
    fn from(report: &RolloutReport) -> Self {
        Self {
            position_rms: report.rms(StateBlock::Position),
            velocity_rms: report.rms(StateBlock::Velocity),
            orientation_rms: report.rms(StateBlock::Orientation),
            angular_velocity_rms: report.rms(StateBlock::AngularVelocity),
            final_error: report.final_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloutSummary {
    pub seed: u64,
    pub start_step: usize,
    pub samples: usize,
    pub closed_loop: TrackingError,
    pub open_loop: TrackingError,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub trajectory_dir: PathBuf,
    pub horizon: usize,
    pub gains: usize,
    pub written: Vec<PathBuf>,
    pub rollout: Option<RolloutSummary>,
}

/// Assembles the backward pass described by the configuration.
pub fn build_pass(config: &GainConfig) -> Result<RiccatiBackwardPass, SimError> {
    let model = FloatingBaseModel::new(config.model.params())?;
    let linearizer = config
        .linearization
        .strategy
        .build(model, config.linearization.settings());
    let discretizer = Discretizer::new(config.discretization.dt, config.discretization.method)?;
    let weights = config.cost.weights()?;
    Ok(RiccatiBackwardPass::new(linearizer, discretizer, weights))
}

/// Loads the trajectory in `trajectory_dir`, computes its gains and writes
/// them (and the rollout report, when enabled) into `output_dir`.
pub fn run_job(
    config: &GainConfig,
    trajectory_dir: &Path,
    output_dir: &Path,
) -> Result<JobOutcome, SimError> {
    let trajectory = io::load_trajectory(trajectory_dir, &config.files)?;
    let schedule = build_pass(config)?.run(&trajectory)?;
    let written = io::write_gains(&schedule, output_dir, &config.files)?;

    let rollout = if config.rollout.enabled {
        let summary = run_rollout(config, &trajectory, &schedule)?;
        write_rollout_report(&summary, output_dir)?;
        Some(summary)
    } else {
        None
    };

    Ok(JobOutcome {
        trajectory_dir: trajectory_dir.to_path_buf(),
        horizon: trajectory.horizon(),
        gains: schedule.len(),
        written,
        rollout,
    })
}

/// Replays the trajectory from a perturbed start, with and without feedback.
pub fn run_rollout(
    config: &GainConfig,
    trajectory: &Trajectory,
    schedule: &GainSchedule,
) -> Result<RolloutSummary, SimError> {
    let model = FloatingBaseModel::new(config.model.params())?;
    let rollout = ClosedLoopRollout::new(
        model,
        config.rollout.integrator,
        config.discretization.dt,
    )?;

    let x_ref = trajectory.state(schedule.first_step())?;
    let mut rng = SimulationRng::from_seed(config.rollout.seed);
    let x0 = rng.perturb_state(&x_ref, &config.rollout);

    let closed = rollout.run(trajectory, schedule, x0.clone(), true)?;
    let open = rollout.run(trajectory, schedule, x0, false)?;

    let summary = RolloutSummary {
        seed: config.rollout.seed,
        start_step: closed.start_step,
        samples: closed.states.len(),
        closed_loop: TrackingError::from(&closed),
        open_loop: TrackingError::from(&open),
    };
    info!(
        "Rollout final error: {:.3e} closed loop, {:.3e} open loop",
        summary.closed_loop.final_error, summary.open_loop.final_error
    );
    Ok(summary)
}

pub fn write_rollout_report(summary: &RolloutSummary, dir: &Path) -> Result<PathBuf, SimError> {
    let path = dir.join(ROLLOUT_REPORT_FILE);
    let contents = toml::to_string_pretty(summary)?;
    fs::write(&path, contents).map_err(|source| SimError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilesConfig;
    use crate::io::tests::write_trajectory;

    #[test]
    fn test_job_writes_gains_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 30, true);

        let mut config = GainConfig::default();
        config.rollout.enabled = true;
        let out = dir.path().join("out");
        let outcome = run_job(&config, dir.path(), &out).unwrap();

        assert_eq!(outcome.horizon, 30);
        assert_eq!(outcome.gains, 28);
        assert_eq!(outcome.written.len(), 2);
        for path in &outcome.written {
            let contents = fs::read_to_string(path).unwrap();
            assert_eq!(contents.lines().count(), 28);
        }

        let summary = outcome.rollout.unwrap();
        assert_eq!(summary.start_step, 1);
        assert_eq!(summary.samples, 29);
        assert!(summary.closed_loop.final_error.is_finite());

        let contents = fs::read_to_string(out.join(ROLLOUT_REPORT_FILE)).unwrap();
        let report: toml::Table = toml::from_str(&contents).unwrap();
        assert!(report.get("closed_loop").is_some());
        assert_eq!(report.get("seed").and_then(|v| v.as_integer()), Some(42));
    }

    #[test]
    fn test_strategies_produce_comparable_gains() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 12, true);
        let trajectory = io::load_trajectory(dir.path(), &files).unwrap();

        let mut config = GainConfig::default();
        let analytical = build_pass(&config).unwrap().run(&trajectory).unwrap();
        config.linearization.strategy = LinearizationStrategy::FiniteDifference;
        let numeric = build_pass(&config).unwrap().run(&trajectory).unwrap();

        assert_eq!(analytical.len(), numeric.len());
        for ((_, k_an), (_, k_fd)) in analytical.iter().zip(numeric.iter()) {
            let scale = k_an.amax().max(1.0);
            assert!((k_an - k_fd).amax() / scale < 1e-3);
        }
    }

    #[test]
    fn test_singular_input_cost_surfaces_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = FilesConfig::default();
        write_trajectory(dir.path(), &files, 8, true);

        let mut config = GainConfig::default();
        config.cost.r_diagonal = vec![0.0; CONTROL_DIM];
        let err = run_job(&config, dir.path(), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            SimError::Lqr(LqrError::Numerical(NumericalError::SingularInputHessian { step: 6 }))
        ));
        // Nothing is written on failure.
        assert!(!dir.path().join(&files.gains_first).exists());
    }
}
