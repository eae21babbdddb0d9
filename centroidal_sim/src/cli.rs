use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use centroidal_core::prelude::LinearizationStrategy;

use crate::config::GainConfig;

/// centroidal-lqr: time-varying LQR gains for a floating-base trajectory.
///
/// Reads the `.dat` trajectory artifacts of one directory (or of every
/// trajectory below `--batch-root`), runs the Riccati backward pass and
/// writes the gain files.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the gain configuration TOML file. Built-in defaults when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the trajectory `.dat` files.
    #[arg(short, long, default_value = ".")]
    pub trajectory_dir: PathBuf,

    /// Where to write the gains. Defaults to the trajectory directory.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Process every trajectory directory below this root instead of `--trajectory-dir`.
    #[arg(long)]
    pub batch_root: Option<PathBuf>,

    /// Override the linearization strategy of the configuration.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Simulate the closed loop after computing the gains.
    #[arg(long, default_value_t = false)]
    pub rollout: bool,

    /// Log every backward step.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Analytical,
    FiniteDifference,
}

impl From<StrategyArg> for LinearizationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Analytical => LinearizationStrategy::Analytical,
            StrategyArg::FiniteDifference => LinearizationStrategy::FiniteDifference,
        }
    }
}

impl Cli {
    /// Command-line flags take precedence over the file.
    pub fn apply_overrides(&self, config: &mut GainConfig) {
        if let Some(strategy) = self.strategy {
            config.linearization.strategy = strategy.into();
        }
        if self.rollout {
            config.rollout.enabled = true;
        }
    }

    /// Directory the gains of a single-trajectory run are written to.
    pub fn single_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.trajectory_dir.clone())
    }
}
