// centroidal_sim/src/main.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use centroidal_sim::batch::{discover_trajectory_dirs, output_dir_for, run_batch};
use centroidal_sim::cli::Cli;
use centroidal_sim::config::GainConfig;
use centroidal_sim::pipeline::{run_job, JobOutcome};

const DEFAULT_FILTER: &str = "info,centroidal_core=info,centroidal_sim=info";

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if cli.verbose {
        filter = filter
            .add_directive("centroidal_core=debug".parse()?)
            .add_directive("centroidal_sim=debug".parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = GainConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);

    match &cli.batch_root {
        Some(root) => {
            let dirs = discover_trajectory_dirs(root, &config.files.position);
            if dirs.is_empty() {
                bail!(
                    "no directory below {} contains {}",
                    root.display(),
                    config.files.position
                );
            }

            let output_root = cli.output_dir.as_deref();
            let results = run_batch(&dirs, |dir| {
                run_job(&config, dir, &output_dir_for(root, dir, output_root))
            });

            let mut failures = 0;
            for (dir, result) in &results {
                match result {
                    Ok(outcome) => report(outcome),
                    Err(e) => {
                        error!("{}: {}", dir.display(), e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} trajectories failed", failures, results.len());
            }
        }
        None => {
            let outcome = run_job(&config, &cli.trajectory_dir, &cli.single_output_dir())
                .with_context(|| {
                    format!("computing gains for {}", cli.trajectory_dir.display())
                })?;
            report(&outcome);
        }
    }
    Ok(())
}

fn report(outcome: &JobOutcome) {
    info!(
        "{}: {} samples, {} gains written to {:?}",
        outcome.trajectory_dir.display(),
        outcome.horizon,
        outcome.gains,
        outcome.written
    );
    if let Some(rollout) = &outcome.rollout {
        info!(
            "{}: rollout position RMS {:.3e} with feedback, {:.3e} without",
            outcome.trajectory_dir.display(),
            rollout.closed_loop.position_rms,
            rollout.open_loop.position_rms
        );
    }
}
