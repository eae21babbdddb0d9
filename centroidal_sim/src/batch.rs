// centroidal_sim/src/batch.rs

//! Gain computation for every trajectory below a root directory.
//!
//! Each trajectory gets its own backward pass. Passes share nothing, so they
//! run in parallel on the rayon pool.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Every directory below `root` (itself included) that holds `position_file`,
/// in sorted order.
pub fn discover_trajectory_dirs(root: &Path, position_file: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir() && e.path().join(position_file).is_file())
        .map(|e| e.into_path())
        .collect();
    dirs.sort();
    info!("Found {} trajectories below {:?}", dirs.len(), root);
    dirs
}

/// Where the gains of `trajectory_dir` go: mirrored below `output_root` when
/// one is given, otherwise next to the trajectory files.
pub fn output_dir_for(root: &Path, trajectory_dir: &Path, output_root: Option<&Path>) -> PathBuf {
    match output_root {
        Some(out) => out.join(trajectory_dir.strip_prefix(root).unwrap_or(Path::new(""))),
        None => trajectory_dir.to_path_buf(),
    }
}

/// Runs `job` once per directory on the rayon thread pool.
///
/// Results come back in the order of `dirs`, whatever order the jobs finished in.
pub fn run_batch<T, E, F>(dirs: &[PathBuf], job: F) -> Vec<(PathBuf, Result<T, E>)>
where
    T: Send,
    E: Send,
    F: Fn(&Path) -> Result<T, E> + Sync + Send,
{
    dirs.par_iter()
        .map(|dir| {
            debug!("processing {:?}", dir);
            (dir.clone(), job(dir.as_path()))
        })
        .collect()
}
