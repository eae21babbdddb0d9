// centroidal_sim/src/error.rs

use std::path::PathBuf;

use centroidal_core::error::LqrError;
use thiserror::Error;

use crate::io::IoError;

/// Everything that can stop one trajectory from producing gains.
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("gain computation failed: {0}")]
    Lqr(#[from] LqrError),

    #[error("failed to serialize rollout report: {0}")]
    Report(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
