// centroidal_sim/src/lib.rs

//! The driver around `centroidal_core`: configuration, trajectory files,
//! gain export, batch processing and closed-loop rollouts.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod prng;
