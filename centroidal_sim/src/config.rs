// centroidal_sim/src/config.rs

//! Loading and validating the gain computation settings from a TOML file.

use std::path::{Path, PathBuf};

use centroidal_core::prelude::*;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use nalgebra::{Matrix3, Vector3};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # GainConfig
/// Everything the driver needs to turn one trajectory directory into a gain
/// schedule. Every section is optional and falls back to the Solo defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct GainConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub linearization: LinearizationConfig,

    #[serde(default)]
    pub discretization: DiscretizationConfig,

    #[serde(default)]
    pub cost: CostConfig,

    #[serde(default)]
    pub files: FilesConfig,

    #[serde(default)]
    pub rollout: RolloutConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections of the TOML file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Base mass in kg.
    pub mass: f64,
    /// Principal moments of inertia of the base, body frame.
    pub inertia_diagonal: [f64; 3],
    pub inertia_model: InertiaModel,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let solo = RigidBodyParams::solo();
        let inertia = solo.inertia_body.diagonal();
        Self {
            mass: solo.mass,
            inertia_diagonal: [inertia.x, inertia.y, inertia.z],
            inertia_model: InertiaModel::BodyFrame,
        }
    }
}

impl ModelConfig {
    pub fn params(&self) -> RigidBodyParams {
        RigidBodyParams {
            mass: self.mass,
            inertia_body: Matrix3::from_diagonal(&Vector3::from(self.inertia_diagonal)),
            inertia_model: self.inertia_model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearizationConfig {
    pub strategy: LinearizationStrategy,
    /// Finite-difference step used where the trajectory does not move.
    pub epsilon: f64,
    /// Below this next-input norm the finite-difference `B_t` is left at zero.
    pub input_threshold: f64,
}

impl Default for LinearizationConfig {
    fn default() -> Self {
        let fd = FiniteDifferenceSettings::default();
        Self {
            strategy: LinearizationStrategy::Analytical,
            epsilon: fd.epsilon,
            input_threshold: fd.input_threshold,
        }
    }
}

impl LinearizationConfig {
    pub fn settings(&self) -> FiniteDifferenceSettings {
        FiniteDifferenceSettings {
            epsilon: self.epsilon,
            input_threshold: self.input_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscretizationConfig {
    /// Sample interval of the trajectory files in seconds.
    pub dt: f64,
    pub method: Discretization,
}

impl Default for DiscretizationConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            method: Discretization::Euler,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    /// Diagonal of `Q`, in state order `[p, v, q(x, y, z, w), ω]`.
    pub q_diagonal: Vec<f64>,
    /// Diagonal of `R`, in input order `[F, M]`.
    pub r_diagonal: Vec<f64>,
}

/// The Solo tuning weights. These are the weights used, not a zero `Q` that
/// would yield all-zero gains.
impl Default for CostConfig {
    fn default() -> Self {
        Self {
            q_diagonal: vec![
                5000.0, 0.0, 5000.0, // position
                0.05, 0.0, 0.05, // velocity
                1e5, 1e5, 1e5, 1e5, // orientation
                0.0, 0.0, 0.0, // angular velocity
            ],
            r_diagonal: vec![0.1, 10.0, 0.1, 10.0, 10.0, 10.0],
        }
    }
}

impl CostConfig {
    pub fn weights(&self) -> Result<CostWeights, LqrError> {
        CostWeights::from_diagonals(&self.q_diagonal, &self.r_diagonal)
    }
}

/// How the 78-value gain rows are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum GainLayout {
    /// Two files holding columns `0..39` and `39..78`.
    #[default]
    Split,
    /// One file with all 78 columns.
    Combined,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub position: String,
    pub velocity: String,
    pub orientation: String,
    pub angular_velocity: String,
    /// Optional: zeros are substituted when the file is absent.
    pub force: String,
    /// Optional: zeros are substituted when the file is absent.
    pub moment: String,
    pub gains_first: String,
    pub gains_second: String,
    pub gains_combined: String,
    pub layout: GainLayout,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            position: "quadruped_com.dat".into(),
            velocity: "quadruped_com_vel.dat".into(),
            orientation: "quadruped_quaternion.dat".into(),
            angular_velocity: "quadruped_base_ang_velocities.dat".into(),
            force: "quadruped_centroidal_forces.dat".into(),
            moment: "quadruped_centroidal_moments.dat".into(),
            gains_first: "quadruped_centroidal_gains1.dat".into(),
            gains_second: "quadruped_centroidal_gains2.dat".into(),
            gains_combined: "quadruped_centroidal_gains.dat".into(),
            layout: GainLayout::Split,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolloutConfig {
    /// Simulate the closed loop after the gains are written.
    pub enabled: bool,
    /// Seed for the initial-state perturbation.
    pub seed: u64,
    pub position_stddev: f64,
    pub velocity_stddev: f64,
    /// Standard deviation of the rotation vector, in radians.
    pub orientation_stddev: f64,
    pub angular_velocity_stddev: f64,
    pub integrator: IntegratorKind,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seed: 42,
            position_stddev: 0.01,
            velocity_stddev: 0.05,
            orientation_stddev: 0.02,
            angular_velocity_stddev: 0.1,
            integrator: IntegratorKind::Rk4,
        }
    }
}

// =========================================================================
// == Loading and Validation ==
// =========================================================================

impl GainConfig {
    /// Reads and validates the configuration, or returns the defaults when no
    /// file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: GainConfig = match path {
            Some(path) => {
                // Figment silently treats a missing file as empty.
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Figment::new()
                    .merge(Toml::file(path))
                    .extract()
                    .map_err(Box::new)?
            }
            None => GainConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GainConfig = Figment::new()
            .merge(Toml::string(contents))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the core would fail on late, or silently misuse.
    ///
    /// `R` is only checked for length and finiteness: whether it makes the
    /// input Hessian positive definite is reported by the backward pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("model.mass", self.model.mass)?;
        for moment in self.model.inertia_diagonal {
            positive("model.inertia_diagonal", moment)?;
        }
        positive("linearization.epsilon", self.linearization.epsilon)?;
        non_negative(
            "linearization.input_threshold",
            self.linearization.input_threshold,
        )?;
        positive("discretization.dt", self.discretization.dt)?;

        diagonal("cost.q_diagonal", &self.cost.q_diagonal, STATE_DIM)?;
        for value in &self.cost.q_diagonal {
            non_negative("cost.q_diagonal", *value)?;
        }
        diagonal("cost.r_diagonal", &self.cost.r_diagonal, CONTROL_DIM)?;

        let rollout = &self.rollout;
        for (field, value) in [
            ("rollout.position_stddev", rollout.position_stddev),
            ("rollout.velocity_stddev", rollout.velocity_stddev),
            ("rollout.orientation_stddev", rollout.orientation_stddev),
            ("rollout.angular_velocity_stddev", rollout.angular_velocity_stddev),
        ] {
            non_negative(field, value)?;
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive and finite, got {}", value),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be non-negative and finite, got {}", value),
        })
    }
}

fn diagonal(field: &'static str, values: &[f64], len: usize) -> Result<(), ConfigError> {
    if values.len() != len {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected {} values, got {}", len, values.len()),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::Invalid {
            field,
            reason: "contains a non-finite value".into(),
        });
    }
    Ok(())
}
