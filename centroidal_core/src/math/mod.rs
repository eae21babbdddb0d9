// centroidal_core/src/math/mod.rs

pub mod linalg;
pub mod quaternion;
