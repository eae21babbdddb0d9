// centroidal_core/src/lib.rs

// This file defines the public modules of the library.
pub mod control;
pub mod error;
pub mod layout;
pub mod math;
pub mod models;
pub mod prelude;
pub mod trajectory;
pub mod types;
pub mod utils;
