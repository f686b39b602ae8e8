//! Infrastructure adapters and runtime bootstrap.

pub mod assets;
pub mod error;
pub mod fs_api;
pub mod telemetry;
