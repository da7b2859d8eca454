//! Shared utilities for authwatch
//!
//! This crate provides:
//! - ID types (MonitorId)
//! - Time utilities (wall-clock milliseconds, mock time, the `Clock` seam)
//! - Error types
//! - Default paths for the config file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
