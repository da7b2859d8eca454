//! Token expiration core for authwatch
//!
//! This crate contains:
//! - Expiration time math (`classify`, `minutes_left`)
//! - The sans-IO state machine (Checking -> Valid <-> Warning -> Blocked)
//! - The async `Monitor` that drives it with timers, polling and dialogs

mod actions;
mod clock;
mod machine;
mod monitor;

pub use actions::*;
pub use clock::*;
pub use machine::*;
pub use monitor::*;
