//! Shared types for authwatch
//!
//! This crate defines the vocabulary shared by the core state machine, the
//! host adapters and the daemon:
//! - Token metadata (and its Auth2 wire shape)
//! - Monitor state and dismissal bookkeeping
//! - Dialog kinds, outcomes and rendered content
//! - Status snapshots

mod dialogs;
mod status;
mod types;

pub use dialogs::*;
pub use status::*;
pub use types::*;
