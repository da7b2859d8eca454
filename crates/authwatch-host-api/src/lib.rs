//! Collaborator trait interfaces for authwatch
//!
//! This crate defines the seams between the expiration core and the outside
//! world: where token metadata comes from, how dialogs are shown, and how the
//! user is sent back through login. It contains no transport code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
