//! L5R Cards - deck list and card image tooling
//!
//! Loads the L5R Oracle XML card database, resolves plain-text deck lists
//! against it, and classifies card images into print runs.

pub mod classify;
pub mod core;
pub mod error;
pub mod loader;
pub mod rename;

pub use error::{CardError, Result};
