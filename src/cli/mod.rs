//! The `mcall` demo commands
//!
//! A small toolbox exercising the framework: every operation here becomes
//! an alias of the `mcall` binary.

pub mod args;
pub mod commands;

pub use commands::{Toolbox, build_registry};
