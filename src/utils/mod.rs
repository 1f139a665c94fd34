//! Utility modules for common functionality
//!
//! File system probing and subprocess execution shared by commands.

pub mod fs;
pub mod process;

pub use fs::FileSystemUtils;
pub use process::Cmd;
