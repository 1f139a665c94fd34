//! # multicall
//!
//! Build a single executable that behaves as many commands, busybox style.
//! Operations are registered on a receiver under identifiers such as
//! `CM_Commit`; each becomes a command reachable by a short alias, either
//! as `tool cm ...` or through a `tool.cm` symlink.
//!
//! ## Features
//!
//! - Alias table derived from a naming convention
//! - Exact or unique-prefix alias resolution
//! - Dispatch by argument or by program name
//! - Symlink installer for program-name dispatch
//! - Unix socket request/response channel
//!
//! ## Example
//!
//! ```no_run
//! use multicall::core::{Dispatcher, Registry};
//!
//! struct Git;
//!
//! impl Git {
//!     fn status(&mut self, _args: &[String]) -> anyhow::Result<()> {
//!         println!("clean");
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::builder(Git).op("ST_Status", Git::status).build()?;
//! let outcome = Dispatcher::new(registry).run_cmd(std::env::args().collect())?;
//! std::process::exit(outcome.exit_code());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod rpc;
pub mod utils;

use anyhow::Result;
use crate::config::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging on stderr; stdout is left to the commands
pub fn setup_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_directive())
        .map_err(|e| anyhow::anyhow!("Invalid log filter {:?}: {}", config.log_directive(), e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
