#![allow(clippy::cargo_common_metadata)]
use anyhow::Result;
use multicall::{cli, config::Config, core::Dispatcher, setup_logging};

fn main() -> Result<()> {
    // Framework options come from the environment; argv belongs to the command
    let config = Config::from_env()?;

    setup_logging(&config)?;

    // Registration errors are fatal before anything is dispatched
    let registry = cli::build_registry(&config)?;

    let outcome = Dispatcher::new(registry)
        .prefix_matching(config.prefix_matching)
        .run_cmd(std::env::args().collect())?;

    std::process::exit(outcome.exit_code())
}
