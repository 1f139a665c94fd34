//! Command-line argument parsing for the `mcall` commands
//!
//! Each command receives its own argv (program name first) and parses it
//! with one of these structs.

use clap::Parser;
use std::path::PathBuf;

/// Print a greeting
#[derive(Parser, Debug)]
pub struct HelloArgs {
    /// Who to greet
    #[arg(default_value = "world")]
    pub name: String,
}

/// Print the arguments back
#[derive(Parser, Debug)]
pub struct EchoArgs {
    /// Do not print the trailing newline
    #[arg(short = 'n')]
    pub no_newline: bool,

    /// Words to print
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

/// Report file sizes
#[derive(Parser, Debug)]
pub struct SizeArgs {
    /// Files to inspect
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Run an external command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Discard the command's output
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Capture stdout and print it after the command exits
    #[arg(long, conflicts_with = "silent")]
    pub capture: bool,

    /// Program and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Answer name-length requests on a unix socket
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Socket path
    pub socket: PathBuf,

    /// Exit after answering one request
    #[arg(long)]
    pub once: bool,
}

/// Send a name-length request to a running server
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Socket path
    pub socket: PathBuf,

    /// Name to measure
    pub name: String,
}
