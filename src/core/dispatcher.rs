//! Command dispatch
//!
//! Picks the operation to run from an explicit alias or from the name the
//! binary was invoked under, and runs it. Nothing here exits the process:
//! every path ends in an [`Outcome`] that `main` turns into an exit code.

use crate::core::{
    installer::{InstallArgs, SymlinkInstaller},
    registry::{Action, HELP_ALIAS, Registry},
    resolver::Resolution,
};
use anyhow::Context;
use clap::{Parser, error::ErrorKind};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Exit status reported after printing help
pub const EXIT_HELP: i32 = 2;

/// How a dispatch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The chosen command ran to completion
    Dispatched,
    /// Help was printed, on request or because no alias was given
    HelpShown,
    /// No command matched the alias; help was printed
    NotFound(String),
    /// Several aliases start with the token; help was printed
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },
}

impl Outcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Dispatched => 0,
            Self::HelpShown | Self::NotFound(_) | Self::Ambiguous { .. } => EXIT_HELP,
        }
    }
}

/// Split argv into the alias to run and the argv that command receives
///
/// A program named `prefix.alias` selects `alias` and keeps argv as is.
/// Otherwise `argv[1]` is the alias and is removed from the arguments.
/// Returns `None` when no alias can be derived.
pub fn split_invocation(mut argv: Vec<String>) -> Option<(String, Vec<String>)> {
    let program = argv.first()?;
    let base = Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.clone());

    if let Some((_, alias)) = base.split_once('.') {
        return Some((alias.to_string(), argv));
    }
    if argv.len() < 2 {
        return None;
    }
    let alias = argv.remove(1);
    Some((alias, argv))
}

enum Target {
    Alias(String),
    Ambiguous(Vec<String>),
    Missing,
}

/// Runs commands from a [`Registry`], writing help to `W`
pub struct Dispatcher<R, W = io::Stdout> {
    registry: Registry<R>,
    out: W,
    prefix_matching: bool,
}

impl<R> Dispatcher<R> {
    /// Create a dispatcher printing help to stdout
    pub fn new(registry: Registry<R>) -> Self {
        Self::with_output(registry, io::stdout())
    }
}

impl<R, W: Write> Dispatcher<R, W> {
    pub fn with_output(registry: Registry<R>, out: W) -> Self {
        Self {
            registry,
            out,
            prefix_matching: false,
        }
    }

    /// Also accept a token that is a prefix of exactly one alias
    pub fn prefix_matching(mut self, enabled: bool) -> Self {
        self.prefix_matching = enabled;
        self
    }

    pub fn registry(&self) -> &Registry<R> {
        &self.registry
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Derive the alias from argv and run it
    #[instrument(skip_all)]
    pub fn run_cmd(&mut self, argv: Vec<String>) -> anyhow::Result<Outcome> {
        // without an alias argv holds at most the program name
        let program: Vec<String> = argv.iter().take(1).cloned().collect();
        match split_invocation(argv) {
            Some((alias, args)) => self.run(&alias, &args),
            None => {
                debug!("No command given");
                self.execute(HELP_ALIAS, &program)?;
                Ok(Outcome::HelpShown)
            }
        }
    }

    /// Run the command registered as `alias` with `args` as its argv
    #[instrument(skip(self, args))]
    pub fn run(&mut self, alias: &str, args: &[String]) -> anyhow::Result<Outcome> {
        match self.target(alias) {
            Target::Alias(resolved) => self.execute(&resolved, args),
            Target::Ambiguous(candidates) => {
                warn!(command = alias, ?candidates, "ambiguous command");
                self.execute(HELP_ALIAS, args)?;
                Ok(Outcome::Ambiguous {
                    token: alias.to_string(),
                    candidates,
                })
            }
            Target::Missing => {
                warn!(command = alias, "command not found");
                self.execute(HELP_ALIAS, args)?;
                Ok(Outcome::NotFound(alias.to_string()))
            }
        }
    }

    fn target(&self, alias: &str) -> Target {
        if !self.prefix_matching {
            return match self.registry.lookup(alias) {
                Some(op) => Target::Alias(op.alias().to_string()),
                None => Target::Missing,
            };
        }

        match self.registry.resolve(alias) {
            Resolution::Exact(found) | Resolution::Prefix(found) => {
                Target::Alias(found.to_string())
            }
            Resolution::Ambiguous(candidates) => {
                Target::Ambiguous(candidates.into_iter().map(str::to_string).collect())
            }
            Resolution::NotFound => Target::Missing,
        }
    }

    /// Run a registered operation; `help` always reports `HelpShown`
    fn execute(&mut self, alias: &str, args: &[String]) -> anyhow::Result<Outcome> {
        let (op, receiver) = self
            .registry
            .operation_mut(alias)
            .with_context(|| format!("command {alias} is not registered"))?;
        let outcome = if alias == HELP_ALIAS {
            Outcome::HelpShown
        } else {
            Outcome::Dispatched
        };

        match op.action() {
            Action::Command(action) => {
                debug!("Running command: {}", alias);
                action(receiver, args).with_context(|| format!("command {alias} failed"))?;
                Ok(outcome)
            }
            Action::Help => {
                self.write_help()?;
                Ok(outcome)
            }
            Action::Install => self.install(args),
        }
    }

    fn install(&mut self, args: &[String]) -> anyhow::Result<Outcome> {
        let parsed = match InstallArgs::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                write!(self.out, "{e}").context("Failed to write installer usage")?;
                return Ok(Outcome::Dispatched);
            }
            Err(e) => return Err(e).context("invalid installer arguments"),
        };
        let program = args
            .first()
            .context("installer needs the program path as argv[0]")?;

        let installer = SymlinkInstaller::from_args(&parsed, self.registry.installer_config());
        let report = installer.install(
            program,
            self.registry
                .all()
                .map(|op| (op.alias(), op.display_name())),
        )?;

        info!(
            "Symlinks in {}: removed {}, created {}",
            report.bin_dir.display(),
            report.removed.len(),
            report.created.len()
        );
        Ok(Outcome::Dispatched)
    }

    fn write_help(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "{}", self.registry.help_listing()).context("Failed to write help")?;
        self.out.flush().context("Failed to flush help")?;
        Ok(())
    }
}
