//! Process execution utilities
//!
//! A small builder over `std::process::Command` with the three modes
//! commands need: traced, silent and interactive.

use crate::error::{MulticallError, Result};
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, instrument};

/// External command to run
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    silent: bool,
    trace: bool,
}

impl Cmd {
    /// Create a command; stdout and stderr are inherited by default
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            silent: false,
            trace: false,
        }
    }

    /// Discard stdout and stderr instead of inheriting them
    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Log the command line before running it
    #[must_use]
    pub fn trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Program and arguments joined with spaces
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion with stdin closed
    #[instrument(skip(self), fields(cmd = %self.command_line()))]
    pub fn run(&self) -> Result<()> {
        self.show_trace();
        let mut cmd = self.command();
        cmd.stdin(Stdio::null())
            .stdout(self.output_stdio())
            .stderr(self.output_stdio());

        let status = cmd.status().map_err(|e| self.spawn_error(e))?;
        self.check_status(status, String::new())
    }

    /// Run to completion and capture stdout
    #[instrument(skip(self), fields(cmd = %self.command_line()))]
    pub fn stdout(&self) -> Result<String> {
        self.show_trace();
        let mut cmd = self.command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(self.output_stdio());

        let output = cmd.output().map_err(|e| self.spawn_error(e))?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(
            "Command finished: exit_code={:?}, stdout_len={}",
            output.status.code(),
            stdout.len()
        );
        self.check_status(output.status, stderr)?;
        Ok(stdout)
    }

    /// Run attached to the terminal, stdin included
    #[instrument(skip(self), fields(cmd = %self.command_line()))]
    pub fn interactive(&self) -> Result<()> {
        if self.silent {
            return Err(MulticallError::validation(format!(
                "interactive command cannot be silent: {}",
                self.command_line()
            )));
        }
        self.show_trace();

        let mut cmd = self.command();
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| self.spawn_error(e))?;
        self.check_status(status, String::new())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn output_stdio(&self) -> Stdio {
        if self.silent {
            Stdio::null()
        } else {
            Stdio::inherit()
        }
    }

    fn show_trace(&self) {
        if self.trace {
            info!("+ {}", self.command_line());
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> MulticallError {
        MulticallError::Process {
            command: self.command_line(),
            exit_code: None,
            stderr: String::new(),
            source: Some(Box::new(e)),
        }
    }

    fn check_status(&self, status: ExitStatus, stderr: String) -> Result<()> {
        if status.success() {
            debug!("Command completed successfully");
            return Ok(());
        }
        Err(MulticallError::process(
            self.command_line(),
            status.code(),
            stderr,
        ))
    }
}
