//! Error types for the multi-call framework
//!
//! Registration problems (bad names, alias collisions) and installer
//! failures are fatal: they surface as `Err` and are never retried.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the multi-call framework
#[derive(Error, Debug)]
pub enum MulticallError {
    /// An operation identifier does not follow the naming convention
    #[error("invalid op method: {identifier}")]
    InvalidName { identifier: String },

    /// An identifier decoded to an empty display name
    #[error("empty method name: {identifier}")]
    EmptyDisplayName { identifier: String },

    /// An alias given to `add` is empty or not lowercase
    #[error("invalid alias: {alias:?}")]
    InvalidAlias { alias: String },

    /// Two operations claim the same alias
    #[error("alias in use: {alias}")]
    AliasInUse { alias: String },

    /// A symlink chain is longer than the hop limit
    #[error("too many symlinks resolving {path} (stopped at {last} after {hops} hops)")]
    SymlinkLoop {
        path: PathBuf,
        last: PathBuf,
        hops: usize,
    },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process execution errors
    #[error("Process error: {command} failed")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unix socket request/response errors
    #[error("RPC error: {message} ({path})")]
    Rpc {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl MulticallError {
    pub fn invalid_name(identifier: impl Into<String>) -> Self {
        Self::InvalidName {
            identifier: identifier.into(),
        }
    }

    pub fn alias_in_use(alias: impl Into<String>) -> Self {
        Self::AliasInUse {
            alias: alias.into(),
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            stderr: stderr.into(),
            source: None,
        }
    }

    /// Create a new RPC error wrapping an underlying cause
    pub fn rpc<P: Into<PathBuf>, E>(message: impl Into<String>, path: P, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Rpc {
            message: message.into(),
            path: path.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MulticallError>;
