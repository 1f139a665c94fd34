//! Configuration management for multi-call binaries
//!
//! The command line belongs to whichever command gets dispatched, so
//! framework-level options come from the environment instead of flags.

use crate::error::MulticallError;
use serde::{Deserialize, Serialize};

/// Environment variable enabling debug logging
pub const ENV_DEBUG: &str = "MULTICALL_DEBUG";
/// Environment variable holding an explicit `EnvFilter` directive
pub const ENV_LOG: &str = "MULTICALL_LOG";
/// Environment variable enabling unambiguous-prefix dispatch
pub const ENV_PREFIX_MATCH: &str = "MULTICALL_PREFIX_MATCH";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Explicit log filter, overrides `debug`
    pub log_filter: Option<String>,
    /// Accept a unique alias prefix when no alias matches exactly
    pub prefix_matching: bool,
    /// Built-in symlink installer settings
    pub installer: InstallerConfig,
}

/// Symlink installer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallerConfig {
    /// Alias the installer command is registered under
    pub alias: String,
    /// Longest symlink chain followed when locating the binary
    pub max_link_hops: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_filter: None,
            prefix_matching: false,
            installer: InstallerConfig::default(),
        }
    }
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            alias: "symlinkops".to_string(),
            max_link_hops: 20,
        }
    }
}

impl Config {
    /// Create configuration from the process environment
    pub fn from_env() -> Result<Self, MulticallError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MulticallError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(ENV_DEBUG, &value)?;
        }
        if let Some(value) = lookup(ENV_PREFIX_MATCH) {
            config.prefix_matching = parse_flag(ENV_PREFIX_MATCH, &value)?;
        }
        config.log_filter = lookup(ENV_LOG).filter(|v| !v.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), MulticallError> {
        let alias = &self.installer.alias;
        if alias.is_empty() || alias.chars().any(char::is_uppercase) {
            return Err(MulticallError::config(format!(
                "installer alias must be non-empty lowercase: {alias:?}"
            )));
        }

        if self.installer.max_link_hops == 0 {
            return Err(MulticallError::config(
                "installer max_link_hops must be at least 1",
            ));
        }

        Ok(())
    }

    /// Filter directive handed to the tracing subscriber
    pub fn log_directive(&self) -> &str {
        match &self.log_filter {
            Some(filter) => filter,
            None if self.debug => "debug",
            None => "info",
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, MulticallError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(MulticallError::config(format!(
            "{key} expects a boolean, got {other:?}"
        ))),
    }
}
