//! Command registry
//!
//! Maps aliases to operations bound to a single receiver value. Operations
//! are registered by identifier (`CM_Commit`, `Status`, ...) and decoded
//! with [`NameCodec`]; the registry then synthesizes the built-in `help`
//! listing and the symlink installer.
//!
//! ```
//! use multicall::core::Registry;
//!
//! #[derive(Default)]
//! struct Git {
//!     commits: u32,
//! }
//!
//! impl Git {
//!     fn commit(&mut self, _args: &[String]) -> anyhow::Result<()> {
//!         self.commits += 1;
//!         Ok(())
//!     }
//!
//!     fn status(&mut self, _args: &[String]) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = Registry::builder(Git::default())
//!     .op("CM_Commit", Git::commit)
//!     .op("Status", Git::status)
//!     .build()?;
//! assert_eq!(registry.lookup("cm").unwrap().display_name(), "Commit");
//! # Ok::<(), multicall::error::MulticallError>(())
//! ```

use crate::{
    config::InstallerConfig,
    core::{
        naming::NameCodec,
        resolver::{self, Resolution},
    },
    error::{MulticallError, Result},
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Alias of the synthesized help command
pub const HELP_ALIAS: &str = "help";

/// Boxed command body; receives the receiver and the command's argv
pub type ActionFn<R> = Box<dyn Fn(&mut R, &[String]) -> anyhow::Result<()>>;

/// What running an operation does
pub enum Action<R> {
    /// A user-supplied command
    Command(ActionFn<R>),
    /// Print the sorted alias listing
    Help,
    /// Maintain the `<prefix>.<alias>` symlink set
    Install,
}

/// One registered operation
pub struct Operation<R> {
    alias: String,
    display_name: String,
    action: Action<R>,
}

impl<R> Operation<R> {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Display name shown by `help`; empty for operations added by alias only
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn action(&self) -> &Action<R> {
        &self.action
    }

    /// Line printed for this operation in the help listing
    pub fn help_line(&self) -> String {
        if self.display_name.is_empty() {
            self.alias.clone()
        } else {
            format!("{} => {}", self.alias, self.display_name)
        }
    }
}

impl<R> fmt::Debug for Operation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.action {
            Action::Command(_) => "command",
            Action::Help => "help",
            Action::Install => "install",
        };
        f.debug_struct("Operation")
            .field("alias", &self.alias)
            .field("display_name", &self.display_name)
            .field("action", &kind)
            .finish()
    }
}

/// Alias table owning the receiver every operation is bound to
pub struct Registry<R> {
    receiver: R,
    ops: BTreeMap<String, Operation<R>>,
    installer: InstallerConfig,
}

impl<R> Registry<R> {
    /// Start registering operations on `receiver`
    pub fn builder(receiver: R) -> RegistryBuilder<R> {
        RegistryBuilder {
            receiver,
            operations: Vec::new(),
            installer: InstallerConfig::default(),
        }
    }

    /// Build a registry from `(identifier, action)` pairs with default settings
    pub fn build<I, S>(receiver: R, operations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ActionFn<R>)>,
        S: AsRef<str>,
    {
        Self::build_with(receiver, operations, InstallerConfig::default())
    }

    /// Build a registry from `(identifier, action)` pairs
    ///
    /// Fails when an identifier does not follow the naming convention or when
    /// two operations decode to the same alias.
    pub fn build_with<I, S>(receiver: R, operations: I, installer: InstallerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ActionFn<R>)>,
        S: AsRef<str>,
    {
        let codec = NameCodec::new()?;
        let mut registry = Self {
            receiver,
            ops: BTreeMap::new(),
            installer,
        };

        for (identifier, action) in operations {
            let name = codec.decode(identifier.as_ref())?;
            debug!(
                "Registering {} as {:?}",
                identifier.as_ref(),
                name.alias
            );
            registry.insert(Operation {
                alias: name.alias,
                display_name: name.display_name,
                action: Action::Command(action),
            })?;
        }

        if !registry.ops.contains_key(HELP_ALIAS) {
            registry.insert(Operation {
                alias: HELP_ALIAS.to_string(),
                display_name: "Help".to_string(),
                action: Action::Help,
            })?;
        }

        let installer_alias = registry.installer.alias.clone();
        registry.insert(Operation {
            alias: installer_alias,
            display_name: "SymlinkOPs".to_string(),
            action: Action::Install,
        })?;

        Ok(registry)
    }

    /// Register a command by alias only; it gets no display name and no symlink
    pub fn add<F>(&mut self, alias: impl Into<String>, action: F) -> Result<()>
    where
        F: Fn(&mut R, &[String]) -> anyhow::Result<()> + 'static,
    {
        let alias = alias.into();
        if alias.is_empty() || alias.chars().any(char::is_uppercase) {
            return Err(MulticallError::InvalidAlias { alias });
        }

        debug!("Adding command {:?}", alias);
        self.insert(Operation {
            alias,
            display_name: String::new(),
            action: Action::Command(Box::new(action)),
        })
    }

    /// Exact alias lookup
    pub fn lookup(&self, alias: &str) -> Option<&Operation<R>> {
        self.ops.get(alias)
    }

    /// Exact-then-unique-prefix resolution of `token`
    pub fn resolve(&self, token: &str) -> Resolution<'_> {
        resolver::resolve(&self.ops, token)
    }

    /// All operations, sorted by alias
    pub fn all(&self) -> impl Iterator<Item = &Operation<R>> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    pub fn installer_config(&self) -> &InstallerConfig {
        &self.installer
    }

    /// The `help` output: one line per operation, sorted by alias
    pub fn help_listing(&self) -> String {
        self.all()
            .map(Operation::help_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Borrow an operation together with the receiver it runs against
    pub(crate) fn operation_mut(&mut self, alias: &str) -> Option<(&Operation<R>, &mut R)> {
        let op = self.ops.get(alias)?;
        Some((op, &mut self.receiver))
    }

    fn insert(&mut self, op: Operation<R>) -> Result<()> {
        if self.ops.contains_key(&op.alias) {
            return Err(MulticallError::alias_in_use(op.alias));
        }
        self.ops.insert(op.alias.clone(), op);
        Ok(())
    }
}

impl<R> fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.ops.values().collect::<Vec<_>>())
            .field("installer", &self.installer)
            .finish_non_exhaustive()
    }
}

/// Collects operations before building a [`Registry`]
pub struct RegistryBuilder<R> {
    receiver: R,
    operations: Vec<(String, ActionFn<R>)>,
    installer: InstallerConfig,
}

impl<R> RegistryBuilder<R> {
    /// Register `action` under an identifier such as `CM_Commit`
    pub fn op<F>(mut self, identifier: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut R, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.operations.push((identifier.into(), Box::new(action)));
        self
    }

    /// Override the built-in installer settings
    pub fn installer(mut self, installer: InstallerConfig) -> Self {
        self.installer = installer;
        self
    }

    pub fn build(self) -> Result<Registry<R>> {
        Registry::build_with(self.receiver, self.operations, self.installer)
    }
}
