//! Core multi-call machinery
//!
//! Name decoding, the alias registry, alias resolution, dispatch and the
//! symlink installer.

pub mod dispatcher;
pub mod installer;
pub mod naming;
pub mod registry;
pub mod resolver;

pub use dispatcher::{Dispatcher, Outcome, split_invocation};
pub use installer::{InstallArgs, InstallReport, SymlinkInstaller};
pub use naming::{NameCodec, OpName};
pub use registry::{Action, ActionFn, Operation, Registry, RegistryBuilder};
pub use resolver::{Resolution, resolve};
