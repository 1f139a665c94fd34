//! Symlink installer
//!
//! Maintains a `<prefix>.<alias>` symlink next to the running binary for
//! every operation with a display name, so the binary can be invoked under
//! each of those names.

use crate::{
    config::InstallerConfig,
    error::{MulticallError, Result},
    utils::fs::FileSystemUtils,
};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// The working directory is process-wide; installs are serialized on it.
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Arguments accepted by the installer command
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(about = "Create or clean <prefix>.<alias> symlinks next to this binary")]
pub struct InstallArgs {
    /// Only remove existing symlinks
    #[arg(short = 'c', long = "clean-only")]
    pub clean_only: bool,

    /// Follow symlinks to locate the real binary
    #[arg(
        short = 'l',
        long = "resolve-symlink",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub resolve_symlink: bool,

    /// Name prefix of the symlinks
    pub prefix: String,
}

/// What an install or clean run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Directory holding the binary and its symlinks
    pub bin_dir: PathBuf,
    /// File name every symlink points at
    pub bin_name: String,
    /// Stale symlinks that were removed
    pub removed: Vec<String>,
    /// Symlinks that were created
    pub created: Vec<String>,
}

/// Creates and cleans the symlink set for one prefix
#[derive(Debug)]
pub struct SymlinkInstaller {
    prefix: String,
    clean_only: bool,
    resolve_symlink: bool,
    max_link_hops: usize,
    fs_utils: FileSystemUtils,
}

impl SymlinkInstaller {
    /// Create an installer for `prefix` with default settings
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            clean_only: false,
            resolve_symlink: true,
            max_link_hops: InstallerConfig::default().max_link_hops,
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// Create an installer from parsed command arguments
    pub fn from_args(args: &InstallArgs, config: &InstallerConfig) -> Self {
        Self::new(args.prefix.clone())
            .clean_only(args.clean_only)
            .resolve_symlink(args.resolve_symlink)
            .max_link_hops(config.max_link_hops)
    }

    pub fn clean_only(mut self, clean_only: bool) -> Self {
        self.clean_only = clean_only;
        self
    }

    pub fn resolve_symlink(mut self, resolve_symlink: bool) -> Self {
        self.resolve_symlink = resolve_symlink;
        self
    }

    pub fn max_link_hops(mut self, max_link_hops: usize) -> Self {
        self.max_link_hops = max_link_hops;
        self
    }

    /// Absolute path of the binary invoked as `program`
    pub fn locate_binary(&self, program: &str) -> Result<PathBuf> {
        let found = match self.fs_utils.lookup_path(program) {
            Some(found) => found,
            None => {
                // argv[0] is caller-controlled and may name nothing on PATH
                debug!("{:?} not found on PATH, using the current executable", program);
                std::env::current_exe().map_err(|e| {
                    MulticallError::file_system("current_exe", Path::new(program), e)
                })?
            }
        };
        let absolute = std::path::absolute(&found)
            .map_err(|e| MulticallError::file_system("absolute", &found, e))?;

        if self.resolve_symlink {
            self.fs_utils.read_last_link(absolute, self.max_link_hops)
        } else {
            Ok(absolute)
        }
    }

    /// Remove stale links, then create one link per named operation
    ///
    /// `operations` yields `(alias, display_name)` pairs; entries with an
    /// empty display name get no link. In clean-only mode nothing is created.
    #[instrument(skip(self, operations), fields(prefix = %self.prefix))]
    pub fn install<'a, I>(&self, program: &str, operations: I) -> Result<InstallReport>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        if self.prefix.is_empty() {
            return Err(MulticallError::validation("symlink prefix must not be empty"));
        }

        let binary = self.locate_binary(program)?;
        let (bin_dir, bin_name) = split_binary(&binary)?;
        debug!("Binary resolved to: {}", binary.display());

        let _lock = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let _cwd = CwdGuard::enter(self.fs_utils, &bin_dir)?;

        let mut report = InstallReport {
            removed: self.clean()?,
            bin_dir,
            bin_name,
            created: Vec::new(),
        };
        if self.clean_only {
            return Ok(report);
        }

        for (alias, display_name) in operations {
            if display_name.is_empty() {
                continue;
            }
            let name = format!("{}.{}", self.prefix, alias);
            info!(name = %name, op = %display_name, "create");
            self.fs_utils.symlink(&report.bin_name, &name)?;
            report.created.push(name);
        }

        Ok(report)
    }

    /// Remove every `<prefix>.*` symlink in the current directory
    fn clean(&self) -> Result<Vec<String>> {
        let pattern = format!("{}.*", glob::Pattern::escape(&self.prefix));
        let entries = glob::glob(&pattern).map_err(|e| {
            MulticallError::validation(format!("invalid prefix {:?}: {e}", self.prefix))
        })?;

        let mut removed = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let source = std::io::Error::new(e.error().kind(), e.to_string());
                MulticallError::file_system("glob", e.path(), source)
            })?;

            if !self.fs_utils.is_symlink(&path) {
                debug!("Keeping non-symlink: {}", path.display());
                continue;
            }
            if self.fs_utils.remove_file_if_exists(&path)? {
                removed.push(path.to_string_lossy().into_owned());
            }
        }

        removed.sort();
        Ok(removed)
    }
}

fn split_binary(binary: &Path) -> Result<(PathBuf, String)> {
    match (binary.parent(), binary.file_name()) {
        (Some(dir), Some(name)) => Ok((dir.to_path_buf(), name.to_string_lossy().into_owned())),
        _ => Err(MulticallError::validation(format!(
            "cannot split binary path {}",
            binary.display()
        ))),
    }
}

/// Restores the previous working directory when dropped
struct CwdGuard {
    previous: PathBuf,
    fs_utils: FileSystemUtils,
}

impl CwdGuard {
    fn enter(fs_utils: FileSystemUtils, dir: &Path) -> Result<Self> {
        let previous = fs_utils.current_dir()?;
        fs_utils.set_current_dir(dir)?;
        Ok(Self { previous, fs_utils })
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(e) = self.fs_utils.set_current_dir(&self.previous) {
            warn!("Failed to restore working directory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    /// Read the working directory while no install can be changing it
    fn locked_current_dir() -> PathBuf {
        let _lock = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::current_dir().unwrap()
    }

    const OPS: &[(&str, &str)] = &[
        ("cm", "Commit"),
        ("help", "Help"),
        ("log", ""),
        ("status", "Status"),
    ];

    fn fake_binary(temp_dir: &TempDir) -> String {
        let bin = temp_dir.path().join("tool");
        fs::write(&bin, "#!/bin/sh\n").unwrap();
        bin.to_string_lossy().into_owned()
    }

    /// Symlinks in `dir` with their targets
    fn link_set(dir: &Path) -> BTreeMap<String, PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.is_symlink())
            .map(|path| {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, fs::read_link(&path).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_parse_install_args() {
        let args = InstallArgs::try_parse_from(["tool", "git"]).unwrap();
        assert_eq!(args.prefix, "git");
        assert!(!args.clean_only);
        assert!(args.resolve_symlink);

        let args = InstallArgs::try_parse_from(["tool", "-c", "-l", "false", "git"]).unwrap();
        assert!(args.clean_only);
        assert!(!args.resolve_symlink);

        assert!(InstallArgs::try_parse_from(["tool"]).is_err());
    }

    #[test]
    fn test_install_creates_named_links() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);

        let report = SymlinkInstaller::new("git")
            .install(&program, OPS.iter().copied())
            .unwrap();

        assert_eq!(report.bin_name, "tool");
        assert_eq!(report.created, ["git.cm", "git.help", "git.status"]);
        assert!(report.removed.is_empty());

        let links = link_set(temp_dir.path());
        assert_eq!(links.len(), 3);
        assert!(links.values().all(|target| target == Path::new("tool")));
        assert!(!links.contains_key("git.log"));
    }

    #[test]
    fn test_install_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);
        let installer = SymlinkInstaller::new("git");

        installer.install(&program, OPS.iter().copied()).unwrap();
        let first = link_set(temp_dir.path());

        let report = installer.install(&program, OPS.iter().copied()).unwrap();
        let second = link_set(temp_dir.path());

        assert_eq!(first, second);
        assert_eq!(report.removed, ["git.cm", "git.help", "git.status"]);
    }

    #[test]
    fn test_clean_removes_only_prefixed_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);

        symlink("tool", temp_dir.path().join("git.stale")).unwrap();
        symlink("tool", temp_dir.path().join("other.cm")).unwrap();
        fs::write(temp_dir.path().join("git.keep"), "not a link").unwrap();

        let report = SymlinkInstaller::new("git")
            .clean_only(true)
            .install(&program, OPS.iter().copied())
            .unwrap();

        assert_eq!(report.removed, ["git.stale"]);
        assert!(report.created.is_empty());
        assert!(temp_dir.path().join("git.keep").exists());
        assert!(temp_dir.path().join("other.cm").is_symlink());
        assert!(!temp_dir.path().join("git.stale").is_symlink());
    }

    #[test]
    fn test_collision_with_regular_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);
        fs::write(temp_dir.path().join("git.status"), "regular").unwrap();

        let result = SymlinkInstaller::new("git").install(&program, OPS.iter().copied());
        assert!(matches!(result, Err(MulticallError::FileSystem { .. })));
    }

    #[test]
    fn test_working_directory_restored() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);
        fs::write(temp_dir.path().join("git.status"), "regular").unwrap();

        let before = locked_current_dir();
        let installer = SymlinkInstaller::new("git");
        installer.install(&program, OPS.iter().copied()).unwrap_err();
        assert_eq!(locked_current_dir(), before);

        fs::remove_file(temp_dir.path().join("git.status")).unwrap();
        installer.install(&program, OPS.iter().copied()).unwrap();
        assert_eq!(locked_current_dir(), before);
    }

    #[test]
    fn test_locate_binary_falls_back_to_current_exe() {
        let installer = SymlinkInstaller::new("git").resolve_symlink(false);
        let located = installer
            .locate_binary("multicall-missing-from-path-0f3a")
            .unwrap();
        assert_eq!(located, std::env::current_exe().unwrap());
    }

    #[test]
    fn test_links_go_next_to_resolved_binary() {
        let temp_dir = TempDir::new().unwrap();
        let real_dir = temp_dir.path().join("real");
        let link_dir = temp_dir.path().join("links");
        fs::create_dir(&real_dir).unwrap();
        fs::create_dir(&link_dir).unwrap();
        fs::write(real_dir.join("tool-bin"), "").unwrap();
        symlink(real_dir.join("tool-bin"), link_dir.join("tool")).unwrap();

        let program = link_dir.join("tool").to_string_lossy().into_owned();

        let report = SymlinkInstaller::new("git")
            .install(&program, OPS.iter().copied())
            .unwrap();
        assert_eq!(report.bin_name, "tool-bin");
        assert_eq!(link_set(&real_dir).len(), 3);

        let report = SymlinkInstaller::new("git")
            .resolve_symlink(false)
            .install(&program, OPS.iter().copied())
            .unwrap();
        assert_eq!(report.bin_name, "tool");
        // "tool" itself plus the three new links
        assert_eq!(link_set(&link_dir).len(), 4);
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let program = fake_binary(&temp_dir);

        let result = SymlinkInstaller::new("").install(&program, OPS.iter().copied());
        assert!(matches!(result, Err(MulticallError::Validation { .. })));
    }
}
