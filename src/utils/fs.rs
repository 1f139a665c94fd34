//! File system probing utilities
//!
//! Existence and metadata checks distinguish "not found" from real I/O
//! failures; only the former is an ordinary answer.

use crate::error::{MulticallError, Result};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Utility struct for file system operations
#[derive(Debug, Clone, Copy)]
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Check whether a path exists, following symlinks
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        Ok(self.file_size(path)?.is_some())
    }

    /// Size of the file at `path`, or `None` if it does not exist
    pub fn file_size<P: AsRef<Path>>(&self, path: P) -> Result<Option<u64>> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MulticallError::file_system("stat", path, e)),
        }
    }

    /// Check whether the path itself is a symbolic link
    pub fn is_symlink<P: AsRef<Path>>(&self, path: P) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    /// Follow a chain of symlinks to its final target
    ///
    /// Relative link targets are taken relative to the link's directory. A
    /// chain longer than `max_hops` links is an error.
    #[instrument(skip(self))]
    pub fn read_last_link<P: AsRef<Path> + std::fmt::Debug>(
        &self,
        path: P,
        max_hops: usize,
    ) -> Result<PathBuf> {
        let origin = path.as_ref();
        let mut current = origin.to_path_buf();

        for _ in 0..max_hops {
            let target = match fs::read_link(&current) {
                Ok(target) => target,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::InvalidInput | io::ErrorKind::NotFound
                    ) =>
                {
                    return Ok(current);
                }
                Err(e) => return Err(MulticallError::file_system("readlink", current, e)),
            };

            current = match current.parent() {
                Some(dir) => dir.join(target),
                None => target,
            };
            debug!("Followed link to: {}", current.display());
        }

        if self.is_symlink(&current) {
            return Err(MulticallError::SymlinkLoop {
                path: origin.to_path_buf(),
                last: current,
                hops: max_hops,
            });
        }
        Ok(current)
    }

    /// Locate an executable the way a shell would for `argv[0]`
    ///
    /// Names containing a `/` are returned unchanged; bare names are searched
    /// for on `PATH`.
    pub fn lookup_path(&self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            return Some(PathBuf::from(name));
        }

        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    /// Remove a file or symlink if it exists
    #[instrument(skip(self))]
    pub fn remove_file_if_exists<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> Result<bool> {
        let path = path.as_ref();

        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed file: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("File does not exist: {}", path.display());
                Ok(false)
            }
            Err(e) => Err(MulticallError::file_system("remove", path, e)),
        }
    }

    /// Create a symbolic link at `link` pointing to `target`
    #[instrument(skip(self))]
    pub fn symlink<P: AsRef<Path> + std::fmt::Debug, Q: AsRef<Path> + std::fmt::Debug>(
        &self,
        target: P,
        link: Q,
    ) -> Result<()> {
        let link = link.as_ref();
        std::os::unix::fs::symlink(target.as_ref(), link)
            .map_err(|e| MulticallError::file_system("symlink", link, e))
    }

    /// Get the current working directory
    pub fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().map_err(|e| MulticallError::file_system("getcwd", ".", e))
    }

    /// Change the current working directory
    #[instrument(skip(self))]
    pub fn set_current_dir<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Changing directory to: {}", path.display());
        std::env::set_current_dir(path).map_err(|e| MulticallError::file_system("chdir", path, e))
    }
}

impl Default for FileSystemUtils {
    fn default() -> Self {
        Self::new()
    }
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
