//! Write policy for materializing a blob on the local filesystem.
//!
//! Order of checks for a single blob:
//! 1. image paths are skipped without touching the network or filesystem
//! 2. the blob path must stay inside the root
//! 3. content is resolved (so a failed fetch leaves the filesystem untouched)
//! 4. the root must be a directory, or be created when `makedirs` is set
//! 5. no directory between the root and the destination may be a symlink, and
//!    an existing destination must be a regular file (not a symlink) with
//!    `overwrite` set
//! 6. the parent directory must exist, or be created when `makedirs` is set
//! 7. the content is written, truncating any previous file

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::blob::Blob;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Shared per-call configuration for downloading blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Directory the blob paths are resolved against
    pub root: PathBuf,
    /// Create the root and missing parent directories
    pub makedirs: bool,
    /// Replace existing regular files
    pub overwrite: bool,
}

impl DownloadOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            makedirs: false,
            overwrite: false,
        }
    }

    pub fn with_makedirs(mut self, makedirs: bool) -> Self {
        self.makedirs = makedirs;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// What happened to a single blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Content was written to `path`
    Written { path: PathBuf, bytes: usize },
    /// Blob was an image and was not fetched
    Skipped { path: String },
}

impl DownloadOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, DownloadOutcome::Written { .. })
    }
}

pub(crate) fn materialize(
    blob: &Blob,
    transport: &dyn Transport,
    options: &DownloadOptions,
) -> Result<DownloadOutcome> {
    if blob.is_image() {
        tracing::debug!("Skipping image {}", blob.path);
        return Ok(DownloadOutcome::Skipped {
            path: blob.path.clone(),
        });
    }

    let relative = checked_relative_path(&blob.path)?;

    tracing::info!("Downloading... {}", blob.path);
    let content = blob.get_contents(transport)?;

    let target = prepare_target(&options.root, &relative, options)?;

    tracing::info!("Writing {} bytes to {}", blob.size, target.display());
    fs::write(&target, content)
        .map_err(|e| Error::io(format!("write {}", target.display()), e))?;

    Ok(DownloadOutcome::Written {
        path: target,
        bytes: content.len(),
    })
}

/// Run the root, destination and parent checks and return the target path.
///
/// Directories are only created when `makedirs` is set; creation tolerates
/// directories that already exist so concurrent workers can race on shared
/// ancestors.
fn prepare_target(root: &Path, relative: &Path, options: &DownloadOptions) -> Result<PathBuf> {
    if !root.is_dir() {
        if !options.makedirs {
            return Err(Error::InvalidTargetDirectory {
                root: root.to_path_buf(),
            });
        }
        tracing::info!(
            "{} is not a directory. Creating it because makedirs is set",
            root.display()
        );
        create_dir_all(root)?;
    }

    reject_symlinked_ancestors(root, relative)?;
    let target = root.join(relative);

    match fs::symlink_metadata(&target) {
        Ok(meta) => {
            if !meta.file_type().is_file() {
                return Err(Error::NotAFile { path: target });
            }
            if !options.overwrite {
                return Err(Error::RefusedOverwrite { path: target });
            }
            tracing::warn!("{} exists, overwriting", target.display());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(format!("inspect {}", target.display()), e)),
    }

    if let Some(parent) = target.parent()
        && !parent.exists()
    {
        if !options.makedirs {
            return Err(Error::MissingParentDirectory {
                parent: parent.to_path_buf(),
            });
        }
        tracing::info!(
            "Parent directory {} does not exist. Creating it because makedirs is set",
            parent.display()
        );
        create_dir_all(parent)?;
    }

    Ok(target)
}

/// Fail if any existing directory between `root` and the destination is a
/// symlink, which would let the write land outside the root.
fn reject_symlinked_ancestors(root: &Path, relative: &Path) -> Result<()> {
    let Some(parent) = relative.parent() else {
        return Ok(());
    };

    let mut current = root.to_path_buf();
    for component in parent.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::UnsafePath {
                    path: relative.display().to_string(),
                });
            }
            Ok(meta) if meta.is_dir() => {}
            // a regular file in the way is reported by the parent checks
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(Error::io(format!("inspect {}", current.display()), e)),
        }
    }
    Ok(())
}

fn create_dir_all(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::io(format!("create directory {}", dir.display()), e))
}

/// Validate a host-supplied blob path and return it as a relative path.
///
/// Rejects empty and absolute paths and any path whose `..` components
/// would leave the root.
fn checked_relative_path(path: &str) -> Result<PathBuf> {
    let unsafe_path = || Error::UnsafePath {
        path: path.to_string(),
    };

    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(unsafe_path());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_path()),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(normalized)
}
