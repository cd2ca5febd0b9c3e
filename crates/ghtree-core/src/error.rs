//! Error types for tree retrieval and blob materialization.

use std::path::PathBuf;

use thiserror::Error;

use crate::endpoints::UrlError;
use crate::transport::TransportError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by repository, blob and download operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure or non-success HTTP status
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Blob content was not valid base64 or not valid UTF-8
    #[error("Failed to decode content of {path}: {reason}")]
    Decode {
        /// Blob path within the repository
        path: String,
        /// Decoder message
        reason: String,
    },

    /// JSON returned by the host does not have the expected shape
    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedResponse {
        /// Requested URL
        url: String,
        /// What was missing or malformed
        reason: String,
    },

    /// Download root does not exist and `makedirs` is false
    #[error("{} is not a directory. Specify makedirs to create it", root.display())]
    InvalidTargetDirectory {
        /// Requested download root
        root: PathBuf,
    },

    /// Destination file exists and `overwrite` is false
    #[error("{} exists and would be overwritten. Specify overwrite if this is intended", path.display())]
    RefusedOverwrite {
        /// Existing destination
        path: PathBuf,
    },

    /// Destination exists but is not a regular file
    #[error("{} exists but is not a regular file. Cannot overwrite", path.display())]
    NotAFile {
        /// Existing destination
        path: PathBuf,
    },

    /// Parent directory of the destination is absent and `makedirs` is false
    #[error("Parent directory {} does not exist. Specify makedirs to create it", parent.display())]
    MissingParentDirectory {
        /// Missing parent directory
        parent: PathBuf,
    },

    /// Blob path is absolute or escapes the download root
    #[error("Refusing to write {path}: path escapes the download root")]
    UnsafePath {
        /// Blob path as reported by the host
        path: String,
    },

    /// A worker count of zero was requested
    #[error("max_threads must be greater than zero")]
    InvalidWorkerCount,

    /// Worker pool could not be started
    #[error("Failed to build download worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Filesystem operation failed
    #[error("I/O error during {operation}: {source}")]
    Io {
        /// Description of the failed operation
        operation: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// URL construction failed
    #[error(transparent)]
    Url(#[from] UrlError),

    /// Configuration source could not be read or parsed
    #[error("Invalid configuration in {}: {reason}", path.display())]
    Config {
        /// Configuration source
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// One or more blobs failed during a parallel download
    #[error("{} of the blob downloads failed: {}", failures.len(), summarize(failures))]
    BatchFailed {
        /// Every failing blob with its error
        failures: Vec<BlobFailure>,
    },
}

/// A single failed blob inside a parallel download.
#[derive(Debug)]
pub struct BlobFailure {
    /// Blob path within the repository
    pub path: String,
    /// Why the blob could not be written
    pub error: Error,
}

fn summarize(failures: &[BlobFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub(crate) fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}
