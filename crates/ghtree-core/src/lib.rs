//! ghtree core library
//!
//! Fetches a remote repository's file tree through the hosted REST API and
//! materializes its blobs as local files, caching tree listings and blob
//! content per object.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod repository;
pub mod transport;

pub use error::{BlobFailure, Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    pub use crate::client::GitHubClient;
    pub use crate::config::{Settings, SettingsSources};
    pub use crate::error::{Error, Result};
    pub use crate::repository::{
        Blob, DEFAULT_REF, DownloadOptions, DownloadOutcome, DownloadReport, Repository,
        Strategy, TreeEntry, resolve_strategy,
    };
    pub use crate::transport::{HttpTransport, Transport, TransportError};
}
