//! Remote repositories, their trees and blob materialization.
//!
//! A [`Repository`] caches its tree listing and derived blob set the first
//! time they are requested. Neither cache is ever invalidated for the life
//! of the object; a failed fetch leaves the cache empty so the next call
//! retries.

mod blob;
mod download;
mod scheduler;
mod tree;

pub use blob::{Blob, is_image_path};
pub use download::{DownloadOptions, DownloadOutcome};
pub use scheduler::{Strategy, resolve_strategy};
pub use tree::{EntryKind, TreeEntry};

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::endpoints::tree_url;
use crate::error::{Error, Result};
use crate::transport::Transport;
use tree::TreeResponse;

/// Ref used when no ref or commit is given.
pub const DEFAULT_REF: &str = "main";

/// Counts from a completed `download_blobs` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub written: usize,
    pub skipped: usize,
}

/// One remote repository.
///
/// Identity is `(owner, name)`; the URL and caches do not take part in
/// equality or hashing.
pub struct Repository {
    owner: String,
    name: String,
    url: String,
    transport: Arc<dyn Transport>,
    tree: OnceLock<Vec<TreeEntry>>,
    blobs: OnceLock<Vec<Blob>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("tree", &self.tree.get().map(Vec::len))
            .field("blobs", &self.blobs.get().map(Vec::len))
            .finish()
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for Repository {}

impl Hash for Repository {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

impl Repository {
    /// Create a repository handle with empty caches.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            url: url.into(),
            transport,
            tree: OnceLock::new(),
            blobs: OnceLock::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cached tree, if it has been fetched.
    pub fn cached_tree(&self) -> Option<&[TreeEntry]> {
        self.tree.get().map(Vec::as_slice)
    }

    /// Cached blob set, if it has been derived.
    pub fn cached_blobs(&self) -> Option<&[Blob]> {
        self.blobs.get().map(Vec::as_slice)
    }

    /// Return the tree listing, fetching it on first use.
    ///
    /// Once cached, the listing is returned regardless of `ref_or_sha` and
    /// `recursive`. With `recursive` the host flattens every level into one
    /// response.
    ///
    /// # Errors
    ///
    /// Transport errors propagate unchanged and leave the cache empty.
    pub fn get_tree(&self, ref_or_sha: &str, recursive: bool) -> Result<&[TreeEntry]> {
        if let Some(tree) = self.tree.get() {
            tracing::info!("Already downloaded tree for {}. Using cache", self.name);
            return Ok(tree.as_slice());
        }

        tracing::info!(
            "Tree cache not available for {}. Downloading from {}",
            self.name,
            self.url
        );

        let url = tree_url(&self.url, ref_or_sha, recursive)?;
        let data = self.transport.get_json(url.as_str())?;
        let response: TreeResponse =
            serde_json::from_value(data).map_err(|e| Error::UnexpectedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if response.truncated {
            tracing::warn!(
                "Tree for {} at {} was truncated by the host; some entries are missing",
                self.name,
                ref_or_sha
            );
        }

        Ok(self.tree.get_or_init(|| response.tree).as_slice())
    }

    /// Return the blob entries of the recursive tree, in tree order.
    ///
    /// Subtree and submodule entries are dropped.
    pub fn get_blobs(&self) -> Result<&[Blob]> {
        if let Some(blobs) = self.blobs.get() {
            tracing::info!("Already downloaded blobs for {}. Using cache", self.name);
            return Ok(blobs.as_slice());
        }

        let tree = self.get_tree(DEFAULT_REF, true)?;
        let blobs = tree
            .iter()
            .filter(|entry| entry.is_blob())
            .map(|entry| Blob::from_entry(entry, &self.url))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.blobs.get_or_init(|| blobs).as_slice())
    }

    /// Write every blob under `options.root`.
    ///
    /// Uses the parallel strategy when `use_threads` is set or `max_threads`
    /// is given, otherwise downloads one blob at a time in tree order.
    ///
    /// # Errors
    ///
    /// Sequentially, the first failing blob aborts the run and its error is
    /// returned. In parallel, every blob is attempted and failures are
    /// returned together as [`Error::BatchFailed`].
    pub fn download_blobs(
        &self,
        options: &DownloadOptions,
        use_threads: bool,
        max_threads: Option<usize>,
    ) -> Result<DownloadReport> {
        let strategy = resolve_strategy(use_threads, max_threads)?;
        let blobs = self.get_blobs()?;
        let transport = self.transport.as_ref();

        let outcomes = strategy.execute(
            blobs,
            |blob| blob.path.clone(),
            |blob| blob.download(transport, options),
        )?;

        let written = outcomes.iter().filter(|o| o.is_written()).count();
        let report = DownloadReport {
            written,
            skipped: outcomes.len() - written,
        };
        tracing::info!(
            "Download Complete! {} written, {} skipped",
            report.written,
            report.skipped
        );
        Ok(report)
    }
}
