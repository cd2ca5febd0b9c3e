//! File entries of a tree and their cached content.

use std::sync::OnceLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::download::{DownloadOptions, DownloadOutcome, materialize};
use super::tree::TreeEntry;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// A single file entry within a repository tree.
///
/// Content is fetched at most once; later reads return the cached text.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mode: String,
    pub path: String,
    pub sha: String,
    /// Byte count reported by the host. Informational only.
    pub size: u64,
    pub url: String,
    content: OnceLock<String>,
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.sha == other.sha
    }
}

impl Eq for Blob {}

impl Blob {
    pub fn new(
        mode: impl Into<String>,
        path: impl Into<String>,
        sha: impl Into<String>,
        size: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            mode: mode.into(),
            path: path.into(),
            sha: sha.into(),
            size,
            url: url.into(),
            content: OnceLock::new(),
        }
    }

    /// Build a blob from a tree entry of kind `blob`.
    pub(crate) fn from_entry(entry: &TreeEntry, tree_url: &str) -> Result<Self> {
        let url = entry
            .url
            .clone()
            .ok_or_else(|| Error::UnexpectedResponse {
                url: tree_url.to_string(),
                reason: format!("blob entry {} has no url", entry.path),
            })?;
        Ok(Self::new(
            entry.mode.clone(),
            entry.path.clone(),
            entry.sha.clone(),
            entry.size.unwrap_or(0),
            url,
        ))
    }

    /// Cached content, if it has been fetched.
    pub fn content(&self) -> Option<&str> {
        self.content.get().map(String::as_str)
    }

    /// Whether the path names a binary image that is never materialized.
    pub fn is_image(&self) -> bool {
        is_image_path(&self.path)
    }

    /// Return the decoded content, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the fetch fails, [`Error::UnexpectedResponse`]
    /// if the body has no `content` string, and [`Error::Decode`] if it is not
    /// base64-encoded UTF-8. The cache stays empty on failure.
    pub fn get_contents(&self, transport: &dyn Transport) -> Result<&str> {
        if let Some(content) = self.content.get() {
            tracing::info!("Already downloaded {}. Using cached content", self.path);
            return Ok(content.as_str());
        }

        tracing::info!(
            "Cache not available for {}. Downloading from {}",
            self.path,
            self.url
        );

        let data = transport.get_json(&self.url)?;
        let encoded = data
            .get("content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::UnexpectedResponse {
                url: self.url.clone(),
                reason: "missing string field `content`".to_string(),
            })?;
        let decoded = decode_content(&self.path, encoded)?;

        Ok(self.content.get_or_init(|| decoded).as_str())
    }

    /// Write this blob under `options.root`.
    ///
    /// Images are skipped silently. Otherwise the content is resolved and the
    /// root, destination and parent checks run before anything is written.
    /// Failures are logged and returned.
    pub fn download(
        &self,
        transport: &dyn Transport,
        options: &DownloadOptions,
    ) -> Result<DownloadOutcome> {
        materialize(self, transport, options).inspect_err(|e| {
            tracing::error!("Failed to download {}: {}", self.path, e);
        })
    }
}

/// `.jpg`, `.jpeg` and `.png`, compared ASCII case-insensitively.
pub fn is_image_path(path: &str) -> bool {
    const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];
    let lower = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decode host base64 (which wraps lines) into UTF-8 text.
fn decode_content(path: &str, encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| Error::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::tree::EntryKind;

    #[test]
    fn image_paths() {
        assert!(is_image_path("logo.png"));
        assert!(is_image_path("docs/photo.JPG"));
        assert!(is_image_path("a/b/c.jpeg"));
        assert!(!is_image_path("image.svg"));
        assert!(!is_image_path("png"));
        assert!(!is_image_path("notes.png.txt"));
    }

    #[test]
    fn decode_wrapped_base64() {
        let text = decode_content("a.txt", "aGVs\nbG8g\nd29y\nbGQ=\n").unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let result = decode_content("a.txt", "***");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn decode_rejects_non_utf8() {
        // 0xff 0xfe
        let result = decode_content("bin.dat", "//4=");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn from_entry_requires_url() {
        let entry = TreeEntry {
            mode: "100644".to_string(),
            path: "a.txt".to_string(),
            sha: "1".to_string(),
            size: Some(3),
            url: None,
            kind: EntryKind::Blob,
        };
        let result = Blob::from_entry(&entry, "https://api.example.test/tree");
        assert!(matches!(result, Err(Error::UnexpectedResponse { .. })));
    }

    #[test]
    fn equality_ignores_content_cache() {
        let a = Blob::new("100644", "a.txt", "1", 3, "u1");
        let b = Blob::new("100755", "a.txt", "1", 99, "u2");
        let _ = a.content.set("cached".to_string());
        assert_eq!(a, b);
        assert_eq!(a.content(), Some("cached"));
        assert_eq!(b.content(), None);
    }
}
