//! Tree listing records as rendered by the host API.

use serde::{Deserialize, Serialize};

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    Blob,
    /// Subdirectory
    Tree,
    /// Submodule pointer
    Commit,
    /// Anything the host adds later
    #[serde(other)]
    Other,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
            EntryKind::Commit => "commit",
            EntryKind::Other => "other",
        }
    }
}

/// One entry of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: String,
    pub path: String,
    pub sha: String,
    /// Only reported for blobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Absent for submodule entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

/// Body of the tree-listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<TreeEntry>,
    /// Set by the host when the listing exceeded its size limit
    #[serde(default)]
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_listing_with_all_kinds() {
        let body = json!({
            "sha": "root",
            "url": "https://api.example.test/tree/root",
            "tree": [
                {"path": "a.txt", "mode": "100644", "type": "blob", "sha": "1", "size": 3, "url": "u1"},
                {"path": "sub", "mode": "040000", "type": "tree", "sha": "2", "url": "u2"},
                {"path": "vendor/lib", "mode": "160000", "type": "commit", "sha": "3"}
            ],
            "truncated": false
        });

        let response: TreeResponse = serde_json::from_value(body).unwrap();
        assert!(!response.truncated);
        assert_eq!(response.tree.len(), 3);
        assert_eq!(response.tree[0].kind, EntryKind::Blob);
        assert_eq!(response.tree[0].size, Some(3));
        assert_eq!(response.tree[1].kind, EntryKind::Tree);
        assert_eq!(response.tree[1].size, None);
        assert_eq!(response.tree[2].kind, EntryKind::Commit);
        assert_eq!(response.tree[2].url, None);
    }

    #[test]
    fn unknown_kind_is_other() {
        let entry: TreeEntry = serde_json::from_value(json!({
            "path": "x", "mode": "100644", "type": "symlink-ish", "sha": "9"
        }))
        .unwrap();
        assert_eq!(entry.kind, EntryKind::Other);
        assert!(!entry.is_blob());
    }

    #[test]
    fn missing_tree_field_fails() {
        let result: Result<TreeResponse, _> = serde_json::from_value(json!({"sha": "x"}));
        assert!(result.is_err());
    }
}
