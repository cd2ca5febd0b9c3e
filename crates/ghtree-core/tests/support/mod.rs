#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use ghtree_core::transport::{Transport, TransportError};

/// In-memory transport that serves canned JSON and counts requests per URL.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashMap<String, u16>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: Value) -> &Self {
        self.responses.lock().unwrap().insert(url.to_string(), body);
        self
    }

    /// Serve `text` as a blob content record.
    pub fn respond_blob(&self, url: &str, text: &str) -> &Self {
        self.respond(url, json!({ "content": encode_wrapped(text) }))
    }

    /// Answer `url` with the given non-success status.
    pub fn fail(&self, url: &str, status: u16) -> &Self {
        self.failures.lock().unwrap().insert(url.to_string(), status);
        self
    }

    /// Remove a configured failure so the next request succeeds.
    pub fn recover(&self, url: &str) -> &Self {
        self.failures.lock().unwrap().remove(url);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Transport for FakeTransport {
    fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        if let Some(status) = self.failures.lock().unwrap().get(url) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Base64 with a line break every 60 characters, like the host returns.
pub fn encode_wrapped(text: &str) -> String {
    let encoded = STANDARD.encode(text);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

pub const REPO_URL: &str = "https://api.example.test/repos/octo/demo";

pub fn tree_url(reference: &str) -> String {
    format!("{REPO_URL}/git/trees/{reference}?recursive=true")
}

pub fn blob_url(sha: &str) -> String {
    format!("{REPO_URL}/git/blobs/{sha}")
}

pub fn blob_entry(path: &str, sha: &str, size: u64) -> Value {
    json!({
        "path": path,
        "mode": "100644",
        "type": "blob",
        "sha": sha,
        "size": size,
        "url": blob_url(sha),
    })
}

pub fn tree_entry(path: &str, sha: &str) -> Value {
    json!({
        "path": path,
        "mode": "040000",
        "type": "tree",
        "sha": sha,
        "url": format!("{REPO_URL}/git/trees/{sha}"),
    })
}

pub fn tree_body(entries: Vec<Value>) -> Value {
    json!({ "sha": "root", "url": REPO_URL, "tree": entries, "truncated": false })
}
