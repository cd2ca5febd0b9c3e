//! Blocking HTTP transport built on reqwest.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use super::{Transport, TransportError};
use crate::config::Settings;

/// REST API version pinned in every request.
pub const API_VERSION: &str = "2022-11-28";

/// Response header carrying the remaining request quota.
pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-remaining";

/// Transport backed by a `reqwest::blocking::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from resolved settings.
    ///
    /// Attaches `Authorization: Bearer <token>` when a token is configured;
    /// without one requests are sent unauthenticated.
    pub fn from_settings(settings: &Settings) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(API_VERSION),
        );

        if let Some(token) = settings.token.as_deref() {
            tracing::info!("Using bearer credential for API requests");
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::InvalidCredential)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                source: e.without_url(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let rate_limit_remaining = response
            .headers()
            .get(RATE_LIMIT_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("No Rate Limit found")
            .to_string();
        tracing::info!(rate_limit_remaining = %rate_limit_remaining, "GET {}", url);

        response
            .json::<serde_json::Value>()
            .map_err(|e| TransportError::Body {
                url: url.to_string(),
                source: e,
            })
    }
}
