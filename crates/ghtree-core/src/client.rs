//! Owner-scoped repository lookup.

use std::sync::Arc;

use serde::Deserialize;
use url::Url;

use crate::config::Settings;
use crate::endpoints::{REPOS_PER_PAGE, repository_url, user_repos_url};
use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::transport::{HttpTransport, Transport};

/// Entry point toward the hosted API.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    api_url: Url,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryRecord {
    name: String,
    url: String,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn Transport>, api_url: Url) -> Self {
        Self { transport, api_url }
    }

    /// Build a client over [`HttpTransport`] from resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::new(Arc::new(transport), settings.api_url.clone()))
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// List every repository owned by `owner`, following pagination.
    pub fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();

        for page in 1.. {
            let url = user_repos_url(&self.api_url, owner, page)?;
            let data = self.transport.get_json(url.as_str())?;
            let records: Vec<RepositoryRecord> =
                serde_json::from_value(data).map_err(|e| Error::UnexpectedResponse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            let count = records.len();
            repositories.extend(records.into_iter().map(|record| {
                Repository::new(owner, record.name, record.url, Arc::clone(&self.transport))
            }));

            if count < REPOS_PER_PAGE {
                break;
            }
        }

        tracing::info!("Found {} repositories for {}", repositories.len(), owner);
        Ok(repositories)
    }

    /// Handle for a repository whose name is already known. No request is made.
    pub fn repository(&self, owner: &str, name: &str) -> Result<Repository> {
        let url = repository_url(&self.api_url, owner, name)?;
        Ok(Repository::new(
            owner,
            name,
            url.to_string(),
            Arc::clone(&self.transport),
        ))
    }
}
