//! URL construction helpers for the hosted REST API.

use thiserror::Error;
use url::Url;

/// Default REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size requested when listing an owner's repositories.
pub const REPOS_PER_PAGE: usize = 100;

/// Builds the default API base URL.
pub fn api_base_url() -> Result<Url, UrlError> {
    Ok(Url::parse(DEFAULT_API_URL)?)
}

/// Appends path segments to `base`, like a posix path join.
///
/// Each segment is percent-encoded on its own, so a ref such as
/// `feature/x` stays a single segment.
///
/// # Errors
///
/// Returns error if `base` does not parse or cannot be a base URL
pub fn join_segments(base: &str, segments: &[&str]) -> Result<Url, UrlError> {
    let mut url = Url::parse(base)?;
    let url_for_error = url.clone();
    url.path_segments_mut()
        .map_err(|_| UrlError::CannotBeABase { url: url_for_error })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `/users/{owner}/repos` for the given page (1-based).
pub fn user_repos_url(base: &Url, owner: &str, page: usize) -> Result<Url, UrlError> {
    let mut url = join_segments(base.as_str(), &["users", owner, "repos"])?;
    url.query_pairs_mut()
        .append_pair("per_page", &REPOS_PER_PAGE.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// `/repos/{owner}/{name}`.
pub fn repository_url(base: &Url, owner: &str, name: &str) -> Result<Url, UrlError> {
    join_segments(base.as_str(), &["repos", owner, name])
}

/// `{repo_url}/git/trees/{ref_or_sha}`, optionally with `recursive=true`.
pub fn tree_url(repo_url: &str, ref_or_sha: &str, recursive: bool) -> Result<Url, UrlError> {
    let mut url = join_segments(repo_url, &["git", "trees", ref_or_sha])?;
    if recursive {
        url.query_pairs_mut().append_pair("recursive", "true");
    }
    Ok(url)
}

/// URL construction errors
#[derive(Debug, Error)]
pub enum UrlError {
    /// URL cannot be used as a base
    #[error("URL cannot be a base: {url}")]
    CannotBeABase {
        /// The problematic URL
        url: Url,
    },

    /// Invalid URL parse error
    #[error("Invalid URL: {0}")]
    ParseError(#[from] url::ParseError),
}
