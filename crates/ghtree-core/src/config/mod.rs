//! Runtime settings for API access.
//!
//! Settings are layered, lowest precedence first:
//! built-in defaults, `ghtree.toml`, the secret file, then the environment.

mod file;
mod secret;

pub use file::{CONFIG_FILE_NAME, ConfigFile, default_config_path};
pub use secret::{DEFAULT_SECRET_PATH, parse_secret};

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::endpoints::api_base_url;
use crate::error::{Error, Result};

/// Environment variable holding the bearer credential.
pub const TOKEN_ENV: &str = "GITHUB_PAT";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent for requests
pub const USER_AGENT: &str = "ghtree";

/// Resolved settings used to build a transport and client.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Where settings are read from.
#[derive(Debug, Clone)]
pub struct SettingsSources {
    /// TOML config file (None = skip)
    pub config_path: Option<PathBuf>,
    /// Secret file holding the credential (None = skip)
    pub secret_path: Option<PathBuf>,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            secret_path: Some(PathBuf::from(DEFAULT_SECRET_PATH)),
        }
    }
}

impl SettingsSources {
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_secret_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secret_path = Some(path.into());
        self
    }
}

impl Settings {
    /// Built-in defaults, before any source is applied.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            api_url: api_base_url()?,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        })
    }

    /// Load settings from the default sources and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&SettingsSources::default(), |key| std::env::var(key).ok())
    }

    /// Load settings from explicit sources and an environment lookup.
    pub fn load_from<F>(sources: &SettingsSources, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::defaults()?;

        if let Some(path) = sources.config_path.as_deref()
            && let Some(file) = ConfigFile::load(path)?
        {
            settings.apply_file(file, path)?;
        }

        if let Some(path) = sources.secret_path.as_deref()
            && let Some(token) = read_secret_file(path)?
        {
            tracing::info!("Found credential in {}", path.display());
            settings.token = Some(token);
        }

        if let Some(token) = env(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            tracing::info!("Found ${}", TOKEN_ENV);
            settings.token = Some(token.trim().to_string());
        }

        if let Some(api_url) = env(API_URL_ENV) {
            settings.api_url = Url::parse(&api_url).map_err(|e| Error::Config {
                path: PathBuf::from(format!("${API_URL_ENV}")),
                reason: e.to_string(),
            })?;
        }

        Ok(settings)
    }

    fn apply_file(&mut self, file: ConfigFile, path: &Path) -> Result<()> {
        if let Some(api_url) = file.api_url {
            self.api_url = Url::parse(&api_url).map_err(|e| Error::Config {
                path: path.to_path_buf(),
                reason: format!("api_url: {e}"),
            })?;
        }
        if let Some(token) = file.token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(user_agent) = file.user_agent {
            self.user_agent = user_agent;
        }
        Ok(())
    }
}

fn read_secret_file(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("read secret file {}", path.display()), e))?;
    Ok(parse_secret(&content))
}
