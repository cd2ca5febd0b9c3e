//! Optional `ghtree.toml` configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name looked up in the user config directory.
pub const CONFIG_FILE_NAME: &str = "ghtree.toml";

/// Keys accepted in `ghtree.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// `<config_dir>/ghtree/ghtree.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ghtree").join(CONFIG_FILE_NAME))
}

impl ConfigFile {
    /// Read and parse `path`. Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read config file {}", path.display()), e))?;
        Self::parse(&content, path).map(Some)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_file() {
        let file = ConfigFile::parse("timeout_secs = 10\n", Path::new("ghtree.toml")).unwrap();
        assert_eq!(file.timeout_secs, Some(10));
        assert!(file.token.is_none());
        assert!(file.api_url.is_none());
    }

    #[test]
    fn parse_rejects_unknown_key() {
        let result = ConfigFile::parse("colour = \"blue\"\n", Path::new("ghtree.toml"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn parse_rejects_wrong_type() {
        let result = ConfigFile::parse("timeout_secs = \"ten\"\n", Path::new("ghtree.toml"));
        assert!(result.is_err());
    }
}
