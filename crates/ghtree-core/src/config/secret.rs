//! Credential lookup from a mounted secret file.

use super::TOKEN_ENV;

/// Default location of the mounted credential.
pub const DEFAULT_SECRET_PATH: &str = "/run/secrets/gh_secret";

/// Extract the credential from a secret file's contents.
///
/// Accepts dotenv-style `GITHUB_PAT=<token>` lines or a file whose only
/// content is the bare token.
pub fn parse_secret(content: &str) -> Option<String> {
    for (key, value) in dotenvy::from_read_iter(content.as_bytes()).flatten() {
        if key == TOKEN_ENV {
            let value = value.trim();
            return (!value.is_empty()).then(|| value.to_string());
        }
    }

    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    match lines.as_slice() {
        [single] if !single.contains('=') && !single.contains(char::is_whitespace) => {
            Some(single.to_string())
        }
        _ => None,
    }
}
