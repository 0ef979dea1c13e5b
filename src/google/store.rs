//! Token persistence in the user config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::config::config_dir_file;
use crate::google::GoogleToken;

fn token_path() -> Result<PathBuf> {
    config_dir_file("token.json").ok_or_else(|| anyhow!("No config directory available"))
}

fn read_token(path: &Path) -> Result<GoogleToken> {
    if !path.exists() {
        return Err(anyhow!(
            "Not signed in. Run /auth to connect your Google account."
        ));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("read token {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse token {}", path.display()))
}

fn write_token(path: &Path, token: &GoogleToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(token).context("serialize token")?;
    fs::write(path, text).with_context(|| format!("write token {}", path.display()))
}

/// Load the stored Google token.
pub fn load_token() -> Result<GoogleToken> {
    read_token(&token_path()?)
}

/// Persist the Google token.
pub fn save_token(token: &GoogleToken) -> Result<()> {
    write_token(&token_path()?, token)
}

/// Delete the stored token. Returns `false` when there was nothing to
/// delete.
pub fn clear_token() -> Result<bool> {
    let path = token_path()?;
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("remove token {}", path.display()))?;
    Ok(true)
}

/// Whether a token file exists, without reading it.
pub fn token_exists() -> bool {
    token_path().map(|path| path.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> GoogleToken {
        GoogleToken {
            token: "ya29.stored".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "cid".to_string(),
            client_secret: None,
            scopes: vec![],
            expiry: Some("2026-02-08T12:00:00+00:00".to_string()),
        }
    }

    #[test]
    fn writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        write_token(&path, &sample_token()).unwrap();
        let loaded = read_token(&path).unwrap();

        assert_eq!(loaded.token, "ya29.stored");
        assert_eq!(loaded.refresh_token.as_deref(), Some("1//refresh"));
    }

    #[test]
    fn missing_token_suggests_auth() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_token(&dir.path().join("token.json")).unwrap_err();
        assert!(err.to_string().contains("/auth"));
    }
}
