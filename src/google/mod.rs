//! Google account plumbing: token types, expiry, refresh, and the consent
//! flow that produces them.
//!
//! | Module   | Responsibility                                   |
//! |----------|--------------------------------------------------|
//! | `oauth`  | Browser consent flow with PKCE and local callback |
//! | `store`  | Token persistence in the user config directory    |

pub mod oauth;
pub mod store;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::config_dir_file;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth token for the Google APIs. Field names match the `token.json`
/// layout google-auth clients write, so a token saved by one can be read by
/// the other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 timestamp, absent for tokens that never expire.
    #[serde(default)]
    pub expiry: Option<String>,
}

/// `credentials.json` as downloaded from the Google Cloud console for an
/// installed app.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientCredentials {
    pub installed: InstalledApp,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InstalledApp {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Whether the token needs a refresh before use. Treats a missing or
/// unparsable expiry as expired, with a 60 second skew so a token does not
/// die mid-request.
pub fn is_token_expired(token: &GoogleToken) -> bool {
    let Some(expiry) = &token.expiry else {
        return true;
    };
    let parsed = DateTime::parse_from_rfc3339(expiry)
        .or_else(|_| DateTime::parse_from_rfc3339(&expiry.replace('Z', "+00:00")));
    match parsed {
        Ok(expiry) => expiry <= Utc::now() + Duration::seconds(60),
        Err(_) => true,
    }
}

/// Exchange the refresh token for a fresh access token.
pub async fn refresh_token(http: &Client, token: &GoogleToken) -> Result<GoogleToken> {
    let refresh = token
        .refresh_token
        .as_deref()
        .ok_or_else(|| anyhow!("Token has no refresh token. Run /auth to sign in again."))?;

    let mut params = vec![
        ("client_id", token.client_id.clone()),
        ("refresh_token", refresh.to_string()),
        ("grant_type", "refresh_token".to_string()),
    ];
    if let Some(secret) = &token.client_secret {
        params.push(("client_secret", secret.clone()));
    }

    let response = http
        .post(&token.token_uri)
        .form(&params)
        .send()
        .await
        .context("refresh Google token")?;

    let status = response.status();
    let text = response.text().await.context("read refresh response")?;
    if !status.is_success() {
        if text.contains("invalid_grant") {
            return Err(anyhow!(
                "Refresh token revoked or expired. Run /auth to sign in again."
            ));
        }
        return Err(anyhow!("Token refresh failed: HTTP {status}: {text}"));
    }

    let parsed: RefreshResponse =
        serde_json::from_str(&text).context("parse refresh response")?;
    let expires_in = parsed.expires_in.unwrap_or(3600);
    let expiry = (Utc::now() + Duration::seconds(expires_in)).to_rfc3339();

    Ok(GoogleToken {
        token: parsed.access_token,
        expiry: Some(expiry),
        ..token.clone()
    })
}

/// Load the stored token, refreshing and re-saving it if it has expired,
/// and return a usable access token.
pub async fn access_token(http: &Client) -> Result<String> {
    let token = store::load_token()?;
    if !is_token_expired(&token) {
        return Ok(token.token);
    }
    let refreshed = refresh_token(http, &token).await?;
    store::save_token(&refreshed)?;
    Ok(refreshed.token)
}

/// Load the installed-app credentials from the config directory or the
/// working directory.
pub fn load_credentials() -> Result<ClientCredentials> {
    let mut candidates = Vec::new();
    if let Some(path) = config_dir_file("credentials.json") {
        candidates.push(path);
    }
    candidates.push(std::path::PathBuf::from("credentials.json"));

    for path in &candidates {
        if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parse {}", path.display()));
        }
    }

    Err(anyhow!(
        "No credentials.json found. Download OAuth client credentials (Desktop app) \
         from the Google Cloud console and place the file in the config directory \
         or the working directory."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token(expiry: Option<String>) -> GoogleToken {
        GoogleToken {
            token: "ya29.sample".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            token_uri: default_token_uri(),
            client_id: "client-id.apps.googleusercontent.com".to_string(),
            client_secret: Some("secret".to_string()),
            scopes: vec![crate::constants::SHEETS_SCOPE.to_string()],
            expiry,
        }
    }

    #[test]
    fn token_roundtrips_through_json() {
        let token = sample_token(Some("2026-02-08T12:00:00+00:00".to_string()));
        let json = serde_json::to_string(&token).unwrap();
        let back: GoogleToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token, "ya29.sample");
        assert_eq!(back.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(back.expiry.as_deref(), Some("2026-02-08T12:00:00+00:00"));
    }

    #[test]
    fn reads_google_auth_token_layout() {
        let json = r#"{
            "token": "ya29.other",
            "refresh_token": "1//r",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "cid",
            "client_secret": "cs",
            "scopes": ["https://www.googleapis.com/auth/spreadsheets"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2026-02-08T12:00:00.000000Z"
        }"#;
        let token: GoogleToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.other");
        assert_eq!(token.scopes.len(), 1);
        assert!(token.expiry.is_some());
    }

    #[test]
    fn access_token_field_name_is_accepted() {
        let json = r#"{"access_token": "ya29.alias", "client_id": "cid"}"#;
        let token: GoogleToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.alias");
        assert_eq!(token.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn missing_expiry_counts_as_expired() {
        assert!(is_token_expired(&sample_token(None)));
    }

    #[test]
    fn future_expiry_is_not_expired() {
        let expiry = (Utc::now() + Duration::hours(1)).to_rfc3339();
        assert!(!is_token_expired(&sample_token(Some(expiry))));
    }

    #[test]
    fn past_expiry_is_expired() {
        let expiry = (Utc::now() - Duration::hours(1)).to_rfc3339();
        assert!(is_token_expired(&sample_token(Some(expiry))));
    }

    #[test]
    fn expiry_inside_the_skew_window_is_expired() {
        let expiry = (Utc::now() + Duration::seconds(30)).to_rfc3339();
        assert!(is_token_expired(&sample_token(Some(expiry))));
    }

    #[test]
    fn z_suffixed_expiry_parses() {
        let token = sample_token(Some("2099-01-01T00:00:00.000000Z".to_string()));
        assert!(!is_token_expired(&token));
    }

    #[test]
    fn garbage_expiry_counts_as_expired() {
        assert!(is_token_expired(&sample_token(Some("soon".to_string()))));
    }

    #[test]
    fn credentials_parse_with_and_without_secret() {
        let with_secret = r#"{"installed": {
            "client_id": "cid",
            "client_secret": "cs",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "redirect_uris": ["http://localhost"]
        }}"#;
        let creds: ClientCredentials = serde_json::from_str(with_secret).unwrap();
        assert_eq!(creds.installed.client_secret.as_deref(), Some("cs"));

        let without_secret = r#"{"installed": {
            "client_id": "cid",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }}"#;
        let creds: ClientCredentials = serde_json::from_str(without_secret).unwrap();
        assert!(creds.installed.client_secret.is_none());
    }
}
