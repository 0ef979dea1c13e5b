//! OAuth 2.0 browser consent flow for the Google account — PKCE, local
//! callback handling, and token exchange.

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use rand::RngCore;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tiny_http::{Response, Server};
use url::Url;

use crate::constants::SHEETS_SCOPE;
use crate::google::{load_credentials, GoogleToken, InstalledApp};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug)]
struct OAuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Run the full installed-app consent flow: open the browser, wait for the
/// loopback redirect, and exchange the code for a token.
pub async fn run_consent_flow<F>(http: &Client, mut log: F) -> Result<GoogleToken>
where
    F: FnMut(String),
{
    let credentials = load_credentials()?;
    let installed = &credentials.installed;

    let listener = TcpListener::bind("127.0.0.1:0").context("bind localhost for OAuth")?;
    let port = listener.local_addr().context("get listener port")?.port();
    let redirect_uri = format!("http://localhost:{port}/callback");

    let (code_verifier, code_challenge) = pkce_pair();
    let state = random_state();

    let mut auth_url = Url::parse(&installed.auth_uri).context("parse auth_uri")?;
    auth_url
        .query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &installed.client_id)
        .append_pair("redirect_uri", &redirect_uri)
        .append_pair("scope", SHEETS_SCOPE)
        .append_pair("code_challenge", &code_challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("state", &state)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");

    log("Opening the Google consent page in your browser…".to_string());
    if open::that(auth_url.as_str()).is_err() {
        log(format!("Could not open a browser. Visit: {auth_url}"));
    }

    let server = Server::from_listener(listener, None)
        .map_err(|err| anyhow!("start callback server: {err}"))?;
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        if let Ok(callback) = wait_for_callback(server) {
            let _ = sender.send(callback);
        }
    });

    let callback = receiver.recv_timeout(CALLBACK_TIMEOUT).map_err(|_| {
        anyhow!(
            "Timed out waiting for OAuth callback ({}s)",
            CALLBACK_TIMEOUT.as_secs()
        )
    })?;

    if let Some(error) = callback.error {
        return Err(anyhow!("Consent denied: {error}"));
    }
    let code = callback
        .code
        .ok_or_else(|| anyhow!("OAuth callback missing code"))?;
    if callback.state.as_deref() != Some(state.as_str()) {
        return Err(anyhow!("OAuth state mismatch"));
    }

    log("Exchanging the authorization code for a token…".to_string());
    exchange_code(http, installed, &code, &redirect_uri, &code_verifier).await
}

async fn exchange_code(
    http: &Client,
    installed: &InstalledApp,
    code: &str,
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<GoogleToken> {
    let mut params = vec![
        ("grant_type", "authorization_code".to_string()),
        ("code", code.to_string()),
        ("redirect_uri", redirect_uri.to_string()),
        ("client_id", installed.client_id.clone()),
        ("code_verifier", code_verifier.to_string()),
    ];
    if let Some(secret) = &installed.client_secret {
        params.push(("client_secret", secret.clone()));
    }

    let response = http
        .post(&installed.token_uri)
        .form(&params)
        .send()
        .await
        .context("exchange token")?;

    let status = response.status();
    let text = response.text().await.context("read token response")?;
    if !status.is_success() {
        return Err(anyhow!("Token exchange failed: {text}"));
    }

    let parsed: TokenResponse = serde_json::from_str(&text).context("parse token response")?;
    let expiry = parsed
        .expires_in
        .map(|secs| (Utc::now() + chrono::Duration::seconds(secs)).to_rfc3339());

    Ok(GoogleToken {
        token: parsed.access_token,
        refresh_token: parsed.refresh_token,
        token_uri: installed.token_uri.clone(),
        client_id: installed.client_id.clone(),
        client_secret: installed.client_secret.clone(),
        scopes: vec![SHEETS_SCOPE.to_string()],
        expiry,
    })
}

fn wait_for_callback(server: Server) -> Result<OAuthCallback> {
    for request in server.incoming_requests() {
        let url = format!("http://localhost{}", request.url());
        let parsed = Url::parse(&url).context("parse callback url")?;
        let mut code = None;
        let mut state = None;
        let mut error = None;

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.to_string()),
                "state" => state = Some(value.to_string()),
                "error" => error = Some(value.to_string()),
                _ => {}
            }
        }

        let response = Response::from_string(
            "OAuth complete. You can close this window and return to the terminal.",
        );
        let _ = request.respond(response);

        return Ok(OAuthCallback { code, state, error });
    }

    Err(anyhow!("No OAuth callback received"))
}

fn pkce_pair() -> (String, String) {
    let mut verifier_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut verifier_bytes);
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(digest);

    (verifier, challenge)
}

fn random_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_sha256_of_verifier() {
        let (verifier, challenge) = pkce_pair();
        let digest = Sha256::digest(verifier.as_bytes());
        assert_eq!(challenge, URL_SAFE_NO_PAD.encode(digest));
        assert_ne!(verifier, challenge);
    }

    #[test]
    fn state_is_url_safe() {
        let state = random_state();
        assert!(!state.is_empty());
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
