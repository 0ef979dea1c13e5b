//! Slash-command dispatch and handler implementations.

use std::env;

use reqwest::Client;

use crate::google::{self, store};

use super::log_src;
use super::logging::{mask_key, LogLevel};
use super::App;

// ── Command dispatch ─────────────────────────────────────────────────

impl App {
    /// Route a slash-command to the matching handler.
    pub(crate) fn handle_command(&mut self, line: &str) -> anyhow::Result<()> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/help" => self.show_help(),
            "/quit" | "/exit" => self.should_quit = true,
            "/clear" => self.logs.clear(),
            "/check" => self.run_check(),
            "/scan" => self.run_scan(),
            "/auth" => self.handle_auth_command(parts.collect()),
            "/sheet" => self.show_sheet_config(),
            "/gemini" => self.handle_gemini_command(parts.collect()),
            "/key" => self.handle_key_command(parts.collect()),
            _ => log_src!(self, LogLevel::Warn, format!("Unknown command: {cmd}")),
        }

        Ok(())
    }
}

// ── Help ─────────────────────────────────────────────────────────────

impl App {
    fn show_help(&mut self) {
        let lines = [
            "━━━  ◆ Leadline — lead follow-up checker  ━━━",
            "",
            "Checking",
            "  /check                  Ask the agent to check today's follow-ups",
            "  /scan                   Run the sheet scan directly, no agent",
            "  (just type)             Send a custom prompt to the agent",
            "",
            "Google account",
            "  /auth                   Sign in with your Google account (browser)",
            "  /auth status            Show token state",
            "  /auth clear             Forget the stored token",
            "",
            "Settings",
            "  /sheet                  Show the configured spreadsheet",
            "  /gemini                 Show Gemini key status",
            "  /gemini set <key>       Set the Gemini API key for this session",
            "  /gemini clear           Forget the session key",
            "  /gemini import-env      Pick up GEMINI_API_KEY from the environment",
            "  /key <key>              Shorthand for /gemini set",
            "",
            "  /clear                  Clear the activity log (also Ctrl+L)",
            "  /quit                   Exit (also Esc or Ctrl+C)",
        ];
        for line in lines {
            self.log(LogLevel::Info, line.to_string());
        }
    }
}

// ── /auth ────────────────────────────────────────────────────────────

impl App {
    fn handle_auth_command(&mut self, args: Vec<&str>) {
        match args.first().copied() {
            None => self.start_consent_flow(),
            Some("status") => self.show_auth_status(),
            Some("clear") => self.clear_auth(),
            Some(other) => log_src!(
                self,
                LogLevel::Warn,
                format!("Unknown /auth command: {other}")
            ),
        }
    }

    fn start_consent_flow(&mut self) {
        self.log(LogLevel::Info, "🔐 Starting Google sign-in…".to_string());

        let http = Client::new();
        let mut progress: Vec<String> = Vec::new();
        let result = self
            .runtime
            .block_on(google::oauth::run_consent_flow(&http, |msg| {
                progress.push(msg)
            }));
        for msg in progress {
            self.log(LogLevel::Info, msg);
        }

        match result {
            Ok(token) => {
                if let Err(err) = store::save_token(&token) {
                    log_src!(
                        self,
                        LogLevel::Error,
                        format!("Failed to save token: {err:#}")
                    );
                    return;
                }
                self.google_signed_in = true;
                self.log(
                    LogLevel::Info,
                    "🔓 Google sign-in complete. Token saved.".to_string(),
                );
            }
            Err(err) => {
                log_src!(
                    self,
                    LogLevel::Error,
                    format!("Google sign-in failed: {err:#}")
                );
            }
        }
    }

    fn show_auth_status(&mut self) {
        match store::load_token() {
            Ok(token) => {
                let state = if google::is_token_expired(&token) {
                    "expired (will refresh on next check)"
                } else {
                    "valid"
                };
                self.log(LogLevel::Info, format!("🔑 Google token: {state}"));
                if token.refresh_token.is_none() {
                    log_src!(
                        self,
                        LogLevel::Warn,
                        "Token has no refresh token; sign in again when it expires.".to_string()
                    );
                }
            }
            Err(err) => log_src!(self, LogLevel::Warn, format!("{err:#}")),
        }
    }

    fn clear_auth(&mut self) {
        match store::clear_token() {
            Ok(true) => {
                self.google_signed_in = false;
                self.log(LogLevel::Info, "Google token removed.".to_string());
            }
            Ok(false) => self.log(LogLevel::Info, "No token stored.".to_string()),
            Err(err) => log_src!(
                self,
                LogLevel::Error,
                format!("Failed to remove token: {err:#}")
            ),
        }
    }
}

// ── /sheet ───────────────────────────────────────────────────────────

impl App {
    fn show_sheet_config(&mut self) {
        let lines = [
            format!("Spreadsheet: {}", self.sheet_config.spreadsheet_id),
            format!("Tab: {}", self.sheet_config.sheet_name),
            format!("Range: {}", self.sheet_config.full_range()),
            format!("Sheet id: {}", self.sheet_config.sheet_id),
            format!("Source: {}", self.sheet_source.label()),
        ];
        for line in lines {
            self.log(LogLevel::Info, line);
        }
    }
}

// ── /gemini ──────────────────────────────────────────────────────────

impl App {
    fn handle_gemini_command(&mut self, args: Vec<&str>) {
        if args.is_empty() {
            self.show_gemini_status();
            return;
        }

        match args[0] {
            "set" | "key" => {
                if let Some(key) = args.get(1) {
                    self.set_gemini_key(key);
                } else {
                    log_src!(self, LogLevel::Warn, "Usage: /gemini set <key>".to_string());
                }
            }
            "clear" => self.clear_gemini_key(),
            "import-env" => self.import_gemini_env(),
            other => log_src!(
                self,
                LogLevel::Warn,
                format!("Unknown /gemini command: {other}")
            ),
        }
    }

    pub(crate) fn handle_key_command(&mut self, args: Vec<&str>) {
        if args.is_empty() {
            self.show_gemini_status();
            return;
        }
        self.set_gemini_key(args[0]);
    }

    fn show_gemini_status(&mut self) {
        match &self.gemini_key_hint {
            Some(hint) => {
                let model = self.gemini.model.clone();
                self.log(
                    LogLevel::Info,
                    format!("Gemini key set ({hint}), model {model}."),
                );
            }
            None => self.log(LogLevel::Info, "Gemini key not set.".to_string()),
        }
    }

    fn set_gemini_key(&mut self, key: &str) {
        self.gemini_key = Some(key.to_string());
        self.gemini_key_hint = Some(mask_key(key));
        self.log(
            LogLevel::Info,
            "Gemini key set for this session.".to_string(),
        );
    }

    fn clear_gemini_key(&mut self) {
        self.gemini_key = None;
        self.gemini_key_hint = None;
        self.log(LogLevel::Info, "Gemini key removed.".to_string());
    }

    fn import_gemini_env(&mut self) {
        match env::var("GEMINI_API_KEY").or_else(|_| env::var("GOOGLE_API_KEY")) {
            Ok(key) => self.set_gemini_key(&key),
            Err(_) => log_src!(self, LogLevel::Warn, "GEMINI_API_KEY not set.".to_string()),
        }
    }
}
