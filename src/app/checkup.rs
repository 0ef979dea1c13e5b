//! The follow-up check flow — direct scan execution and the Gemini agent
//! loop that drives it through function calling.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use reqwest::Client;
use serde_json::{json, Value};

use crate::constants::CHECK_TOOL_NAME;
use crate::gemini;
use crate::google;
use crate::scanner::{self, ScanReport};
use crate::sheets::SheetsClient;

use super::log_src;
use super::logging::LogLevel;
use super::App;

impl App {
    /// `/check` — let the agent decide to call the tool and narrate the result.
    pub(crate) fn run_check(&mut self) {
        self.run_agent("Check if I have any leads to follow up today");
    }

    /// `/scan` — run the sheet scan directly and print the summary.
    pub(crate) fn run_scan(&mut self) {
        self.log(LogLevel::Info, "🔍 Scanning the sheet…".to_string());
        match self.execute_check() {
            Ok(report) => {
                self.log_skip_warning(&report);
                let summary = report.summary();
                self.log_block(&summary);
            }
            Err(err) => {
                log_src!(self, LogLevel::Error, format!("Scan failed: {err:#}"));
            }
        }
    }

    /// Run one agent turn: send the prompt to Gemini with the check tool
    /// available, execute any function calls it makes, and log the final
    /// text reply.
    pub(crate) fn run_agent(&mut self, prompt: &str) {
        let key = match self.ensure_gemini_key() {
            Ok(key) => key,
            Err(err) => {
                log_src!(self, LogLevel::Error, format!("Gemini key missing: {err}"));
                self.log(
                    LogLevel::Info,
                    "Use /gemini set <key> or /key <key> to configure.".to_string(),
                );
                return;
            }
        };

        self.log(
            LogLevel::Info,
            "🤖 Talking to Gemini and checking the sheet…".to_string(),
        );

        let tools = [check_tool_declaration()];
        let mut contents = vec![gemini::user_turn(prompt)];
        let mut tool_loops = 0;

        loop {
            let response = match self.runtime.block_on(self.gemini.generate(
                &key,
                &contents,
                Some(&tools),
            )) {
                Ok(response) => response,
                Err(err) => {
                    log_src!(self, LogLevel::Error, format!("Agent turn failed: {err:#}"));
                    return;
                }
            };

            let parts = gemini::extract_parts(&response);
            let calls = gemini::extract_function_calls(&parts);

            if calls.is_empty() {
                let text = gemini::extract_text(&parts);
                if text.trim().is_empty() {
                    log_src!(
                        self,
                        LogLevel::Warn,
                        "Gemini returned an empty reply.".to_string()
                    );
                } else {
                    self.log(LogLevel::Info, "📝 Gemini summary:".to_string());
                    self.log_block(&text);
                }
                return;
            }

            if gemini::tool_loop_limit_reached(tool_loops) {
                log_src!(
                    self,
                    LogLevel::Warn,
                    format!("Stopping after {tool_loops} tool round-trips.")
                );
                return;
            }
            tool_loops += 1;

            contents.push(gemini::model_turn(&parts));
            for call in calls {
                let result = if call.name == CHECK_TOOL_NAME {
                    self.log(LogLevel::Info, "🔧 Running the follow-up check…".to_string());
                    match self.execute_check() {
                        Ok(report) => {
                            self.log_skip_warning(&report);
                            report.summary()
                        }
                        Err(err) => format!("The check failed: {err:#}"),
                    }
                } else {
                    format!("Unknown tool: {}", call.name)
                };
                contents.push(gemini::function_response_turn(&call.name, &result));
            }
        }
    }

    /// Read the sheet, scan for today's follow-ups, and highlight matches.
    fn execute_check(&mut self) -> Result<ScanReport> {
        let http = Client::new();
        let access = self
            .runtime
            .block_on(google::access_token(&http))
            .context("get Google access token")?;
        self.google_signed_in = true;

        let sheets = SheetsClient::new(http, &self.sheet_config.spreadsheet_id);
        let rows = self
            .runtime
            .block_on(sheets.values_get(&access, &self.sheet_config.full_range()))?;

        let today = Local::now().date_naive();
        let report = scanner::scan(&rows, today);

        if !report.highlights.is_empty() {
            self.runtime.block_on(sheets.highlight_rows(
                &access,
                self.sheet_config.sheet_id,
                &report.highlights,
            ))?;
            self.log(
                LogLevel::Info,
                format!("🖍️ Highlighted {} row(s).", report.highlights.len()),
            );
        }

        Ok(report)
    }

    fn log_skip_warning(&mut self, report: &ScanReport) {
        let skipped = report.skipped();
        if skipped > 0 {
            log_src!(
                self,
                LogLevel::Warn,
                format!("Skipped {skipped} row(s) with missing or malformed follow-up dates.")
            );
        }
    }

    fn ensure_gemini_key(&self) -> Result<String> {
        if let Some(key) = &self.gemini_key {
            return Ok(key.clone());
        }
        if let Some(key) = crate::util::env_first(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]) {
            return Ok(key);
        }
        Err(anyhow!("Gemini key not configured"))
    }
}

/// The single function exposed to the model. It takes no arguments, so the
/// declaration carries no parameter schema.
fn check_tool_declaration() -> Value {
    json!({
        "name": CHECK_TOOL_NAME,
        "description": "Checks the Google Sheet for leads needing follow-up today and highlights them.",
    })
}
