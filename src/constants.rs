//! Compile-time constants and tunables shared across the crate.

/// Application name used for config and token directories.
pub const APP_NAME: &str = "leadline";
/// Application version injected from `Cargo.toml` at compile time.
#[allow(dead_code)]
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Gemini model for the summary agent.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default sampling temperature for summary turns.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Base URL for the Google Sheets v4 API.
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
/// OAuth scope required to read and format the sheet.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Name of the single function exposed to the model.
pub const CHECK_TOOL_NAME: &str = "check_leads_today";
/// Maximum number of tool-call round-trips per agent turn.
pub const MAX_TOOL_LOOPS: usize = 6;

/// Background fill applied to matched rows (RGB fractions).
pub const HIGHLIGHT_COLOR: (f64, f64, f64) = (1.0, 1.0, 0.6);

/// Maximum number of log entries kept in the activity panel.
pub const MAX_LOGS: usize = 1000;
