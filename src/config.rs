//! Sheet configuration loading.
//!
//! The sheet coordinates (spreadsheet id, tab, range) load from the first
//! source that exists: an explicit `LEADLINE_SHEET_JSON` path, a
//! `leadline.json` in the working directory, one in the user config
//! directory, and finally the embedded default.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::APP_NAME;

const EMBEDDED_CONFIG: &str = include_str!("../leadline.json");

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_read_range() -> String {
    "A2:L".to_string()
}

/// Where the sheet lives and which cells to read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_read_range")]
    pub read_range: String,
    #[serde(default)]
    pub sheet_id: i64,
}

/// Which source a loaded config came from, for the startup log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetSource {
    Embedded,
    File(PathBuf),
}

impl SheetSource {
    pub fn label(&self) -> String {
        match self {
            SheetSource::Embedded => "embedded defaults".to_string(),
            SheetSource::File(path) => path.display().to_string(),
        }
    }
}

impl SheetConfig {
    /// A1-notation range qualified with the tab name, as the values
    /// endpoint expects it.
    pub fn full_range(&self) -> String {
        format!("{}!{}", self.sheet_name, self.read_range)
    }

    /// Load the sheet config from the highest-priority source available.
    pub fn load() -> Result<(Self, SheetSource)> {
        if let Some(path) = std::env::var_os("LEADLINE_SHEET_JSON") {
            let path = PathBuf::from(path);
            let config = Self::load_from_path(&path)?;
            return Ok((config, SheetSource::File(path)));
        }

        let cwd_path = PathBuf::from("leadline.json");
        if cwd_path.exists() {
            let config = Self::load_from_path(&cwd_path)?;
            return Ok((config, SheetSource::File(cwd_path)));
        }

        if let Some(path) = config_dir_file("leadline.json") {
            if path.exists() {
                let config = Self::load_from_path(&path)?;
                return Ok((config, SheetSource::File(path)));
            }
        }

        let config = serde_json::from_str(EMBEDDED_CONFIG)
            .context("parse embedded sheet config")?;
        Ok((config, SheetSource::Embedded))
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read sheet config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse sheet config {}", path.display()))
    }
}

/// Path to `filename` inside the app's config directory, if one exists for
/// this platform.
pub fn config_dir_file(filename: &str) -> Option<PathBuf> {
    let dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(dirs.config_dir().join(filename))
}
