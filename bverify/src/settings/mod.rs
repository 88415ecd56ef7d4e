//! Tool settings
//!
//! Optional TOML file naming the engine command and the report destination.
//! These settings never touch the analysis toggles sent to the engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};
use crate::report::DEFAULT_REPORT_FILE;

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "bverify.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub report: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_engine_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,

    /// Write the report to stdout instead of the file
    #[serde(default)]
    pub console: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: default_report_path(),
            console: false,
        }
    }
}

fn default_engine_command() -> String {
    "taco".to_string()
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_FILE)
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VerifyError::settings(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VerifyError::settings(e.to_string()))
    }
}

/// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] when no path
/// is given. A missing default file yields the defaults; a missing explicit
/// file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    if !explicit && !path.exists() {
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| VerifyError::settings(format!("cannot read '{}': {e}", path.display())))?;
    let settings = Settings::from_toml(&content)
        .map_err(|e| VerifyError::settings(format!("'{}': {}", path.display(), e.message())))?;
    tracing::debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}
