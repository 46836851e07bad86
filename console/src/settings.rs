//! `Settings.ini` loader.
//!
//! The file is a list of `key=value` lines:
//!
//! ```text
//! appkey=1234567890abcdef12345678
//! mastersecret=abcdef1234567890aaaaaaaa
//! proxyurl=http://localhost:8888
//! ```
//!
//! Candidates are tried in order and the first readable file with both
//! required keys wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SEARCH_PATHS: [&str; 2] = ["Settings.ini", "../../Settings.ini"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("Settings.ini not found or invalid (searched: {searched})")]
    NotFound { searched: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub app_key: String,
    pub master_secret: String,
    pub proxy_url: Option<String>,
}

impl Settings {
    /// Parse `key=value` lines. Keys are case-insensitive, later lines win,
    /// blank lines and `#`/`;` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        let values: HashMap<String, String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();

        let required = |key: &'static str| {
            values
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(SettingsError::MissingKey(key))
        };

        Ok(Self {
            app_key: required("appkey")?,
            master_secret: required("mastersecret")?,
            proxy_url: values.get("proxyurl").filter(|value| !value.is_empty()).cloned(),
        })
    }

    /// Load from `explicit` if given, then from the default locations.
    pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, Self), SettingsError> {
        let candidates: Vec<PathBuf> = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from))
            .collect();

        for path in &candidates {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "settings file not readable");
                    continue;
                }
            };
            match Self::parse(&text) {
                Ok(settings) => return Ok((path.clone(), settings)),
                Err(e) => debug!(path = %path.display(), error = %e, "settings file invalid"),
            }
        }

        Err(SettingsError::NotFound {
            searched: candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
