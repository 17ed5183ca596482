use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Scrape-run configuration, loaded once at startup from `settings.json`
/// and handed to the components explicitly.
///
/// Only the WebDriver endpoint list is expected to be present in the file
/// (under the `SELENIUM_SERVERS` key); every other knob has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "SELENIUM_SERVERS", default)]
    pub selenium_servers: Vec<SeleniumServer>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_schedule_path")]
    pub schedule_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeleniumServer {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "PORT")]
    pub port: u16,
}

impl SeleniumServer {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

impl Settings {
    /// Load settings from `path`. A missing file falls back to defaults
    /// (which carry no WebDriver endpoints); a malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Settings file {} not found, using defaults (no WebDriver endpoints)",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn endpoint_urls(&self) -> Vec<String> {
        self.selenium_servers.iter().map(SeleniumServer::url).collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selenium_servers: Vec::new(),
            api_url: default_api_url(),
            category: default_category(),
            page_size: default_page_size(),
            worker_count: default_worker_count(),
            output_path: default_output_path(),
            schedule_path: default_schedule_path(),
        }
    }
}

fn default_api_url() -> String {
    "https://www.waitrose.com/api/graphql-prod/graph/live".to_string()
}

fn default_category() -> String {
    "10051".to_string()
}

fn default_page_size() -> usize {
    80
}

fn default_worker_count() -> usize {
    6
}

fn default_output_path() -> PathBuf {
    PathBuf::from("waitrose_products.csv")
}

fn default_schedule_path() -> PathBuf {
    PathBuf::from("watcher.txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_endpoint_list_with_original_key_casing() {
        let settings: Settings = serde_json::from_str(
            r#"{"SELENIUM_SERVERS": [{"IP": "18.169.27.82", "PORT": 9515}, {"IP": "13.42.66.41", "PORT": 9515}]}"#,
        )
        .unwrap();
        assert_eq!(
            settings.endpoint_urls(),
            vec!["http://18.169.27.82:9515", "http://13.42.66.41:9515"]
        );
        // Everything else falls back to its default.
        assert_eq!(settings.page_size, 80);
        assert_eq!(settings.worker_count, 6);
        assert_eq!(settings.category, "10051");
    }

    #[test]
    fn explicit_knobs_override_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"page_size": 40, "worker_count": 2, "output_path": "out.csv"}"#,
        )
        .unwrap();
        assert_eq!(settings.page_size, 40);
        assert_eq!(settings.worker_count, 2);
        assert_eq!(settings.output_path, PathBuf::from("out.csv"));
        assert!(settings.selenium_servers.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json")).unwrap();
        assert!(settings.endpoint_urls().is_empty());
        assert_eq!(settings.schedule_path, PathBuf::from("watcher.txt"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
