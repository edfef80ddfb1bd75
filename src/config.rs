//! Crawl configuration
//!
//! `Settings` are the persisted defaults (JSON in the platform config dir);
//! `CrawlConfig` is what one crawl actually runs with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CrawlError;
use crate::util::{split_at_root, with_trailing_separator};

const APP_DIR: &str = "svnindex";
const CONFIG_FILE: &str = "config.json";

/// Persisted crawler defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path segment where the repository's logical root begins
    pub root_folder: String,
    pub max_tries: u32,
    /// Depth from which directories are listed recursively
    pub max_level: u32,
    pub retry_delay_secs: u64,
    pub svn_program: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_folder: "repo".to_string(),
            max_tries: 1000,
            max_level: 4,
            retry_delay_secs: 5,
            svn_program: "svn".to_string(),
        }
    }
}

impl Settings {
    /// `<config dir>/svnindex/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load settings from the default location, creating the file on first use.
    pub fn load() -> Result<Self> {
        let path = Self::default_path().context("Could not determine config directory")?;
        Self::load_from(&path)
    }

    /// Load settings from `path`.
    ///
    /// A missing file is created with defaults; an unreadable one falls back
    /// to defaults with a warning.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Config file not found, creating default config at {:?}", path);
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;

        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => {
                tracing::debug!("Loaded config from {:?}", path);
                Ok(settings)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config file at {:?}: {}. Falling back to default config.",
                    path,
                    e
                );
                Ok(Settings::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create config directory {}", dir.display()))?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Everything one crawl needs to know; read-only once the crawl starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Directory URL of the repository root, always ending in `/`
    pub repository_url: String,
    pub revision: String,
    pub root_marker: String,
    pub max_tries: u32,
    pub max_level: u32,
    pub retry_delay: Duration,
}

impl CrawlConfig {
    pub fn new(repository_url: &str, revision: &str, settings: &Settings) -> Self {
        Self {
            repository_url: with_trailing_separator(repository_url.trim()),
            revision: revision.trim().to_string(),
            root_marker: settings.root_folder.clone(),
            max_tries: settings.max_tries,
            max_level: settings.max_level,
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.max_tries == 0 {
            return Err(CrawlError::Config("max_tries must be greater than 0".into()));
        }
        if self.revision.is_empty() {
            return Err(CrawlError::Config("revision must not be empty".into()));
        }
        if split_at_root(&self.repository_url, &self.root_marker).is_none() {
            return Err(CrawlError::RootMarkerMissing {
                url: self.repository_url.clone(),
                marker: self.root_marker.clone(),
            });
        }
        Ok(())
    }
}
