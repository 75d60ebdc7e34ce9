// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Court;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Court catalog (adapter targets)
    #[serde(default = "defaults::courts")]
    pub courts: Vec<Court>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.max_retries == 0 {
            return Err(AppError::validation("scraper.max_retries must be > 0"));
        }
        if self.scraper.max_concurrent == 0 {
            return Err(AppError::validation("scraper.max_concurrent must be > 0"));
        }
        if self.courts.is_empty() {
            return Err(AppError::validation("No courts defined"));
        }
        let mut seen = std::collections::HashSet::new();
        for court in &self.courts {
            if !seen.insert(court.acronym.to_uppercase()) {
                return Err(AppError::validation(format!(
                    "Duplicate court acronym: {}",
                    court.acronym
                )));
            }
            url::Url::parse(&court.base_url).map_err(|e| {
                AppError::validation(format!("Invalid base_url for {}: {e}", court.acronym))
            })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            courts: defaults::courts(),
        }
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum request attempts for transient failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, in seconds
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_secs: u64,

    /// Maximum concurrent in-flight scrapes per batch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Re-scrape eligibility window, in seconds
    #[serde(default = "defaults::freshness_window")]
    pub freshness_window_secs: u64,
}

impl ScraperConfig {
    /// Request timeout as a std duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Freshness window as a chrono duration.
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.freshness_window_secs as i64)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            retry_base_delay_secs: defaults::retry_base_delay(),
            max_concurrent: defaults::max_concurrent(),
            freshness_window_secs: defaults::freshness_window(),
        }
    }
}

mod defaults {
    use crate::models::Court;

    // Scraper defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; JuriTrack/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        5
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn freshness_window() -> u64 {
        3600
    }

    // Court catalog defaults
    pub fn courts() -> Vec<Court> {
        vec![Court {
            name: "Tribunal de Justiça de São Paulo".to_string(),
            acronym: "TJSP".to_string(),
            court_type: "TJ".to_string(),
            state: Some("SP".to_string()),
            base_url: "https://esaj.tjsp.jus.br".to_string(),
            search_url: Some("https://esaj.tjsp.jus.br/cpopg/search.do".to_string()),
            active: true,
        }]
    }
}
