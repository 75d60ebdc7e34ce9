// src/scrapers/registry.rs

//! Maps court acronyms to scraper constructors.
//!
//! The registry is built once at startup and injected into the
//! orchestrator; there is no ambient global scraper state. Unknown courts
//! fail closed with `UnsupportedCourt` instead of being silently skipped.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;
use crate::scrapers::CourtScraper;
use crate::scrapers::tjsp::TjspScraper;

/// Constructor for one court's scraper. Invoked per scrape task so every
/// task gets a fresh HTTP session.
pub type ScraperBuilder =
    Box<dyn Fn(&ScraperConfig) -> Result<Box<dyn CourtScraper>> + Send + Sync>;

/// Registry of available court scrapers.
pub struct ScraperRegistry {
    config: ScraperConfig,
    builders: HashMap<String, ScraperBuilder>,
}

impl ScraperRegistry {
    /// Create an empty registry.
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            builders: HashMap::new(),
        }
    }

    /// Create a registry with all built-in scrapers registered.
    pub fn with_default_scrapers(config: ScraperConfig) -> Self {
        let mut registry = Self::new(config);
        registry.register("TJSP", |config| {
            let scraper = TjspScraper::new(config)?;
            Ok(Box::new(scraper) as Box<dyn CourtScraper>)
        });
        registry
    }

    /// Register a scraper constructor under an acronym (case-normalized).
    pub fn register(
        &mut self,
        acronym: &str,
        builder: impl Fn(&ScraperConfig) -> Result<Box<dyn CourtScraper>> + Send + Sync + 'static,
    ) {
        self.builders.insert(acronym.to_uppercase(), Box::new(builder));
    }

    /// Construct a scraper for the given court.
    pub fn create(&self, acronym: &str) -> Result<Box<dyn CourtScraper>> {
        let builder = self
            .builders
            .get(&acronym.to_uppercase())
            .ok_or_else(|| AppError::UnsupportedCourt(acronym.to_string()))?;
        builder(&self.config)
    }

    /// Sorted acronyms with an available scraper, for discovery.
    pub fn available_courts(&self) -> Vec<String> {
        let mut acronyms: Vec<String> = self.builders.keys().cloned().collect();
        acronyms.sort();
        acronyms
    }
}
