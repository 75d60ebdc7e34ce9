// src/scrapers/mod.rs

//! Court scraping adapters.
//!
//! Each supported court implements [`CourtScraper`]: fetch the public search
//! page for a case number and extract the process fields, movement list, and
//! document list. Adapters own their HTTP session ([`FetchClient`]) so
//! concurrent scrape tasks never share connection state.

pub mod client;
pub mod registry;
pub mod tjsp;

pub use client::FetchClient;
pub use registry::ScraperRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Document, Movement, Party};

/// Partial process data extracted from a court's search page.
///
/// A field is populated only when the corresponding markup element is
/// present; absence is not an error.
#[derive(Debug, Clone, Default)]
pub struct ExtractedProcess {
    pub subject: Option<String>,
    pub class_type: Option<String>,
    pub area: Option<String>,
    pub distribution_date: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub judge: Option<String>,
    pub case_value: Option<Decimal>,
    pub plaintiffs: Vec<Party>,
    pub defendants: Vec<Party>,
    pub lawyers: Vec<Party>,
    /// Raw page snapshot for audit/debug
    pub raw_html: String,
}

/// Capability set of a court-specific scraper.
///
/// Each method re-fetches on every call; results are finite snapshots, not
/// resumable streams.
#[async_trait]
pub trait CourtScraper: Send + Sync {
    /// Acronym of the court this scraper serves.
    fn acronym(&self) -> &str;

    /// Fetch the search page and extract the basic process fields.
    async fn search_process(&self, case_number: &str) -> Result<ExtractedProcess>;

    /// Fetch the ordered list of docketed movements.
    async fn get_movements(&self, case_number: &str) -> Result<Vec<Movement>>;

    /// Fetch the ordered list of filed documents.
    async fn get_documents(&self, case_number: &str) -> Result<Vec<Document>>;
}
