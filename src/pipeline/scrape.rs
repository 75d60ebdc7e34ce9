// src/pipeline/scrape.rs

//! Concurrent scrape orchestration.
//!
//! `scrape_one` runs the full cycle for a single case number: validate,
//! resolve the court adapter, apply the freshness gate, fetch the three
//! facets, reconcile. `scrape_many` fans that out over a batch behind a
//! counting admission gate; one item's failure never aborts its siblings,
//! and the aggregate preserves input order.
//!
//! In-flight fetches are not cancellable from here; a caller that drops the
//! batch future lets running tasks drain.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::error::{AppError, Result};
use crate::models::{CourtDirectory, ScraperConfig};
use crate::pipeline::reconcile::Reconciler;
use crate::scrapers::ScraperRegistry;
use crate::storage::ProcessStore;
use crate::utils::{only_digits, validate_cnj_number};

/// Result of scraping one case number.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub case_number: String,
    pub success: bool,
    /// The freshness gate short-circuited; no network traffic happened
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub movements_count: usize,
    pub documents_count: usize,
}

impl ScrapeOutcome {
    fn completed(case_number: &str, movements_count: usize, documents_count: usize) -> Self {
        Self {
            case_number: case_number.to_string(),
            success: true,
            cached: false,
            error: None,
            movements_count,
            documents_count,
        }
    }

    fn cache_hit(case_number: &str) -> Self {
        Self {
            case_number: case_number.to_string(),
            success: true,
            cached: true,
            error: None,
            movements_count: 0,
            documents_count: 0,
        }
    }

    fn failure(case_number: &str, error: String) -> Self {
        Self {
            case_number: case_number.to_string(),
            success: false,
            cached: false,
            error: Some(error),
            movements_count: 0,
            documents_count: 0,
        }
    }
}

/// Aggregate result of a batch scrape.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Per-item outcomes, in input order
    pub outcomes: Vec<ScrapeOutcome>,
}

/// Schedules scraping across case numbers.
///
/// Holds the adapter registry, the court directory, and the storage
/// collaborator; all are injected at startup.
pub struct ScrapeOrchestrator {
    registry: Arc<ScraperRegistry>,
    store: Arc<dyn ProcessStore>,
    courts: CourtDirectory,
    config: ScraperConfig,
}

impl ScrapeOrchestrator {
    pub fn new(
        registry: Arc<ScraperRegistry>,
        store: Arc<dyn ProcessStore>,
        courts: CourtDirectory,
        config: ScraperConfig,
    ) -> Self {
        Self {
            registry,
            store,
            courts,
            config,
        }
    }

    /// Scrape a single case number.
    ///
    /// Never returns an error: every failure is folded into a structured
    /// outcome. Bad input and unknown courts fail fast; anything that goes
    /// wrong during fetch/extract/reconcile additionally runs the
    /// reconciliation failure path (error counter).
    pub async fn scrape_one(
        &self,
        case_number: &str,
        court: &str,
        force_update: bool,
    ) -> ScrapeOutcome {
        let canonical = only_digits(case_number);

        if !validate_cnj_number(&canonical) {
            let err = AppError::validation(format!("Invalid CNJ case number: {case_number}"));
            return ScrapeOutcome::failure(&canonical, err.to_string());
        }

        let Some(court) = self.courts.get(court).filter(|c| c.active) else {
            let err = AppError::UnsupportedCourt(court.to_string());
            return ScrapeOutcome::failure(&canonical, err.to_string());
        };
        let acronym = court.acronym.clone();

        match self.try_scrape(&canonical, &acronym, force_update).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("Scrape failed for {canonical}: {err}");
                if let Err(store_err) = Reconciler::new(self.store.as_ref())
                    .record_failure(&canonical)
                    .await
                {
                    log::error!("Could not record scrape failure for {canonical}: {store_err}");
                }
                ScrapeOutcome::failure(&canonical, err.to_string())
            }
        }
    }

    /// Scrape a batch of case numbers concurrently.
    ///
    /// At most `max_concurrent` items (config default when `None`) hold an
    /// admission permit at a time; permits are released on every exit path.
    /// All items run to completion regardless of individual failures.
    pub async fn scrape_many(
        &self,
        case_numbers: &[String],
        court: &str,
        max_concurrent: Option<usize>,
    ) -> BatchOutcome {
        let permits = max_concurrent.unwrap_or(self.config.max_concurrent).max(1);
        let gate = Arc::new(Semaphore::new(permits));

        log::info!(
            "Scraping {} case(s) for {} with {} concurrent slot(s)",
            case_numbers.len(),
            court,
            permits
        );

        let tasks = case_numbers.iter().map(|case_number| {
            let gate = Arc::clone(&gate);
            async move {
                let _permit = match gate.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return ScrapeOutcome::failure(
                            &only_digits(case_number),
                            "admission gate closed".to_string(),
                        );
                    }
                };
                self.scrape_one(case_number, court, false).await
            }
        });

        // join_all keeps input order regardless of completion order.
        let outcomes = join_all(tasks).await;
        let success_count = outcomes.iter().filter(|o| o.success).count();

        BatchOutcome {
            total: outcomes.len(),
            success_count,
            error_count: outcomes.len() - success_count,
            outcomes,
        }
    }

    async fn try_scrape(
        &self,
        case_number: &str,
        acronym: &str,
        force_update: bool,
    ) -> Result<ScrapeOutcome> {
        // Freshness gate: recently scraped records are served from storage.
        if !force_update {
            if let Some(record) = self.store.get_by_case_number(case_number).await? {
                if record.is_fresh(self.config.freshness_window(), Utc::now()) {
                    log::debug!("Cache hit for {case_number}");
                    return Ok(ScrapeOutcome::cache_hit(case_number));
                }
            }
        }

        // Fresh adapter per scrape: the HTTP session lives exactly as long
        // as this unit of work.
        let scraper = self.registry.create(acronym)?;
        let extracted = scraper.search_process(case_number).await?;
        let movements = scraper.get_movements(case_number).await?;
        let documents = scraper.get_documents(case_number).await?;
        drop(scraper);

        let movements_count = movements.len();
        let documents_count = documents.len();

        let outcome = Reconciler::new(self.store.as_ref())
            .apply_success(
                case_number,
                acronym,
                extracted,
                movements,
                documents,
                Utc::now(),
            )
            .await?;

        log::info!(
            "Scraped {case_number}: {} new movement(s), {} new document(s){}",
            outcome.new_movements,
            outcome.new_documents,
            if outcome.created { " (new record)" } else { "" }
        );

        Ok(ScrapeOutcome::completed(
            case_number,
            movements_count,
            documents_count,
        ))
    }
}
