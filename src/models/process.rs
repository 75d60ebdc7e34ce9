// src/models/process.rs

//! Judicial process record and its partial-update shape.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Document, Movement};
use crate::utils::fingerprint;

/// Lifecycle status of a judicial process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    #[default]
    Active,
    Archived,
    Suspended,
    ClosedWithdrawn,
    FinalJudgment,
}

/// A named participant in a process (plaintiff, defendant, or lawyer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    /// Role as displayed by the court (e.g. "Autor", "Réu", "Advogado")
    pub role: String,
}

impl Party {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
        }
    }
}

/// One judicial case as stored by the persistence collaborator.
///
/// The case number is the canonical 20-digit CNJ form and is immutable once
/// assigned; every other scalar field may be refreshed by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Canonical 20-digit CNJ case number (unique across the system)
    pub case_number: String,

    /// Acronym of the owning court (e.g. "TJSP")
    pub court: String,

    pub subject: Option<String>,
    pub class_type: Option<String>,
    pub area: Option<String>,
    pub distribution_date: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub judge: Option<String>,

    /// Case value parsed from locale currency text
    pub case_value: Option<Decimal>,

    #[serde(default)]
    pub status: ProcessStatus,

    pub plaintiffs: Vec<Party>,
    pub defendants: Vec<Party>,
    pub lawyers: Vec<Party>,

    /// Docketed movements, append-only
    #[serde(default)]
    pub movements: Vec<Movement>,

    /// Filed documents, append-only
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Timestamp of the last successful scrape
    pub last_scraped_at: Option<DateTime<Utc>>,

    /// Consecutive scrape failures since the last success
    pub scrape_errors: u32,

    /// Raw page snapshot kept for audit/debug
    pub raw_html: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessRecord {
    /// Create a blank record for a case number owned by the given court.
    pub fn new(case_number: impl Into<String>, court: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            case_number: case_number.into(),
            court: court.into(),
            subject: None,
            class_type: None,
            area: None,
            distribution_date: None,
            current_location: None,
            judge: None,
            case_value: None,
            status: ProcessStatus::default(),
            plaintiffs: Vec::new(),
            defendants: Vec::new(),
            lawyers: Vec::new(),
            movements: Vec::new(),
            documents: Vec::new(),
            last_scraped_at: None,
            scrape_errors: 0,
            raw_html: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record was scraped successfully within the window.
    pub fn is_fresh(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.last_scraped_at
            .is_some_and(|scraped| now - scraped < window)
    }

    /// SHA-256 digest of the stored raw snapshot, if any.
    pub fn snapshot_digest(&self) -> Option<String> {
        self.raw_html.as_deref().map(fingerprint)
    }

    /// Apply a field-level patch. `None` fields leave current values intact.
    pub fn apply(&mut self, patch: ProcessPatch, now: DateTime<Utc>) {
        let ProcessPatch {
            subject,
            class_type,
            area,
            distribution_date,
            current_location,
            judge,
            case_value,
            status,
            plaintiffs,
            defendants,
            lawyers,
            last_scraped_at,
            scrape_errors,
            raw_html,
        } = patch;

        if let Some(v) = subject {
            self.subject = Some(v);
        }
        if let Some(v) = class_type {
            self.class_type = Some(v);
        }
        if let Some(v) = area {
            self.area = Some(v);
        }
        if let Some(v) = distribution_date {
            self.distribution_date = Some(v);
        }
        if let Some(v) = current_location {
            self.current_location = Some(v);
        }
        if let Some(v) = judge {
            self.judge = Some(v);
        }
        if let Some(v) = case_value {
            self.case_value = Some(v);
        }
        if let Some(v) = status {
            self.status = v;
        }
        if let Some(v) = plaintiffs {
            self.plaintiffs = v;
        }
        if let Some(v) = defendants {
            self.defendants = v;
        }
        if let Some(v) = lawyers {
            self.lawyers = v;
        }
        if let Some(v) = last_scraped_at {
            self.last_scraped_at = Some(v);
        }
        if let Some(v) = scrape_errors {
            self.scrape_errors = v;
        }
        if let Some(v) = raw_html {
            self.raw_html = Some(v);
        }
        self.updated_at = now;
    }
}

/// Field-level partial update for a [`ProcessRecord`].
///
/// Consumed by the storage collaborator; a `None` field means "leave the
/// stored value untouched", so a page that transiently omits a field never
/// erases previously known data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessPatch {
    pub subject: Option<String>,
    pub class_type: Option<String>,
    pub area: Option<String>,
    pub distribution_date: Option<DateTime<Utc>>,
    pub current_location: Option<String>,
    pub judge: Option<String>,
    pub case_value: Option<Decimal>,
    pub status: Option<ProcessStatus>,
    pub plaintiffs: Option<Vec<Party>>,
    pub defendants: Option<Vec<Party>>,
    pub lawyers: Option<Vec<Party>>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub scrape_errors: Option<u32>,
    pub raw_html: Option<String>,
}
