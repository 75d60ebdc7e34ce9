// src/pipeline/reconcile.rs

//! Reconciliation of freshly extracted data against stored state.
//!
//! One process identifier is in one of two states: no stored record yet
//! (first successful scrape creates it) or present (extracted scalars merge
//! field-level, movements/documents append by dedup key). A scrape failure
//! only bumps the error counter on an already-stored record.
//!
//! Callers must not reconcile the same case number concurrently; the
//! read-modify-write over the dedup keysets is not serialized here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Document, Movement, ProcessPatch, ProcessRecord};
use crate::scrapers::ExtractedProcess;
use crate::storage::ProcessStore;
use crate::utils::fingerprint;

/// What one reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// A new record was created (as opposed to merging into an existing one)
    pub created: bool,
    pub new_movements: usize,
    pub new_documents: usize,
}

/// Insert-or-merge engine over the storage collaborator.
pub struct Reconciler<'a> {
    store: &'a dyn ProcessStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ProcessStore) -> Self {
        Self { store }
    }

    /// Reconcile a successful extraction for one case number.
    pub async fn apply_success(
        &self,
        case_number: &str,
        court: &str,
        extracted: ExtractedProcess,
        movements: Vec<Movement>,
        documents: Vec<Document>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome> {
        log::debug!(
            "Reconciling {} (snapshot {})",
            case_number,
            &fingerprint(&extracted.raw_html)[..12]
        );

        match self.store.get_by_case_number(case_number).await? {
            Some(existing) => {
                self.merge(existing, extracted, movements, documents, now)
                    .await
            }
            None => {
                self.insert(case_number, court, extracted, movements, documents, now)
                    .await
            }
        }
    }

    /// Record a scrape failure.
    ///
    /// Increments the consecutive error counter on the stored record;
    /// a failure before the first successful scrape leaves nothing behind.
    /// `last_scraped_at` tracks successes only and is not touched.
    pub async fn record_failure(&self, case_number: &str) -> Result<()> {
        let Some(existing) = self.store.get_by_case_number(case_number).await? else {
            return Ok(());
        };

        let patch = ProcessPatch {
            scrape_errors: Some(existing.scrape_errors + 1),
            ..ProcessPatch::default()
        };
        self.store.update_fields(case_number, patch).await?;
        Ok(())
    }

    async fn insert(
        &self,
        case_number: &str,
        court: &str,
        extracted: ExtractedProcess,
        movements: Vec<Movement>,
        documents: Vec<Document>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome> {
        let mut record = ProcessRecord::new(case_number, court, now);
        record.subject = extracted.subject;
        record.class_type = extracted.class_type;
        record.area = extracted.area;
        record.distribution_date = extracted.distribution_date;
        record.current_location = extracted.current_location;
        record.judge = extracted.judge;
        record.case_value = extracted.case_value;
        record.plaintiffs = extracted.plaintiffs;
        record.defendants = extracted.defendants;
        record.lawyers = extracted.lawyers;
        record.last_scraped_at = Some(now);
        record.scrape_errors = 0;
        record.raw_html = Some(extracted.raw_html);

        self.store.create(record).await?;

        let outcome = ReconcileOutcome {
            created: true,
            new_movements: self
                .append_movements(case_number, HashSet::new(), movements)
                .await?,
            new_documents: self
                .append_documents(case_number, HashSet::new(), documents)
                .await?,
        };
        Ok(outcome)
    }

    async fn merge(
        &self,
        existing: ProcessRecord,
        extracted: ExtractedProcess,
        movements: Vec<Movement>,
        documents: Vec<Document>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome> {
        let case_number = existing.case_number.clone();

        // Field-level merge: a page that transiently omits a field must not
        // erase previously known data, so absent values stay `None` in the
        // patch. Party lists count as absent when empty.
        let patch = ProcessPatch {
            subject: extracted.subject,
            class_type: extracted.class_type,
            area: extracted.area,
            distribution_date: extracted.distribution_date,
            current_location: extracted.current_location,
            judge: extracted.judge,
            case_value: extracted.case_value,
            plaintiffs: some_when_nonempty(extracted.plaintiffs),
            defendants: some_when_nonempty(extracted.defendants),
            lawyers: some_when_nonempty(extracted.lawyers),
            last_scraped_at: Some(now),
            scrape_errors: Some(0),
            raw_html: Some(extracted.raw_html),
            ..ProcessPatch::default()
        };
        self.store.update_fields(&case_number, patch).await?;

        let movement_keys: HashSet<(DateTime<Utc>, String)> =
            existing.movements.iter().map(|m| m.dedup_key()).collect();
        let document_keys: HashSet<String> = existing
            .documents
            .iter()
            .map(|d| d.dedup_key().to_string())
            .collect();

        let outcome = ReconcileOutcome {
            created: false,
            new_movements: self
                .append_movements(&case_number, movement_keys, movements)
                .await?,
            new_documents: self
                .append_documents(&case_number, document_keys, documents)
                .await?,
        };
        Ok(outcome)
    }

    /// Append movements whose dedup key is not yet present. The keyset is
    /// extended as we go, so duplicates inside one extraction collapse too.
    async fn append_movements(
        &self,
        case_number: &str,
        mut seen: HashSet<(DateTime<Utc>, String)>,
        movements: Vec<Movement>,
    ) -> Result<usize> {
        let mut appended = 0;
        for movement in movements {
            if seen.insert(movement.dedup_key()) {
                self.store.append_movement(case_number, movement).await?;
                appended += 1;
            }
        }
        Ok(appended)
    }

    async fn append_documents(
        &self,
        case_number: &str,
        mut seen: HashSet<String>,
        documents: Vec<Document>,
    ) -> Result<usize> {
        let mut appended = 0;
        for document in documents {
            if seen.insert(document.dedup_key().to_string()) {
                self.store.append_document(case_number, document).await?;
                appended += 1;
            }
        }
        Ok(appended)
    }
}

fn some_when_nonempty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Party;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    const CASE: &str = "00012340520208260100";

    fn extraction() -> ExtractedProcess {
        ExtractedProcess {
            subject: Some("Cobrança".into()),
            class_type: Some("Procedimento Comum".into()),
            judge: Some("Dra. Maria Silva".into()),
            plaintiffs: vec![Party::new("João da Silva", "Autor")],
            raw_html: "<html>page</html>".into(),
            ..ExtractedProcess::default()
        }
    }

    fn movement(day: u32, description: &str) -> Movement {
        Movement {
            date: Utc.with_ymd_and_hms(2024, 4, day, 0, 0, 0).unwrap(),
            movement_type: "Juntada".into(),
            description: description.into(),
            complementary_info: None,
            responsible: None,
        }
    }

    fn document(title: &str) -> Document {
        Document {
            document_type: "Petição".into(),
            title: title.into(),
            filing_date: None,
            file_url: None,
            file_hash: None,
            file_size: None,
            is_public: true,
            downloaded: false,
        }
    }

    #[tokio::test]
    async fn test_first_scrape_creates_record() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);
        let now = Utc::now();

        let outcome = reconciler
            .apply_success(
                CASE,
                "TJSP",
                extraction(),
                vec![movement(1, "Distribuído"), movement(2, "Conclusos")],
                vec![document("Petição inicial")],
                now,
            )
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.new_movements, 2);
        assert_eq!(outcome.new_documents, 1);

        let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
        assert_eq!(record.subject.as_deref(), Some("Cobrança"));
        assert_eq!(record.last_scraped_at, Some(now));
        assert_eq!(record.scrape_errors, 0);
        assert_eq!(record.movements.len(), 2);
        assert_eq!(record.documents.len(), 1);
        assert!(record.raw_html.is_some());
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);
        let movements = vec![movement(1, "Distribuído"), movement(2, "Conclusos")];
        let documents = vec![document("Petição inicial")];

        reconciler
            .apply_success(
                CASE,
                "TJSP",
                extraction(),
                movements.clone(),
                documents.clone(),
                Utc::now(),
            )
            .await
            .unwrap();

        let second = reconciler
            .apply_success(CASE, "TJSP", extraction(), movements, documents, Utc::now())
            .await
            .unwrap();

        assert!(!second.created);
        assert_eq!(second.new_movements, 0);
        assert_eq!(second.new_documents, 0);

        let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
        assert_eq!(record.movements.len(), 2);
        assert_eq!(record.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_merge_appends_only_novel_items() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);

        reconciler
            .apply_success(
                CASE,
                "TJSP",
                extraction(),
                vec![movement(1, "Distribuído")],
                vec![],
                Utc::now(),
            )
            .await
            .unwrap();

        let outcome = reconciler
            .apply_success(
                CASE,
                "TJSP",
                extraction(),
                vec![movement(1, "Distribuído"), movement(3, "Sentença")],
                vec![document("Sentença")],
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.new_movements, 1);
        assert_eq!(outcome.new_documents, 1);
        let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
        assert_eq!(record.movements.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_extraction_collapse() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);

        let outcome = reconciler
            .apply_success(
                CASE,
                "TJSP",
                extraction(),
                vec![movement(1, "Distribuído"), movement(1, "Distribuído")],
                vec![],
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.new_movements, 1);
    }

    #[tokio::test]
    async fn test_merge_preserves_fields_absent_from_page() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);

        reconciler
            .apply_success(CASE, "TJSP", extraction(), vec![], vec![], Utc::now())
            .await
            .unwrap();

        // Second fetch: the page omits judge and parties.
        let sparse = ExtractedProcess {
            subject: Some("Cobrança de aluguéis".into()),
            raw_html: "<html>v2</html>".into(),
            ..ExtractedProcess::default()
        };
        reconciler
            .apply_success(CASE, "TJSP", sparse, vec![], vec![], Utc::now())
            .await
            .unwrap();

        let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
        assert_eq!(record.subject.as_deref(), Some("Cobrança de aluguéis"));
        assert_eq!(record.judge.as_deref(), Some("Dra. Maria Silva"));
        assert_eq!(record.plaintiffs.len(), 1);
        // The snapshot is always refreshed.
        assert_eq!(record.raw_html.as_deref(), Some("<html>v2</html>"));
    }

    #[tokio::test]
    async fn test_failure_counter_is_monotonic_and_resets() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);

        reconciler
            .apply_success(CASE, "TJSP", extraction(), vec![], vec![], Utc::now())
            .await
            .unwrap();
        let scraped_at = store
            .get_by_case_number(CASE)
            .await
            .unwrap()
            .unwrap()
            .last_scraped_at;

        for expected in 1..=3 {
            reconciler.record_failure(CASE).await.unwrap();
            let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
            assert_eq!(record.scrape_errors, expected);
            // Failures never advance the freshness timestamp.
            assert_eq!(record.last_scraped_at, scraped_at);
        }

        reconciler
            .apply_success(CASE, "TJSP", extraction(), vec![], vec![], Utc::now())
            .await
            .unwrap();
        let record = store.get_by_case_number(CASE).await.unwrap().unwrap();
        assert_eq!(record.scrape_errors, 0);
    }

    #[tokio::test]
    async fn test_failure_without_record_persists_nothing() {
        let store = MemoryStore::new();
        let reconciler = Reconciler::new(&store);

        reconciler.record_failure(CASE).await.unwrap();
        assert!(store.get_by_case_number(CASE).await.unwrap().is_none());
    }
}
