// src/storage/memory.rs

//! In-memory process store.
//!
//! Backs the test suite and the CLI demo. Production deployments plug a
//! relational backend into the [`ProcessStore`] trait instead.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{Document, Movement, ProcessPatch, ProcessRecord};
use crate::storage::ProcessStore;

/// Process store keyed by case number, held behind an async RwLock.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ProcessRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn get_by_case_number(&self, case_number: &str) -> Result<Option<ProcessRecord>> {
        Ok(self.records.read().await.get(case_number).cloned())
    }

    async fn create(&self, record: ProcessRecord) -> Result<ProcessRecord> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.case_number) {
            return Err(AppError::validation(format!(
                "Process already registered: {}",
                record.case_number
            )));
        }
        records.insert(record.case_number.clone(), record.clone());
        Ok(record)
    }

    async fn update_fields(
        &self,
        case_number: &str,
        patch: ProcessPatch,
    ) -> Result<Option<ProcessRecord>> {
        let mut records = self.records.write().await;
        match records.get_mut(case_number) {
            Some(record) => {
                record.apply(patch, Utc::now());
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn append_movement(&self, case_number: &str, movement: Movement) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(case_number)
            .ok_or_else(|| AppError::validation(format!("Unknown process: {case_number}")))?;
        record.movements.push(movement);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn append_document(&self, case_number: &str, document: Document) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(case_number)
            .ok_or_else(|| AppError::validation(format!("Unknown process: {case_number}")))?;
        record.documents.push(document);
        record.updated_at = Utc::now();
        Ok(())
    }
}
