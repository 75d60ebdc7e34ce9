// src/storage/mod.rs

//! Persistence collaborator boundary.
//!
//! The core never issues queries of its own; it talks to whatever backend
//! implements [`ProcessStore`]. Records returned by `get_by_case_number`
//! carry their movement/document lists so reconciliation can compute dedup
//! keysets without extra round trips. [`MemoryStore`] is the in-process
//! implementation used by tests and the CLI demo.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Document, Movement, ProcessPatch, ProcessRecord};

// Re-export for convenience
pub use memory::MemoryStore;

/// Operations the core requires from the persistence engine.
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Fetch a record (with movements and documents) by case number.
    async fn get_by_case_number(&self, case_number: &str) -> Result<Option<ProcessRecord>>;

    /// Persist a new record. Fails when the case number already exists.
    async fn create(&self, record: ProcessRecord) -> Result<ProcessRecord>;

    /// Apply a field-level patch; `None` fields are left untouched.
    /// Returns the updated record, or `None` when the case is unknown.
    async fn update_fields(
        &self,
        case_number: &str,
        patch: ProcessPatch,
    ) -> Result<Option<ProcessRecord>>;

    /// Append one movement to an existing record.
    async fn append_movement(&self, case_number: &str, movement: Movement) -> Result<()>;

    /// Append one document to an existing record.
    async fn append_document(&self, case_number: &str, document: Document) -> Result<()>;
}
