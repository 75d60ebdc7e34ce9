// src/models/document.rs

//! Filed document attached to a process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One filed/attached document. Append-only, like [`crate::models::Movement`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub document_type: String,

    /// Display title; doubles as the dedup key since court pages expose no
    /// stable document identifier
    pub title: String,

    #[serde(default)]
    pub filing_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub file_url: Option<String>,

    #[serde(default)]
    pub file_hash: Option<String>,

    #[serde(default)]
    pub file_size: Option<u64>,

    #[serde(default = "default_public")]
    pub is_public: bool,

    #[serde(default)]
    pub downloaded: bool,
}

fn default_public() -> bool {
    true
}

impl Document {
    /// Dedup identity within one process.
    pub fn dedup_key(&self) -> &str {
        &self.title
    }
}
