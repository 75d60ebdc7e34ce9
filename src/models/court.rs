// src/models/court.rs

//! Court definitions and acronym lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A scraping target: one court and its entry URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub name: String,

    /// Unique acronym, used as the adapter lookup key (e.g. "TJSP")
    pub acronym: String,

    /// Court tier/family (TJ, TRF, TST, STJ, STF)
    pub court_type: String,

    /// Two-letter state for state courts
    #[serde(default)]
    pub state: Option<String>,

    pub base_url: String,

    #[serde(default)]
    pub search_url: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Case-insensitive acronym index over the configured courts.
///
/// Built once at startup from config and injected where needed; a missing
/// acronym is reported as `UnsupportedCourt` by callers.
#[derive(Debug, Clone, Default)]
pub struct CourtDirectory {
    courts: HashMap<String, Court>,
}

impl CourtDirectory {
    pub fn new(courts: Vec<Court>) -> Self {
        Self {
            courts: courts
                .into_iter()
                .map(|c| (c.acronym.to_uppercase(), c))
                .collect(),
        }
    }

    /// Look up a court by acronym, case-insensitively.
    pub fn get(&self, acronym: &str) -> Option<&Court> {
        self.courts.get(&acronym.to_uppercase())
    }

    /// Sorted list of known acronyms.
    pub fn acronyms(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.courts.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}
