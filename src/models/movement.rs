// src/models/movement.rs

//! Docketed movement (procedural event) of a process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One docketed event in a process timeline.
///
/// Movements are append-only: reconciliation inserts events whose dedup key
/// is unknown and never mutates or deletes existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub date: DateTime<Utc>,

    /// Type label as displayed by the court (e.g. "Conclusos")
    pub movement_type: String,

    pub description: String,

    #[serde(default)]
    pub complementary_info: Option<String>,

    /// Court officer or unit responsible for the event, when published
    #[serde(default)]
    pub responsible: Option<String>,
}

impl Movement {
    /// Dedup identity within one process.
    ///
    /// Court pages re-render events without stable identifiers, so the
    /// (date, description) pair is the only usable key. Distinct same-day
    /// events with identical text collide; accepted approximation.
    pub fn dedup_key(&self) -> (DateTime<Utc>, String) {
        (self.date, self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_ignores_type_label() {
        let date = Utc::now();
        let a = Movement {
            date,
            movement_type: "Despacho".into(),
            description: "Vistos.".into(),
            complementary_info: None,
            responsible: None,
        };
        let mut b = a.clone();
        b.movement_type = "Decisão".into();
        b.responsible = Some("2ª Vara".into());

        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
