//! Time-stamped clinical facts

use crate::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation about a subject, as produced by a data-access collaborator.
///
/// Observations are immutable; the engine shares them into results behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Subject (patient) identifier
    pub subject: String,
    /// Concept the observation records, e.g. `CD4 COUNT`
    pub concept: String,
    pub value: Value,
    pub effective_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<String>,
}

impl Observation {
    pub fn new(
        subject: impl Into<String>,
        concept: impl Into<String>,
        value: impl Into<Value>,
        effective_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            concept: concept.into(),
            value: value.into(),
            effective_at,
            encounter: None,
        }
    }

    pub fn with_encounter(mut self, encounter: impl Into<String>) -> Self {
        self.encounter = Some(encounter.into());
        self
    }
}
