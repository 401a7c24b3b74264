//! JSON data files of observations

use clinlogic_diagnostics::{LOGIC0406, LogicError, Result};
use clinlogic_eval::{InMemoryRetriever, Timeline};
use clinlogic_types::Observation;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// A set of observations for one or more subjects.
///
/// `concepts` lists concepts the source knows about even when no subject has
/// observations of them, so that references to them evaluate to empty instead of
/// failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| LogicError::system(LOGIC0406, format!("Invalid data file: {}", e)))
    }

    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concepts.push(concept.into());
        self
    }

    pub fn with_observation(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// Subjects in order of first appearance
    pub fn subjects(&self) -> Vec<String> {
        let subjects: IndexSet<&str> = self.observations.iter().map(|o| o.subject.as_str()).collect();
        subjects.into_iter().map(str::to_string).collect()
    }

    /// One timeline per subject, each declaring every listed concept
    pub fn timelines(&self) -> Vec<Timeline> {
        Timeline::group_by_subject(self.observations.iter().cloned())
            .into_iter()
            .map(|t| t.with_concepts(self.concepts.iter().cloned()))
            .collect()
    }

    /// Timeline of a single subject; a subject without observations gets an empty one
    pub fn timeline(&self, subject: &str) -> Timeline {
        Timeline::from_observations(
            subject,
            self.observations.iter().filter(|o| o.subject == subject).cloned(),
        )
        .with_concepts(self.concepts.iter().cloned())
    }

    /// Serve this data set through the async retrieval seam
    pub fn into_retriever(self) -> InMemoryRetriever {
        let concepts = self.concepts;
        concepts
            .into_iter()
            .fold(InMemoryRetriever::from_observations(self.observations), |r, c| {
                r.with_concept(c)
            })
    }
}
