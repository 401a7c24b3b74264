//! Asynchronous observation retrieval
//!
//! Evaluation itself never performs I/O. Observations are fetched through an
//! [`ObservationRetriever`] up front and materialized into [`Timeline`]s.

use crate::timeline::Timeline;
use async_trait::async_trait;
use clinlogic_types::Observation;
use futures::future::try_join_all;
use indexmap::IndexSet;

/// Trait for fetching observations from a data-access collaborator
#[async_trait]
pub trait ObservationRetriever: Send + Sync {
    /// Observations of `subject` for the given concepts, in any order
    async fn retrieve(
        &self,
        subject: &str,
        concepts: &[String],
    ) -> Result<Vec<Observation>, RetrieveError>;

    /// Every subject this source holds data for
    async fn subjects(&self) -> Result<Vec<String>, RetrieveError>;

    /// Concepts known to this source, including those without observations
    async fn concepts(&self) -> Result<Vec<String>, RetrieveError> {
        Ok(Vec::new())
    }
}

/// Observation retrieval error
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrieveError {
    #[error("Retrieve failed: {0}")]
    RetrieveFailed(String),

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Retriever that holds no data
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRetriever;

impl NoOpRetriever {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObservationRetriever for NoOpRetriever {
    async fn retrieve(
        &self,
        _subject: &str,
        _concepts: &[String],
    ) -> Result<Vec<Observation>, RetrieveError> {
        Ok(Vec::new())
    }

    async fn subjects(&self) -> Result<Vec<String>, RetrieveError> {
        Ok(Vec::new())
    }
}

/// Retriever over observations held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRetriever {
    concepts: IndexSet<String>,
    observations: Vec<Observation>,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut retriever = Self::new();
        for obs in observations {
            retriever.add(obs);
        }
        retriever
    }

    /// Declare a concept that may have no observations
    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concepts.insert(concept.into());
        self
    }

    pub fn add(&mut self, observation: Observation) {
        if !self.concepts.contains(&observation.concept) {
            self.concepts.insert(observation.concept.clone());
        }
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[async_trait]
impl ObservationRetriever for InMemoryRetriever {
    async fn retrieve(
        &self,
        subject: &str,
        concepts: &[String],
    ) -> Result<Vec<Observation>, RetrieveError> {
        Ok(self
            .observations
            .iter()
            .filter(|o| o.subject == subject && concepts.contains(&o.concept))
            .cloned()
            .collect())
    }

    async fn subjects(&self) -> Result<Vec<String>, RetrieveError> {
        let subjects: IndexSet<&str> = self.observations.iter().map(|o| o.subject.as_str()).collect();
        Ok(subjects.into_iter().map(str::to_string).collect())
    }

    async fn concepts(&self) -> Result<Vec<String>, RetrieveError> {
        Ok(self.concepts.iter().cloned().collect())
    }
}

/// Fetch a subject's observations for `concepts` and build its timeline.
///
/// Requested concepts the retriever reports as known are declared on the timeline even
/// when the subject has no observations of them.
pub async fn materialize(
    retriever: &dyn ObservationRetriever,
    subject: &str,
    concepts: &[String],
) -> Result<Timeline, RetrieveError> {
    let known = retriever.concepts().await?;
    let observations = retriever.retrieve(subject, concepts).await?;
    log::debug!(
        "retrieved {} observation(s) of {} concept(s) for subject '{}'",
        observations.len(),
        concepts.len(),
        subject
    );
    Ok(build_timeline(subject, &known, concepts, observations))
}

/// Materialize timelines for several subjects concurrently, in the order given
pub async fn materialize_cohort(
    retriever: &dyn ObservationRetriever,
    subjects: &[String],
    concepts: &[String],
) -> Result<Vec<Timeline>, RetrieveError> {
    let known = retriever.concepts().await?;
    let known = &known;
    let fetches = subjects.iter().map(|subject| async move {
        let observations = retriever.retrieve(subject, concepts).await?;
        Ok::<_, RetrieveError>(build_timeline(subject, known, concepts, observations))
    });
    try_join_all(fetches).await
}

fn build_timeline(
    subject: &str,
    known: &[String],
    requested: &[String],
    observations: Vec<Observation>,
) -> Timeline {
    let declared = requested.iter().filter(|c| known.contains(c)).cloned();
    let mut timeline = Timeline::new(subject).with_concepts(declared);
    for obs in observations {
        timeline.insert(obs);
    }
    timeline
}
