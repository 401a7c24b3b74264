//! A subject's observations, grouped by concept and ordered by effective time

use clinlogic_types::Observation;
use indexmap::IndexMap;
use std::sync::Arc;

/// In-memory, time-ordered observations for one subject.
///
/// A concept is *known* once it is declared or has at least one observation; references
/// to known concepts without observations evaluate to the empty result, while unknown
/// concepts are an error.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    subject: String,
    concepts: IndexMap<String, Vec<Arc<Observation>>>,
}

impl Timeline {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            concepts: IndexMap::new(),
        }
    }

    /// Build a timeline from observations; observations of other subjects are skipped
    pub fn from_observations(
        subject: impl Into<String>,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Self {
        let mut timeline = Self::new(subject);
        for obs in observations {
            timeline.insert(obs);
        }
        timeline
    }

    /// Split observations into one timeline per subject, in order of first appearance
    pub fn group_by_subject(observations: impl IntoIterator<Item = Observation>) -> Vec<Timeline> {
        let mut timelines: IndexMap<String, Timeline> = IndexMap::new();
        for obs in observations {
            timelines
                .entry(obs.subject.clone())
                .or_insert_with(|| Timeline::new(obs.subject.clone()))
                .insert(obs);
        }
        timelines.into_values().collect()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Mark a concept as known without adding observations
    pub fn declare(&mut self, concept: impl Into<String>) {
        self.concepts.entry(concept.into()).or_default();
    }

    pub fn with_concepts<S: Into<String>>(mut self, concepts: impl IntoIterator<Item = S>) -> Self {
        for concept in concepts {
            self.declare(concept);
        }
        self
    }

    /// Add an observation, keeping its concept ordered by effective time.
    ///
    /// Observations with equal effective times keep their insertion order.
    pub fn insert(&mut self, observation: impl Into<Arc<Observation>>) {
        let observation = observation.into();
        if observation.subject != self.subject {
            log::warn!(
                "skipping observation of subject '{}' on timeline of '{}'",
                observation.subject,
                self.subject
            );
            return;
        }
        let series = self.concepts.entry(observation.concept.clone()).or_default();
        let at = series.partition_point(|o| o.effective_at <= observation.effective_at);
        series.insert(at, observation);
    }

    /// Observations of a concept in time order, or `None` for an unknown concept
    pub fn observations(&self, concept: &str) -> Option<&[Arc<Observation>]> {
        self.concepts.get(concept).map(Vec::as_slice)
    }

    pub fn knows(&self, concept: &str) -> bool {
        self.concepts.contains_key(concept)
    }

    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.concepts.keys().map(String::as_str)
    }

    /// Total number of observations
    pub fn len(&self) -> usize {
        self.concepts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, d, 0, 0, 0).unwrap()
    }

    fn values(timeline: &Timeline, concept: &str) -> Vec<f64> {
        timeline
            .observations(concept)
            .unwrap()
            .iter()
            .filter_map(|o| o.value.as_number())
            .collect()
    }

    #[test]
    fn test_insert_orders_by_time_stably() {
        let timeline = Timeline::from_observations(
            "p1",
            [
                Observation::new("p1", "WEIGHT", 70.0, day(3)),
                Observation::new("p1", "WEIGHT", 71.0, day(1)),
                Observation::new("p1", "WEIGHT", 72.0, day(3)),
                Observation::new("p1", "WEIGHT", 73.0, day(2)),
            ],
        );
        assert_eq!(values(&timeline, "WEIGHT"), vec![71.0, 73.0, 70.0, 72.0]);
    }

    #[test]
    fn test_declared_and_unknown_concepts() {
        let timeline = Timeline::new("p1").with_concepts(["CD4 COUNT"]);
        assert_eq!(timeline.observations("CD4 COUNT").map(<[_]>::len), Some(0));
        assert!(timeline.observations("WEIGHT").is_none());
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_other_subjects_are_skipped() {
        let mut timeline = Timeline::new("p1");
        timeline.insert(Observation::new("p2", "WEIGHT", 70.0, day(1)));
        assert!(!timeline.knows("WEIGHT"));
    }

    #[test]
    fn test_group_by_subject() {
        let timelines = Timeline::group_by_subject([
            Observation::new("p2", "WEIGHT", 70.0, day(1)),
            Observation::new("p1", "WEIGHT", 60.0, day(1)),
            Observation::new("p2", "WEIGHT", 71.0, day(2)),
        ]);
        let subjects: Vec<&str> = timelines.iter().map(Timeline::subject).collect();
        assert_eq!(subjects, vec!["p2", "p1"]);
        assert_eq!(timelines[0].len(), 2);
    }
}
