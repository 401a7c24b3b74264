//! Shared fixtures for operator tests

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use clinlogic_ast::Criteria;
use clinlogic_eval::{EvalResult, LogicEngine, LogicResult, Timeline};
use clinlogic_types::{Observation, Value};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - TimeDelta::days(days)
}

pub fn obs(concept: &str, value: impl Into<Value>, at: DateTime<Utc>) -> Observation {
    Observation::new("p1", concept, value, at)
}

pub fn timeline(observations: impl IntoIterator<Item = Observation>) -> Timeline {
    Timeline::from_observations("p1", observations)
}

/// CD4 counts inserted out of time order; latest is 150, earliest 420
pub fn cd4_timeline() -> Timeline {
    timeline([
        obs("CD4 COUNT", 350.0, days_ago(100)),
        obs("CD4 COUNT", 180.0, days_ago(40)),
        obs("CD4 COUNT", 150.0, days_ago(10)),
        obs("CD4 COUNT", 420.0, days_ago(400)),
    ])
    .with_concepts(["VIRAL LOAD"])
}

pub fn eval(criteria: &Criteria, timeline: &Timeline) -> EvalResult<LogicResult> {
    let engine = LogicEngine::new();
    let mut ctx = engine.context(Some(now()));
    engine.evaluate(criteria, timeline, &mut ctx)
}

pub fn eval_ok(criteria: &Criteria, timeline: &Timeline) -> LogicResult {
    eval(criteria, timeline).unwrap_or_else(|e| panic!("Failed to evaluate {}: {}", criteria, e))
}

/// Numeric values of every item, in result order
pub fn numbers(result: &LogicResult) -> Vec<f64> {
    result
        .items()
        .iter()
        .filter_map(|item| item.to_value().as_number())
        .collect()
}
