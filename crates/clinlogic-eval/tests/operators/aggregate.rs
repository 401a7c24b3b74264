//! Aggregation Operator Tests
//!
//! Tests for: Last, First (with and without a count), Count, Average, Distinct

use super::common::{cd4_timeline, days_ago, eval, eval_ok, numbers, obs, timeline};
use clinlogic_ast::{Criteria, Operator};
use clinlogic_eval::{EvalError, LogicResult, ResultValue};
use clinlogic_types::Code;
use pretty_assertions::assert_eq;

// ============================================================================
// Last / First
// ============================================================================

#[test]
fn test_last_and_first_by_effective_time() {
    let last = eval_ok(&Criteria::reference("CD4 COUNT").last(), &cd4_timeline());
    assert_eq!(numbers(&last), vec![150.0]);
    assert_eq!(last.effective_time(), Some(days_ago(10)));

    let first = eval_ok(&Criteria::reference("CD4 COUNT").first(), &cd4_timeline());
    assert_eq!(numbers(&first), vec![420.0]);
}

#[test]
fn test_last_returns_the_observation() {
    let last = eval_ok(&Criteria::reference("CD4 COUNT").last(), &cd4_timeline());
    let LogicResult::Item(item) = &last else {
        panic!("expected a single item, got {:?}", last);
    };
    let ResultValue::Observation(obs) = &item.value else {
        panic!("expected an observation, got {:?}", item.value);
    };
    assert_eq!(obs.concept, "CD4 COUNT");
    assert_eq!(obs.subject, "p1");
}

#[test]
fn test_ties_go_to_first_inserted() {
    let t = timeline([
        obs("WEIGHT", 70.0, days_ago(5)),
        obs("WEIGHT", 71.0, days_ago(5)),
    ]);
    assert_eq!(numbers(&eval_ok(&Criteria::reference("WEIGHT").last(), &t)), vec![70.0]);
    assert_eq!(numbers(&eval_ok(&Criteria::reference("WEIGHT").first(), &t)), vec![70.0]);
}

#[test]
fn test_last_n_most_recent_first() {
    let result = eval_ok(&Criteria::reference("CD4 COUNT").last_n(2), &cd4_timeline());
    assert_eq!(numbers(&result), vec![150.0, 180.0]);

    let result = eval_ok(&Criteria::reference("CD4 COUNT").first_n(3), &cd4_timeline());
    assert_eq!(numbers(&result), vec![420.0, 350.0, 180.0]);

    let all = eval_ok(&Criteria::reference("CD4 COUNT").last_n(10), &cd4_timeline());
    assert_eq!(all.len(), 4);

    let none = eval_ok(&Criteria::reference("CD4 COUNT").last_n(0), &cd4_timeline());
    assert_eq!(none, LogicResult::Empty);
}

#[test]
fn test_last_of_filtered_sequence() {
    let criteria = Criteria::reference("CD4 COUNT").gt(300).last();
    assert_eq!(numbers(&eval_ok(&criteria, &cd4_timeline())), vec![350.0]);
}

#[test]
fn test_last_of_scalar_is_type_mismatch() {
    let criteria = Criteria::literal(5).last();
    assert_eq!(
        eval(&criteria, &timeline([])).unwrap_err(),
        EvalError::type_mismatch("Sequence", "Numeric")
    );
}

#[test]
fn test_negative_count_is_rejected() {
    let criteria = Criteria::binary(
        Operator::Last,
        Criteria::reference("CD4 COUNT"),
        Criteria::literal(-1),
    );
    assert!(matches!(
        eval(&criteria, &cd4_timeline()),
        Err(EvalError::TypeMismatch { .. })
    ));
}

// ============================================================================
// Count / Average / Distinct
// ============================================================================

#[test]
fn test_count() {
    assert_eq!(
        eval_ok(&Criteria::reference("CD4 COUNT").count(), &cd4_timeline()),
        LogicResult::numeric(4.0)
    );
    assert_eq!(
        eval_ok(&Criteria::reference("VIRAL LOAD").count(), &cd4_timeline()),
        LogicResult::numeric(0.0)
    );
    assert_eq!(
        eval_ok(&Criteria::reference("CD4 COUNT").lt(200).count().gte(2), &cd4_timeline()),
        LogicResult::boolean(true)
    );
}

#[test]
fn test_average() {
    let average = eval_ok(&Criteria::reference("CD4 COUNT").last_n(2).average(), &cd4_timeline());
    assert_eq!(average, LogicResult::numeric(165.0));

    let empty = eval_ok(&Criteria::reference("VIRAL LOAD").average(), &cd4_timeline());
    assert_eq!(empty, LogicResult::Empty);
}

#[test]
fn test_average_rejects_non_numeric() {
    let t = timeline([obs("NOTES", "note", days_ago(1))]);
    assert_eq!(
        eval(&Criteria::reference("NOTES").average(), &t).unwrap_err(),
        EvalError::type_mismatch("Numeric", "Text")
    );
}

#[test]
fn test_distinct_keeps_first_occurrence() {
    let t = timeline([
        obs("REGIMEN", Code::new("AZT"), days_ago(90)),
        obs("REGIMEN", Code::new("TDF"), days_ago(60)),
        obs("REGIMEN", Code::new("AZT"), days_ago(30)),
    ]);
    let distinct = eval_ok(&Criteria::reference("REGIMEN").distinct(), &t);
    assert_eq!(distinct.len(), 2);
    let times: Vec<_> = distinct.items().iter().map(|i| i.effective).collect();
    assert_eq!(times, vec![Some(days_ago(90)), Some(days_ago(60))]);

    let latest_distinct = eval_ok(&Criteria::reference("REGIMEN").distinct().last(), &t);
    assert_eq!(latest_distinct.effective_time(), Some(days_ago(60)));
}
