//! Temporal Operator Tests
//!
//! Tests for: Before, After, Within, AsOf

use super::common::{cd4_timeline, days_ago, eval, eval_ok, now, numbers, obs, timeline};
use clinlogic_ast::{Criteria, Operator};
use clinlogic_eval::{EvalError, LogicEngine, LogicResult, ParameterBindings};
use clinlogic_types::{Duration, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ============================================================================
// Within
// ============================================================================

#[rstest]
#[case(Duration::days(15.0), true)]
#[case(Duration::days(5.0), false)]
#[case(Duration::days(10.0), true)]
#[case(Duration::days(-15.0), true)]
#[case(Duration::weeks(2.0), true)]
fn test_within_ten_days_ago(#[case] duration: Duration, #[case] expected: bool) {
    let t = timeline([obs("WEIGHT", 70.0, days_ago(10))]);
    let criteria = Criteria::reference("WEIGHT").last().within(duration);
    assert_eq!(eval_ok(&criteria, &t).as_boolean(), Some(expected));
}

#[test]
fn test_within_is_symmetric() {
    let t = timeline([obs("APPOINTMENT", "clinic", days_ago(-3))]);
    let criteria = Criteria::reference("APPOINTMENT").within(Duration::days(5.0));
    assert_eq!(eval_ok(&criteria, &t).len(), 1);
}

#[test]
fn test_within_filters_sequence() {
    let criteria = Criteria::reference("CD4 COUNT").within(Duration::months(2.0));
    assert_eq!(numbers(&eval_ok(&criteria, &cd4_timeline())), vec![180.0, 150.0]);
}

#[test]
fn test_within_parameter_duration() {
    let engine = LogicEngine::new();
    let criteria = Criteria::reference("CD4 COUNT")
        .compare(Operator::Within, Criteria::parameter("window"));

    let mut ctx = engine
        .context(Some(now()))
        .with_parameters(ParameterBindings::new().with("window", Duration::years(1.0)));
    let result = engine.evaluate(&criteria, &cd4_timeline(), &mut ctx).unwrap();
    assert_eq!(numbers(&result), vec![350.0, 180.0, 150.0]);

    let mut ctx = engine
        .context(Some(now()))
        .with_parameters(ParameterBindings::new().with("window", 3));
    assert_eq!(
        engine.evaluate(&criteria, &cd4_timeline(), &mut ctx).unwrap_err(),
        EvalError::type_mismatch("Duration", "Numeric")
    );
}

#[test]
fn test_within_requires_time() {
    let criteria = Criteria::literal(5).within(Duration::days(1.0));
    assert_eq!(
        eval(&criteria, &timeline([])).unwrap_err(),
        EvalError::type_mismatch("time-qualified value", "Numeric")
    );
}

// ============================================================================
// Before / After
// ============================================================================

#[test]
fn test_before_and_after_are_strict() {
    let cutoff = days_ago(40);
    let before = Criteria::reference("CD4 COUNT").before(cutoff);
    let after = Criteria::reference("CD4 COUNT").after(cutoff);
    assert_eq!(numbers(&eval_ok(&before, &cd4_timeline())), vec![420.0, 350.0]);
    assert_eq!(numbers(&eval_ok(&after, &cd4_timeline())), vec![150.0]);
}

#[test]
fn test_before_time_qualified_operand() {
    let t = timeline([
        obs("ADMISSION", "ward 3", days_ago(20)),
        obs("DISCHARGE", "home", days_ago(12)),
    ]);
    let criteria = Criteria::reference("ADMISSION")
        .last()
        .compare(Operator::Before, Criteria::reference("DISCHARGE").last());
    assert_eq!(eval_ok(&criteria, &t), LogicResult::boolean_at(true, Some(days_ago(20))));
}

#[test]
fn test_before_reference_time() {
    let criteria = Criteria::reference("CD4 COUNT")
        .last()
        .compare(Operator::Before, Criteria::now());
    assert_eq!(eval_ok(&criteria, &cd4_timeline()).as_boolean(), Some(true));
}

// ============================================================================
// As Of
// ============================================================================

#[test]
fn test_as_of_narrows_window() {
    let criteria = Criteria::reference("CD4 COUNT").last().as_of(days_ago(50));
    let result = eval_ok(&criteria, &cd4_timeline());
    assert_eq!(numbers(&result), vec![350.0]);
}

#[test]
fn test_as_of_rebinds_reference_time() {
    // 180 was recorded 40 days ago: 10 days before the anchor
    let criteria = Criteria::reference("CD4 COUNT")
        .within(Duration::days(15.0))
        .as_of(days_ago(30));
    assert_eq!(numbers(&eval_ok(&criteria, &cd4_timeline())), vec![180.0]);
}

#[test]
fn test_as_of_before_all_data_is_empty() {
    let criteria = Criteria::reference("CD4 COUNT").exists().as_of(days_ago(1000));
    assert_eq!(eval_ok(&criteria, &cd4_timeline()).as_boolean(), Some(false));
}

#[test]
fn test_as_of_empty_anchor_is_rejected() {
    let criteria = Criteria::reference("CD4 COUNT")
        .compare(Operator::AsOf, Criteria::literal(Value::Null));
    assert_eq!(
        eval(&criteria, &cd4_timeline()).unwrap_err(),
        EvalError::type_mismatch("Datetime", "Empty")
    );
}
