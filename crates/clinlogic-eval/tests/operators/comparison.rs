//! Comparison Operator Tests
//!
//! Tests for: Equals, Gt, Gte, Lt, Lte, Contains

use super::common::{cd4_timeline, days_ago, eval, eval_ok, numbers, obs, timeline};
use clinlogic_ast::{Criteria, Operator};
use clinlogic_eval::{EvalError, LogicResult};
use clinlogic_types::{Code, Value};
use pretty_assertions::assert_eq;
use rstest::rstest;

// ============================================================================
// Scalar operands
// ============================================================================

#[rstest]
#[case(Criteria::literal(3).equal_to(3.0), true)]
#[case(Criteria::literal(2.5).gt(2), true)]
#[case(Criteria::literal(2).gte(2), true)]
#[case(Criteria::literal("abc").lt("abd"), true)]
#[case(Criteria::literal(7).lte(6), false)]
#[case(Criteria::literal(true).equal_to(true), true)]
#[case(Criteria::literal(Code::new("YES")).equal_to(Code::new("NO")), false)]
fn test_scalar_comparisons(#[case] criteria: Criteria, #[case] expected: bool) {
    assert_eq!(eval_ok(&criteria, &timeline([])), LogicResult::boolean(expected));
}

#[test]
fn test_scalar_result_carries_left_time() {
    let result = eval_ok(&Criteria::reference("CD4 COUNT").last().lt(200), &cd4_timeline());
    assert_eq!(result, LogicResult::boolean_at(true, Some(days_ago(10))));
}

#[test]
fn test_mixed_types_are_rejected() {
    let err = eval(&Criteria::literal("5").gt(3), &timeline([])).unwrap_err();
    assert_eq!(err, EvalError::type_mismatch("Text", "Numeric"));
}

#[test]
fn test_coded_values_are_unordered() {
    let criteria = Criteria::literal(Code::new("A"))
        .compare(Operator::Lt, Criteria::literal(Code::new("B")));
    assert!(matches!(
        eval(&criteria, &timeline([])),
        Err(EvalError::TypeMismatch { .. })
    ));
}

// ============================================================================
// Sequence operands
// ============================================================================

#[test]
fn test_sequence_is_filtered_in_time_order() {
    let result = eval_ok(&Criteria::reference("CD4 COUNT").lt(200), &cd4_timeline());
    assert_eq!(numbers(&result), vec![180.0, 150.0]);
}

#[test]
fn test_filter_with_no_match_is_empty() {
    let result = eval_ok(&Criteria::reference("CD4 COUNT").gt(1000), &cd4_timeline());
    assert_eq!(result, LogicResult::Empty);
}

#[test]
fn test_empty_right_operand_yields_empty() {
    let criteria = Criteria::literal(3).compare(Operator::Equals, Criteria::literal(Value::Null));
    assert_eq!(eval_ok(&criteria, &timeline([])), LogicResult::Empty);
}

#[test]
fn test_sequence_right_operand_is_rejected() {
    let criteria = Criteria::literal(3).compare(Operator::Equals, Criteria::reference("CD4 COUNT"));
    assert_eq!(
        eval(&criteria, &cd4_timeline()).unwrap_err(),
        EvalError::type_mismatch("single value", "Sequence")
    );
}

// ============================================================================
// Contains
// ============================================================================

#[test]
fn test_contains_substring() {
    let notes = timeline([obs("NOTES", "persistent fever and cough", days_ago(2))]);
    let fever = Criteria::reference("NOTES").last().contains("fever");
    assert_eq!(eval_ok(&fever, &notes), LogicResult::boolean_at(true, Some(days_ago(2))));

    let rash = Criteria::reference("NOTES").last().contains("rash");
    assert_eq!(eval_ok(&rash, &notes).as_boolean(), Some(false));
}

#[test]
fn test_contains_membership() {
    let problems = timeline([
        obs("PROBLEM LIST", Code::new("TB"), days_ago(30)),
        obs("PROBLEM LIST", Code::new("HIV"), days_ago(20)),
    ]);
    let hiv = Criteria::reference("PROBLEM LIST").contains(Code::new("HIV"));
    assert_eq!(eval_ok(&hiv, &problems), LogicResult::boolean_at(true, Some(days_ago(20))));

    let by_text = Criteria::reference("PROBLEM LIST").contains("TB");
    assert_eq!(eval_ok(&by_text, &problems).as_boolean(), Some(true));

    let malaria = Criteria::reference("PROBLEM LIST").contains(Code::new("MALARIA"));
    assert_eq!(eval_ok(&malaria, &problems), LogicResult::boolean(false));
}

#[test]
fn test_empty_contains_nothing() {
    let criteria = Criteria::reference("VIRAL LOAD").contains(5);
    assert_eq!(eval_ok(&criteria, &cd4_timeline()), LogicResult::boolean(false));
}

#[test]
fn test_text_contains_requires_text() {
    let criteria = Criteria::literal("abc").contains(1);
    assert_eq!(
        eval(&criteria, &timeline([])).unwrap_err(),
        EvalError::type_mismatch("Text", "Numeric")
    );
}
