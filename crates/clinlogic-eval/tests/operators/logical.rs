//! Logical Operator Tests
//!
//! Tests for: And, Or, Not
//! Empty results count as false; anything else that is not boolean is a type error.

use super::common::{cd4_timeline, eval, eval_ok, timeline};
use clinlogic_ast::Criteria;
use clinlogic_eval::{EvalError, LogicResult};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn lit(b: bool) -> Criteria {
    Criteria::literal(b)
}

/// A reference that fails if it is ever evaluated
fn poison() -> Criteria {
    Criteria::reference("NOT A CONCEPT")
}

// ============================================================================
// And / Or
// ============================================================================

#[test]
fn test_and() {
    let empty = timeline([]);
    assert_eq!(eval_ok(&lit(true).and(lit(true)), &empty), LogicResult::boolean(true));
    assert_eq!(
        eval_ok(&lit(true).and(lit(true)).and(lit(false)), &empty),
        LogicResult::boolean(false)
    );
}

#[test]
fn test_and_short_circuits_on_first_false() {
    let criteria = lit(true).and(lit(false)).and(poison());
    assert_eq!(eval_ok(&criteria, &timeline([])), LogicResult::boolean(false));

    // Without the false operand the poison is reached
    assert!(eval(&lit(true).and(poison()), &timeline([])).is_err());
}

#[test]
fn test_or_short_circuits_on_first_true() {
    let criteria = lit(false).or(lit(true)).or(poison());
    assert_eq!(eval_ok(&criteria, &timeline([])), LogicResult::boolean(true));
    assert_eq!(eval_ok(&lit(false).or(lit(false)), &timeline([])), LogicResult::boolean(false));
}

#[test]
fn test_empty_counts_as_false() {
    let timeline = cd4_timeline();
    let no_load = Criteria::reference("VIRAL LOAD").last();
    assert_eq!(eval_ok(&no_load.clone().or(lit(false)), &timeline), LogicResult::boolean(false));
    assert_eq!(eval_ok(&no_load.not(), &timeline), LogicResult::boolean(true));
}

#[test]
fn test_non_boolean_operand_is_type_mismatch() {
    let err = eval(&Criteria::literal(5).and(lit(true)), &timeline([])).unwrap_err();
    assert_eq!(err, EvalError::type_mismatch("Boolean", "Numeric"));

    let err = eval(&Criteria::reference("CD4 COUNT").not(), &cd4_timeline()).unwrap_err();
    assert_eq!(err, EvalError::type_mismatch("Boolean", "Sequence"));
}

// ============================================================================
// Not
// ============================================================================

#[test]
fn test_not_keeps_operand_time() {
    let timeline = cd4_timeline();
    let low = Criteria::reference("CD4 COUNT").last().lt(200);
    let low_result = eval_ok(&low, &timeline);
    let not_low = eval_ok(&low.not(), &timeline);
    assert_eq!(not_low.as_boolean(), Some(false));
    assert_eq!(not_low.effective_time(), low_result.effective_time());
}

proptest! {
    #[test]
    fn prop_double_negation(b in any::<bool>()) {
        let once = eval_ok(&lit(b), &timeline([]));
        let twice = eval_ok(&lit(b).not().not(), &timeline([]));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_and_matches_all(values in proptest::collection::vec(any::<bool>(), 1..8)) {
        let criteria = Criteria::nary(
            clinlogic_ast::Operator::And,
            values.iter().copied().map(lit).collect(),
        );
        let expected = values.iter().all(|b| *b);
        prop_assert_eq!(eval_ok(&criteria, &timeline([])).as_boolean(), Some(expected));
    }
}
