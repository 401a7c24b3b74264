//! Existence Operator Tests
//!
//! Tests for: Exists, NotExists

use super::common::{cd4_timeline, eval, eval_ok, timeline};
use clinlogic_ast::Criteria;
use clinlogic_eval::{EvalError, LogicResult};
use rstest::rstest;

#[rstest]
#[case(Criteria::reference("CD4 COUNT").exists(), true)]
#[case(Criteria::reference("CD4 COUNT").not_exists(), false)]
#[case(Criteria::reference("VIRAL LOAD").exists(), false)]
#[case(Criteria::reference("VIRAL LOAD").not_exists(), true)]
#[case(Criteria::reference("CD4 COUNT").lt(100).exists(), false)]
#[case(Criteria::reference("CD4 COUNT").lt(200).exists(), true)]
fn test_exists(#[case] criteria: Criteria, #[case] expected: bool) {
    assert_eq!(eval_ok(&criteria, &cd4_timeline()), LogicResult::boolean(expected));
}

#[test]
fn test_last_of_empty_is_empty_and_does_not_exist() {
    let last = Criteria::reference("VIRAL LOAD").last();
    assert_eq!(eval_ok(&last, &cd4_timeline()), LogicResult::Empty);
    assert_eq!(eval_ok(&last.exists(), &cd4_timeline()).as_boolean(), Some(false));
}

#[test]
fn test_unknown_reference_counts_as_absent() {
    let unknown = Criteria::reference("NEVER RECORDED");
    assert_eq!(eval_ok(&unknown.clone().exists(), &timeline([])).as_boolean(), Some(false));
    assert_eq!(eval_ok(&unknown.clone().not_exists(), &timeline([])).as_boolean(), Some(true));

    // Only the existence operators absorb the error
    assert_eq!(
        eval(&unknown.last(), &timeline([])).unwrap_err(),
        EvalError::unknown_reference("NEVER RECORDED")
    );
}

#[test]
fn test_false_item_still_exists() {
    let criteria = Criteria::literal(false).exists();
    assert_eq!(eval_ok(&criteria, &timeline([])).as_boolean(), Some(true));
}
