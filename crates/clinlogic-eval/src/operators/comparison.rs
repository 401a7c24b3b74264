//! Comparison Operators
//!
//! Implements: Equals, Gt, Gte, Lt, Lte, Contains
//!
//! Integers and numerics compare as numbers. Text, datetimes and durations are
//! ordered; codes and booleans support equality only. A sequence on the left is
//! filtered to the matching items.

use super::{select, single_value};
use crate::context::EvaluationContext;
use crate::engine::LogicEngine;
use crate::error::{EvalError, EvalResult};
use crate::result::LogicResult;
use crate::timeline::Timeline;
use clinlogic_ast::{Criteria, Operator};
use clinlogic_types::Value;
use std::cmp::Ordering;

impl LogicEngine {
    /// Evaluate =, >, >=, <, <=
    pub fn eval_comparison(
        &self,
        operator: Operator,
        left: &Criteria,
        right: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let lhs = self.evaluate(left, timeline, ctx)?;
        let rhs = self.evaluate(right, timeline, ctx)?;
        let Some(target) = single_value(&rhs)? else {
            return Ok(LogicResult::Empty);
        };
        select(lhs, |item| compare_values(operator, &item.to_value(), &target))
    }

    /// Evaluate CONTAINS: substring test on text, membership test otherwise
    pub fn eval_contains(
        &self,
        left: &Criteria,
        right: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let lhs = self.evaluate(left, timeline, ctx)?;
        let rhs = self.evaluate(right, timeline, ctx)?;
        let Some(target) = single_value(&rhs)? else {
            return Ok(LogicResult::boolean(false));
        };

        match &lhs {
            LogicResult::Empty => Ok(LogicResult::boolean(false)),
            LogicResult::Item(item) => match (item.to_value(), &target) {
                (Value::Text(text), Value::Text(needle)) => {
                    Ok(LogicResult::boolean_at(text.contains(needle.as_str()), item.time()))
                }
                (Value::Text(_), other) => {
                    Err(EvalError::type_mismatch("Text", other.value_type().name()))
                }
                (value, _) => Ok(LogicResult::boolean_at(is_member(&value, &target), item.time())),
            },
            LogicResult::Sequence(items) => {
                match items.iter().find(|item| is_member(&item.to_value(), &target)) {
                    Some(found) => Ok(LogicResult::boolean_at(true, found.time())),
                    None => Ok(LogicResult::boolean(false)),
                }
            }
        }
    }
}

/// Compare two values with a comparison operator.
///
/// A null left value never satisfies a comparison. Operands of unrelated types are a
/// type mismatch.
pub fn compare_values(operator: Operator, left: &Value, right: &Value) -> EvalResult<bool> {
    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(false),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::Datetime(l), Value::Datetime(r)) => Some(l.cmp(r)),
        (Value::Duration(l), Value::Duration(r)) => l.partial_cmp(r),
        (Value::Coded(l), Value::Coded(r)) => return equality_only(operator, l.matches(r), "Coded"),
        (Value::Boolean(l), Value::Boolean(r)) => return equality_only(operator, l == r, "Boolean"),
        _ => match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => {
                return Err(EvalError::type_mismatch(
                    left.value_type().name(),
                    right.value_type().name(),
                ));
            }
        },
    };

    // NaN is unordered
    let Some(ordering) = ordering else {
        return Ok(false);
    };

    match operator {
        Operator::Equals => Ok(ordering == Ordering::Equal),
        Operator::Gt => Ok(ordering == Ordering::Greater),
        Operator::Gte => Ok(ordering != Ordering::Less),
        Operator::Lt => Ok(ordering == Ordering::Less),
        Operator::Lte => Ok(ordering != Ordering::Greater),
        other => Err(EvalError::internal(format!("{} is not a comparison", other))),
    }
}

fn equality_only(operator: Operator, equal: bool, type_name: &str) -> EvalResult<bool> {
    if operator.is_equality() {
        Ok(equal)
    } else {
        Err(EvalError::type_mismatch("ordered value", type_name))
    }
}

/// Membership test for CONTAINS; values of unrelated types are simply not members.
/// A coded value matches text equal to its code.
fn is_member(value: &Value, target: &Value) -> bool {
    match (value, target) {
        (Value::Coded(code), Value::Text(text)) => code.code == *text,
        _ => compare_values(Operator::Equals, value, target).unwrap_or(false),
    }
}
