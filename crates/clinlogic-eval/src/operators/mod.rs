//! Operator implementations
//!
//! Each module adds an `impl LogicEngine` block for one operator family:
//! - Logical operators (AND, OR, NOT)
//! - Comparison operators (=, >, >=, <, <=, CONTAINS)
//! - Temporal operators (BEFORE, AFTER, WITHIN, AS OF)
//! - Existence operators (EXISTS, NOT EXISTS)
//! - Aggregation operators (LAST, FIRST, COUNT, AVERAGE, DISTINCT)

pub mod aggregate;
pub mod comparison;
pub mod existence;
pub mod logical;
pub mod temporal;

pub use comparison::compare_values;

use crate::error::{EvalError, EvalResult};
use crate::result::{LogicResult, ResultItem};
use chrono::{DateTime, Utc};
use clinlogic_types::Value;

/// The value of a right-hand operand; `None` when the operand is empty or null
pub(crate) fn single_value(result: &LogicResult) -> EvalResult<Option<Value>> {
    match result {
        LogicResult::Empty => Ok(None),
        LogicResult::Item(item) => Ok(Some(item.to_value()).filter(|v| !v.is_null())),
        LogicResult::Sequence(_) => Err(EvalError::type_mismatch("single value", "Sequence")),
    }
}

/// The time of a right-hand operand; `None` when the operand is empty
pub(crate) fn single_time(result: &LogicResult) -> EvalResult<Option<DateTime<Utc>>> {
    match result {
        LogicResult::Empty => Ok(None),
        LogicResult::Item(item) => timed(item).map(Some),
        LogicResult::Sequence(_) => Err(EvalError::type_mismatch("Datetime", "Sequence")),
    }
}

pub(crate) fn timed(item: &ResultItem) -> EvalResult<DateTime<Utc>> {
    item.time()
        .ok_or_else(|| EvalError::type_mismatch("time-qualified value", item.value.type_name()))
}

/// Apply a condition to a left operand.
///
/// A single item becomes a boolean carrying the item's time; a sequence is filtered
/// to the items satisfying the condition.
pub(crate) fn select(
    result: LogicResult,
    mut condition: impl FnMut(&ResultItem) -> EvalResult<bool>,
) -> EvalResult<LogicResult> {
    match result {
        LogicResult::Empty => Ok(LogicResult::Empty),
        LogicResult::Item(item) => Ok(LogicResult::boolean_at(condition(&item)?, item.time())),
        LogicResult::Sequence(items) => {
            let mut kept = Vec::with_capacity(items.len());
            for item in items {
                if condition(&item)? {
                    kept.push(item);
                }
            }
            Ok(LogicResult::sequence(kept))
        }
    }
}
