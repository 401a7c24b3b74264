//! Aggregation Operators
//!
//! Implements: Last, First, Count, Average, Distinct

use super::single_value;
use crate::context::EvaluationContext;
use crate::engine::LogicEngine;
use crate::error::{EvalError, EvalResult};
use crate::result::{LogicResult, ResultItem};
use crate::timeline::Timeline;
use chrono::{DateTime, Utc};
use clinlogic_ast::{Criteria, Operator};
use clinlogic_types::Value;
use std::cmp::Ordering;

impl LogicEngine {
    /// Evaluate LAST / FIRST.
    ///
    /// Without a count, selects the item with the latest (earliest) effective time;
    /// of items sharing that time the first inserted wins. With a count `n`, returns
    /// the `n` latest items most recent first (earliest items, oldest first). Untimed
    /// items rank behind timed ones.
    pub fn eval_last_first(
        &self,
        operator: Operator,
        operand: &Criteria,
        count: Option<&Criteria>,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let result = self.evaluate(operand, timeline, ctx)?;
        let count = match count {
            Some(c) => Some(self.eval_count_operand(c, timeline, ctx)?),
            None => None,
        };
        let latest = operator == Operator::Last;

        let items = match result {
            LogicResult::Empty => return Ok(LogicResult::Empty),
            LogicResult::Item(item) => {
                return Err(EvalError::type_mismatch("Sequence", item.value.type_name()));
            }
            LogicResult::Sequence(items) => items,
        };

        match count {
            None => Ok(select_extreme(&items, latest)
                .cloned()
                .map_or(LogicResult::Empty, LogicResult::Item)),
            Some(n) => {
                let mut ordered: Vec<&ResultItem> = items.iter().collect();
                // Stable sort keeps insertion order among equal times
                ordered.sort_by(|a, b| rank(a.time(), b.time(), latest));
                Ok(LogicResult::sequence(ordered.into_iter().take(n).cloned().collect()))
            }
        }
    }

    /// Evaluate COUNT: the number of items, as a numeric
    pub fn eval_count(
        &self,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let result = self.evaluate(operand, timeline, ctx)?;
        Ok(LogicResult::numeric(result.len() as f64))
    }

    /// Evaluate AVERAGE: arithmetic mean of numeric items
    pub fn eval_average(
        &self,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let result = self.evaluate(operand, timeline, ctx)?;
        if result.is_empty() {
            return Ok(LogicResult::Empty);
        }

        let mut sum = 0.0;
        for item in result.items() {
            let value = item.to_value();
            sum += value
                .as_number()
                .ok_or_else(|| EvalError::type_mismatch("Numeric", value.value_type().name()))?;
        }
        Ok(LogicResult::numeric(sum / result.len() as f64))
    }

    /// Evaluate DISTINCT: drop items whose value repeats an earlier item's value
    pub fn eval_distinct(
        &self,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let result = self.evaluate(operand, timeline, ctx)?;
        let LogicResult::Sequence(items) = result else {
            return Ok(result);
        };

        let mut seen: Vec<Value> = Vec::new();
        let mut kept = Vec::new();
        for item in items {
            let value = item.to_value();
            if !seen.contains(&value) {
                seen.push(value);
                kept.push(item);
            }
        }
        Ok(LogicResult::sequence(kept))
    }

    fn eval_count_operand(
        &self,
        count: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<usize> {
        let result = self.evaluate(count, timeline, ctx)?;
        match single_value(&result)?.as_ref().and_then(Value::as_number) {
            Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
            _ => Err(EvalError::type_mismatch("non-negative Integer", result.type_name())),
        }
    }
}

/// The item with the latest (or earliest) time; the first item when none is timed
fn select_extreme(items: &[ResultItem], latest: bool) -> Option<&ResultItem> {
    let mut best: Option<&ResultItem> = None;
    for item in items {
        let replace = match best {
            None => true,
            Some(current) => rank(item.time(), current.time(), latest) == Ordering::Less,
        };
        if replace {
            best = Some(item);
        }
    }
    best
}

/// Order in which items are picked: preferred times first, untimed last
fn rank(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>, latest: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if latest => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ResultValue;
    use chrono::TimeZone;

    fn at(d: u32, v: f64) -> ResultItem {
        ResultItem::at(
            ResultValue::Numeric(v),
            Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_select_extreme_ties_keep_first() {
        let items = vec![at(1, 1.0), at(3, 2.0), at(3, 3.0), at(2, 4.0)];
        assert_eq!(select_extreme(&items, true), Some(&items[1]));
        assert_eq!(select_extreme(&items, false), Some(&items[0]));
    }

    #[test]
    fn test_select_extreme_prefers_timed() {
        let untimed = ResultItem::new(ResultValue::Numeric(9.0));
        let items = vec![untimed.clone(), at(1, 1.0)];
        assert_eq!(select_extreme(&items, true), Some(&items[1]));
        assert_eq!(select_extreme(&[untimed.clone()], true), Some(&untimed));
        assert_eq!(select_extreme(&[], false), None);
    }
}
