//! Temporal Operators
//!
//! Implements: Before, After, Within, AsOf

use super::{select, single_time, single_value, timed};
use crate::context::EvaluationContext;
use crate::engine::LogicEngine;
use crate::error::{EvalError, EvalResult};
use crate::result::LogicResult;
use crate::timeline::Timeline;
use clinlogic_ast::{Criteria, Operator};
use clinlogic_types::Value;

impl LogicEngine {
    /// Evaluate BEFORE / AFTER, comparing effective times strictly
    pub fn eval_before_after(
        &self,
        operator: Operator,
        left: &Criteria,
        right: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let lhs = self.evaluate(left, timeline, ctx)?;
        let rhs = self.evaluate(right, timeline, ctx)?;
        let Some(anchor) = single_time(&rhs)? else {
            return Ok(LogicResult::Empty);
        };
        let before = operator == Operator::Before;
        select(lhs, |item| {
            let at = timed(item)?;
            Ok(if before { at < anchor } else { at > anchor })
        })
    }

    /// Evaluate WITHIN: effective time no further than the duration from the reference
    /// time, in either direction, bounds included
    pub fn eval_within(
        &self,
        left: &Criteria,
        right: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let lhs = self.evaluate(left, timeline, ctx)?;
        let rhs = self.evaluate(right, timeline, ctx)?;
        let duration = match single_value(&rhs)? {
            None => return Ok(LogicResult::Empty),
            Some(Value::Duration(d)) => d,
            Some(other) => {
                return Err(EvalError::type_mismatch("Duration", other.value_type().name()));
            }
        };

        let reference = ctx.reference_time();
        let limit = duration.abs().in_millis();
        select(lhs, |item| {
            let distance = (reference - timed(item)?).num_milliseconds().unsigned_abs();
            Ok(distance as f64 <= limit)
        })
    }

    /// Evaluate AS OF: the operand sees the anchor as its reference time and only the
    /// observations effective at or before it
    pub fn eval_as_of(
        &self,
        left: &Criteria,
        right: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let rhs = self.evaluate(right, timeline, ctx)?;
        let anchor = single_time(&rhs)?
            .ok_or_else(|| EvalError::type_mismatch("Datetime", rhs.type_name()))?;
        log::trace!("evaluating as of {}", anchor);
        ctx.as_of(anchor, |ctx| self.evaluate(left, timeline, ctx))
    }
}
