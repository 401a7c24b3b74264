//! Logical Operators
//!
//! Implements: And, Or, Not
//! Operands must be boolean-valued: a boolean item, or the empty result, which counts
//! as false.

use crate::context::EvaluationContext;
use crate::engine::LogicEngine;
use crate::error::{EvalError, EvalResult};
use crate::result::LogicResult;
use crate::timeline::Timeline;
use clinlogic_ast::Criteria;

impl LogicEngine {
    /// Evaluate AND left to right, stopping at the first false operand
    pub fn eval_and(
        &self,
        operands: &[&Criteria],
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        for operand in operands {
            if !self.eval_truth(operand, timeline, ctx)? {
                return Ok(LogicResult::boolean(false));
            }
        }
        Ok(LogicResult::boolean(true))
    }

    /// Evaluate OR left to right, stopping at the first true operand
    pub fn eval_or(
        &self,
        operands: &[&Criteria],
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        for operand in operands {
            if self.eval_truth(operand, timeline, ctx)? {
                return Ok(LogicResult::boolean(true));
            }
        }
        Ok(LogicResult::boolean(false))
    }

    /// Evaluate NOT; the result keeps the operand's time
    pub fn eval_not(
        &self,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let result = self.evaluate(operand, timeline, ctx)?;
        let value = truth_of(&result)?;
        Ok(LogicResult::boolean_at(!value, result.effective_time()))
    }

    fn eval_truth(
        &self,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<bool> {
        let result = self.evaluate(operand, timeline, ctx)?;
        truth_of(&result)
    }
}

fn truth_of(result: &LogicResult) -> EvalResult<bool> {
    result
        .truth()
        .ok_or_else(|| EvalError::type_mismatch("Boolean", result.type_name()))
}
