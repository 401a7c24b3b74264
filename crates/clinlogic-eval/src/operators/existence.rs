//! Existence Operators
//!
//! Implements: Exists, NotExists

use crate::context::EvaluationContext;
use crate::engine::LogicEngine;
use crate::error::{EvalError, EvalResult};
use crate::result::LogicResult;
use crate::timeline::Timeline;
use clinlogic_ast::{Criteria, Operator};

impl LogicEngine {
    /// Evaluate EXISTS / NOT EXISTS over the items visible in the current window.
    ///
    /// An unknown data reference inside the operand counts as absence.
    pub fn eval_exists(
        &self,
        operator: Operator,
        operand: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        let found = match self.evaluate(operand, timeline, ctx) {
            Ok(result) => result.exists(),
            Err(EvalError::UnknownDataReference { token }) => {
                log::debug!("'{}' is unknown; treating as absent", token);
                false
            }
            Err(e) => return Err(e),
        };
        let value = match operator {
            Operator::NotExists => !found,
            _ => found,
        };
        Ok(LogicResult::boolean(value))
    }
}
