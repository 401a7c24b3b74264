//! Clinical logic evaluation engine
//!
//! The engine walks a [`Criteria`] tree by recursive descent, threading one mutable
//! [`EvaluationContext`] through the walk. Operator semantics live in the
//! [`operators`](crate::operators) modules as further `impl LogicEngine` blocks.

use crate::binding::{ParameterBindings, bind};
use crate::context::{EngineConfig, EvaluationContext};
use crate::error::{EvalError, EvalResult};
use crate::registry::RuleRegistry;
use crate::result::{LogicResult, ResultItem, ResultValue};
use crate::timeline::Timeline;
use chrono::{DateTime, Utc};
use clinlogic_ast::{Criteria, DataReference, Operator};
use clinlogic_types::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// Options for evaluating one criteria tree across many subjects
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// Reference time; the configured default or wall-clock now when unset
    pub now: Option<DateTime<Utc>>,
    /// Parameters visible to the criteria
    pub parameters: ParameterBindings,
}

impl EvalOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Some(now),
            ..Self::default()
        }
    }

    pub fn with_parameters(mut self, parameters: ParameterBindings) -> Self {
        self.parameters = parameters;
        self
    }
}

/// The logic evaluation engine
///
/// Holds the rule registry used to resolve references to other rules. The engine is
/// `Send + Sync` and can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct LogicEngine {
    registry: Arc<RuleRegistry>,
    config: EngineConfig,
}

impl LogicEngine {
    /// Create an engine with an empty registry and default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            registry: Arc::default(),
            config,
        }
    }

    /// Use a shared registry
    pub fn with_registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A fresh context at `now`, or the configured default reference time
    pub fn context(&self, now: Option<DateTime<Utc>>) -> EvaluationContext {
        EvaluationContext::from_config(&self.config, now)
    }

    /// Evaluate a registered rule for one subject.
    ///
    /// `args` are bound to the rule's declared parameters before evaluation starts.
    pub fn eval_rule(
        &self,
        token: &str,
        timeline: &Timeline,
        args: &IndexMap<String, Value>,
        now: Option<DateTime<Utc>>,
    ) -> EvalResult<LogicResult> {
        let rule = self.registry.get_rule(token)?;
        let bindings = bind(&rule.parameters, args)?;
        let mut ctx = self.context(now).with_parameters(bindings);
        log::debug!("evaluating rule '{}' for subject '{}'", token, timeline.subject());
        self.evaluate(&rule.criteria, timeline, &mut ctx)
    }

    /// Evaluate several named criteria against one subject, stopping at the first error
    pub fn evaluate_all<'a>(
        &self,
        criteria: impl IntoIterator<Item = (&'a str, &'a Criteria)>,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<IndexMap<String, LogicResult>> {
        let mut results = IndexMap::new();
        for (name, c) in criteria {
            results.insert(name.to_string(), self.evaluate(c, timeline, ctx)?);
        }
        Ok(results)
    }

    /// Evaluate one criteria tree for every subject.
    ///
    /// Each subject gets its own context; a failure for one subject does not affect the
    /// others.
    pub fn evaluate_cohort(
        &self,
        criteria: &Criteria,
        timelines: &[Timeline],
        options: &EvalOptions,
    ) -> IndexMap<String, EvalResult<LogicResult>> {
        let now = options.now.unwrap_or_else(|| self.config.now());
        timelines
            .iter()
            .map(|timeline| {
                let mut ctx = self
                    .context(Some(now))
                    .with_parameters(options.parameters.clone());
                let result = self.evaluate(criteria, timeline, &mut ctx);
                if let Err(e) = &result {
                    log::debug!("evaluation failed for subject '{}': {}", timeline.subject(), e);
                }
                (timeline.subject().to_string(), result)
            })
            .collect()
    }

    /// Main evaluation dispatcher
    pub fn evaluate(
        &self,
        criteria: &Criteria,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        if !ctx.enter_recursion() {
            return Err(EvalError::RecursionLimit {
                depth: ctx.max_depth(),
            });
        }

        let result = match criteria {
            Criteria::Literal { value } => Ok(LogicResult::from_value(value.clone())),
            Criteria::Reference(reference) => self.eval_reference(reference, timeline, ctx),
            Criteria::Parameter { name } => ctx
                .parameter(name)
                .cloned()
                .map(LogicResult::from_value)
                .ok_or_else(|| EvalError::unknown_parameter(name)),
            Criteria::ReferenceTime => Ok(LogicResult::item(ResultItem::new(
                ResultValue::Datetime(ctx.reference_time()),
            ))),
            Criteria::Unary { operator, .. }
            | Criteria::Binary { operator, .. }
            | Criteria::Nary { operator, .. } => {
                self.eval_operator(*operator, &criteria.operands(), timeline, ctx)
            }
        };

        ctx.exit_recursion();
        result
    }

    fn eval_operator(
        &self,
        operator: Operator,
        operands: &[&Criteria],
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        match (operator, operands) {
            // === Logical ===
            (Operator::And, [_, ..]) => self.eval_and(operands, timeline, ctx),
            (Operator::Or, [_, ..]) => self.eval_or(operands, timeline, ctx),
            (Operator::Not, [operand]) => self.eval_not(operand, timeline, ctx),

            // === Comparison ===
            (
                Operator::Equals | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte,
                [left, right],
            ) => self.eval_comparison(operator, left, right, timeline, ctx),
            (Operator::Contains, [left, right]) => self.eval_contains(left, right, timeline, ctx),

            // === Temporal ===
            (Operator::Before | Operator::After, [left, right]) => {
                self.eval_before_after(operator, left, right, timeline, ctx)
            }
            (Operator::Within, [left, right]) => self.eval_within(left, right, timeline, ctx),
            (Operator::AsOf, [left, right]) => self.eval_as_of(left, right, timeline, ctx),

            // === Existence ===
            (Operator::Exists | Operator::NotExists, [operand]) => {
                self.eval_exists(operator, operand, timeline, ctx)
            }

            // === Aggregation ===
            (Operator::Last | Operator::First, [operand]) => {
                self.eval_last_first(operator, operand, None, timeline, ctx)
            }
            (Operator::Last | Operator::First, [operand, count]) => {
                self.eval_last_first(operator, operand, Some(*count), timeline, ctx)
            }
            (Operator::Count, [operand]) => self.eval_count(operand, timeline, ctx),
            (Operator::Average, [operand]) => self.eval_average(operand, timeline, ctx),
            (Operator::Distinct, [operand]) => self.eval_distinct(operand, timeline, ctx),

            (operator, operands) => Err(EvalError::ArityMismatch {
                operator,
                expected: operator.arity(),
                found: operands.len(),
            }),
        }
    }

    /// Resolve a token: registered rules first, then the subject's concepts
    fn eval_reference(
        &self,
        reference: &DataReference,
        timeline: &Timeline,
        ctx: &mut EvaluationContext,
    ) -> EvalResult<LogicResult> {
        if let Some(rule) = self.registry.find(&reference.token) {
            let bindings = bind(&rule.parameters, &reference.args)?;
            log::trace!("invoking rule '{}' with {} parameter(s)", rule.token, bindings.len());
            return ctx.scoped_parameters(bindings, |ctx| {
                self.evaluate(&rule.criteria, timeline, ctx)
            });
        }

        if !reference.args.is_empty() {
            log::warn!(
                "'{}' is not a rule; ignoring {} argument(s)",
                reference.token,
                reference.args.len()
            );
        }

        let observations = timeline
            .observations(&reference.token)
            .ok_or_else(|| EvalError::unknown_reference(&reference.token))?;
        let items = observations
            .iter()
            .filter(|obs| ctx.in_window(obs.effective_at))
            .cloned()
            .map(ResultItem::observation)
            .collect();
        Ok(LogicResult::sequence(items))
    }
}
