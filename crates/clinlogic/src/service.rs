//! Query and rule service
//!
//! [`LogicService`] is the entry point for callers that work with query text and rule
//! definitions rather than hand-built criteria trees.

use chrono::{DateTime, Utc};
use clinlogic_ast::{Criteria, Rule, RuleParameterInfo};
use clinlogic_diagnostics::{LOGIC0104, LOGIC0205, LogicError, Result};
use clinlogic_eval::{
    EngineConfig, EvalError, EvalOptions, EvalResult, EvaluationContext, LogicEngine, LogicResult,
    ObservationRetriever, RetrieveError, RuleRegistry, Timeline, materialize, materialize_cohort,
};
use clinlogic_types::Value;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A rule as written in a rules file, with its criteria in query form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub token: String,
    pub query: String,
    #[serde(default)]
    pub parameters: Vec<RuleParameterInfo>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleDefinition {
    pub fn new(token: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            query: query.into(),
            parameters: Vec::new(),
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_parameter(mut self, parameter: RuleParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Parse the query and build the rule
    pub fn to_rule(&self) -> Result<Rule> {
        let criteria = clinlogic_parser::parse(&self.query)?;
        criteria
            .validate()
            .map_err(|e| LogicError::from(EvalError::from(e)))?;
        let mut rule = Rule::new(&self.token, criteria);
        rule.parameters = self.parameters.clone();
        rule.tags = self.tags.iter().cloned().collect();
        rule.description = self.description.clone();
        Ok(rule)
    }

    /// Read a JSON list of definitions
    pub fn from_json(text: &str) -> Result<Vec<Self>> {
        serde_json::from_str(text).map_err(|e| {
            LogicError::rule(LOGIC0104, format!("Invalid rule definitions: {}", e), None)
        })
    }
}

/// Parses queries, manages registered rules and evaluates them for subjects
#[derive(Debug, Clone, Default)]
pub struct LogicService {
    engine: LogicEngine,
}

impl LogicService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: LogicEngine::with_config(config),
        }
    }

    /// Share a rule registry with other services or engines
    pub fn with_registry(mut self, registry: Arc<RuleRegistry>) -> Self {
        self.engine = self.engine.with_registry(registry);
        self
    }

    pub fn engine(&self) -> &LogicEngine {
        &self.engine
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.engine.registry()
    }

    /// Register rule definitions, replacing rules with the same token.
    ///
    /// Every definition is parsed and validated before any is registered, so a file
    /// with one bad rule registers nothing.
    pub fn load_rules(&self, definitions: &[RuleDefinition]) -> Result<usize> {
        let rules = definitions
            .iter()
            .map(|d| d.to_rule().map_err(|e| in_rule(e, &d.token)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.registry().add_rules(rules)?)
    }

    pub fn load_rules_json(&self, text: &str) -> Result<usize> {
        self.load_rules(&RuleDefinition::from_json(text)?)
    }

    /// Parse and evaluate one query for a subject
    pub fn eval_query(
        &self,
        query: &str,
        timeline: &Timeline,
        options: &EvalOptions,
    ) -> Result<LogicResult> {
        let criteria = clinlogic_parser::parse(query)?;
        Ok(self.evaluate(&criteria, timeline, options)?)
    }

    /// Parse and evaluate several queries for a subject, keyed by query text.
    ///
    /// Parse failures are reported together before anything is evaluated. A query
    /// repeated in `queries` is evaluated once.
    pub fn eval_queries(
        &self,
        queries: &[&str],
        timeline: &Timeline,
        options: &EvalOptions,
    ) -> Result<IndexMap<String, LogicResult>> {
        let queries: IndexSet<&str> = queries.iter().copied().collect();
        let parsed = clinlogic_parser::parse_all(queries.iter().copied())?;
        let mut ctx = self.context(options);
        let named = queries.iter().copied().zip(parsed.iter());
        Ok(self.engine.evaluate_all(named, timeline, &mut ctx)?)
    }

    /// Evaluate a registered rule for a subject
    pub fn eval_rule(
        &self,
        token: &str,
        timeline: &Timeline,
        args: &IndexMap<String, Value>,
        now: Option<DateTime<Utc>>,
    ) -> Result<LogicResult> {
        Ok(self.engine.eval_rule(token, timeline, args, now)?)
    }

    pub fn evaluate(
        &self,
        criteria: &Criteria,
        timeline: &Timeline,
        options: &EvalOptions,
    ) -> EvalResult<LogicResult> {
        let mut ctx = self.context(options);
        self.engine.evaluate(criteria, timeline, &mut ctx)
    }

    /// Concepts a criteria tree reads, following references into registered rules
    pub fn referenced_concepts(&self, criteria: &Criteria) -> Vec<String> {
        let mut concepts = IndexSet::new();
        let mut visited = IndexSet::new();
        self.collect_concepts(criteria, &mut concepts, &mut visited);
        concepts.into_iter().collect()
    }

    fn collect_concepts(
        &self,
        criteria: &Criteria,
        concepts: &mut IndexSet<String>,
        visited: &mut IndexSet<String>,
    ) {
        for reference in criteria.references() {
            match self.registry().find(&reference.token) {
                Some(rule) => {
                    if visited.insert(reference.token.clone()) {
                        self.collect_concepts(&rule.criteria, concepts, visited);
                    }
                }
                None => {
                    concepts.insert(reference.token.clone());
                }
            }
        }
    }

    /// Fetch a subject's data through `retriever`, then evaluate
    pub async fn eval_subject(
        &self,
        criteria: &Criteria,
        retriever: &dyn ObservationRetriever,
        subject: &str,
        options: &EvalOptions,
    ) -> Result<LogicResult> {
        let concepts = self.referenced_concepts(criteria);
        let timeline = materialize(retriever, subject, &concepts)
            .await
            .map_err(retrieve_failed)?;
        Ok(self.evaluate(criteria, &timeline, options)?)
    }

    /// Fetch every subject the retriever holds, then evaluate each.
    ///
    /// Retrieval failures abort the whole run; evaluation failures are reported per
    /// subject.
    pub async fn eval_cohort(
        &self,
        criteria: &Criteria,
        retriever: &dyn ObservationRetriever,
        options: &EvalOptions,
    ) -> Result<IndexMap<String, EvalResult<LogicResult>>> {
        let subjects = retriever.subjects().await.map_err(retrieve_failed)?;
        let concepts = self.referenced_concepts(criteria);
        let timelines = materialize_cohort(retriever, &subjects, &concepts)
            .await
            .map_err(retrieve_failed)?;
        Ok(self.engine.evaluate_cohort(criteria, &timelines, options))
    }

    fn context(&self, options: &EvalOptions) -> EvaluationContext {
        self.engine
            .context(options.now)
            .with_parameters(options.parameters.clone())
    }
}

fn retrieve_failed(e: RetrieveError) -> LogicError {
    LogicError::evaluation(LOGIC0205, e.to_string())
}

/// Name the rule a parse failure came from
fn in_rule(error: LogicError, token: &str) -> LogicError {
    match error {
        LogicError::Parse { code, message, .. } | LogicError::Rule { code, message, token: None } => {
            LogicError::rule(code, message, Some(token.to_string()))
        }
        other => other,
    }
}
