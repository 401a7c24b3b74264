//! Evaluation context and engine configuration

use crate::binding::ParameterBindings;
use chrono::{DateTime, Utc};
use clinlogic_types::Value;
use serde::{Deserialize, Serialize};

/// Default bound on nested evaluation depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Engine configuration, usually loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting of criteria and rule references
    pub max_depth: usize,
    /// `strftime` format used when rendering datetimes for people
    pub datetime_format: String,
    /// Reference time used when the caller supplies none; wall-clock now when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_now: Option<DateTime<Utc>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            datetime_format: "%Y-%m-%d %H:%M".to_string(),
            default_now: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_default_now(mut self, now: DateTime<Utc>) -> Self {
        self.default_now = Some(now);
        self
    }

    /// The reference time to evaluate at
    pub fn now(&self) -> DateTime<Utc> {
        self.default_now.unwrap_or_else(Utc::now)
    }
}

/// Mutable state threaded through one evaluation.
///
/// Operators that change the state for a subtree (`AS OF`, rule invocation) go through
/// the scoped helpers, which restore the previous state when the subtree returns.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    reference_time: DateTime<Utc>,
    /// Observations effective after this instant are invisible
    window_end: Option<DateTime<Utc>>,
    parameters: ParameterBindings,
    depth: usize,
    max_depth: usize,
}

impl EvaluationContext {
    /// Create a context evaluating at the given reference time
    pub fn new(reference_time: DateTime<Utc>) -> Self {
        Self {
            reference_time,
            window_end: None,
            parameters: ParameterBindings::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a context from configuration, evaluating at `now` or the configured default
    pub fn from_config(config: &EngineConfig, now: Option<DateTime<Utc>>) -> Self {
        Self::new(now.unwrap_or_else(|| config.now())).with_max_depth(config.max_depth)
    }

    pub fn with_parameters(mut self, parameters: ParameterBindings) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        self.window_end
    }

    /// Whether an observation effective at `at` is visible
    pub fn in_window(&self, at: DateTime<Utc>) -> bool {
        self.window_end.is_none_or(|end| at <= end)
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &ParameterBindings {
        &self.parameters
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name, value);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Enter one level of nesting; false once the limit is reached
    pub fn enter_recursion(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` with the reference time rebound to `anchor` and the observation window
    /// narrowed to end at `anchor`. A window that already ends earlier is kept.
    pub fn as_of<R>(&mut self, anchor: DateTime<Utc>, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = (self.reference_time, self.window_end);
        self.reference_time = anchor;
        self.window_end = Some(self.window_end.map_or(anchor, |end| end.min(anchor)));
        let result = f(self);
        (self.reference_time, self.window_end) = saved;
        result
    }

    /// Run `f` with `bindings` as the visible parameters
    pub fn scoped_parameters<R>(
        &mut self,
        bindings: ParameterBindings,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = std::mem::replace(&mut self.parameters, bindings);
        let result = f(self);
        self.parameters = saved;
        result
    }
}
