//! Clinical Logic Evaluation Engine
//!
//! Evaluates [`Criteria`](clinlogic_ast::Criteria) trees against a subject's
//! time-ordered observations, producing typed, time-qualified results:
//!
//! - **Logical operators**: AND, OR (short-circuiting), NOT
//! - **Comparison operators**: =, >, >=, <, <=, CONTAINS
//! - **Temporal operators**: BEFORE, AFTER, WITHIN, AS OF
//! - **Existence operators**: EXISTS, NOT EXISTS
//! - **Aggregation operators**: LAST, FIRST, COUNT, AVERAGE, DISTINCT
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use clinlogic_ast::Criteria;
//! use clinlogic_eval::{LogicEngine, Timeline};
//! use clinlogic_types::Observation;
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! let timeline = Timeline::from_observations(
//!     "p1",
//!     [Observation::new("p1", "CD4 COUNT", 180.0, now)],
//! );
//!
//! let engine = LogicEngine::new();
//! let mut ctx = engine.context(Some(now));
//! let low = Criteria::reference("CD4 COUNT").lt(200).last().exists();
//! let result = engine.evaluate(&low, &timeline, &mut ctx).unwrap();
//! assert_eq!(result.as_boolean(), Some(true));
//! ```
//!
//! # Architecture
//!
//! - `LogicEngine`: dispatches each criteria node to an operator implementation and
//!   resolves data references against the rule registry and the timeline
//! - `EvaluationContext`: reference time, observation window, bound parameters, depth
//! - `operators`: one module per operator family
//! - `retrieve`: async seam that materializes timelines before evaluation

pub mod binding;
pub mod context;
pub mod engine;
pub mod error;
pub mod operators;
pub mod registry;
pub mod result;
pub mod retrieve;
pub mod timeline;

// Re-export main types
pub use binding::{ParameterBindings, bind};
pub use context::{DEFAULT_MAX_DEPTH, EngineConfig, EvaluationContext};
pub use engine::{EvalOptions, LogicEngine};
pub use error::{BindingError, EvalError, EvalResult};
pub use registry::RuleRegistry;
pub use result::{LogicResult, ResultItem, ResultValue};
pub use retrieve::{
    InMemoryRetriever, NoOpRetriever, ObservationRetriever, RetrieveError, materialize,
    materialize_cohort,
};
pub use timeline::Timeline;
