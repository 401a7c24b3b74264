//! Clinical logic evaluation for Rust
//!
//! This crate ties the workspace together:
//! - Parsing text queries such as `LAST {CD4 COUNT} < 200`
//! - Registering parameterized rules loaded from JSON definitions
//! - Materializing subject timelines through an async retriever
//! - Evaluating criteria into typed, time-qualified results
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use clinlogic::{EvalOptions, LogicService, Timeline};
//! use clinlogic::types::Observation;
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! let timeline = Timeline::from_observations(
//!     "p1",
//!     [Observation::new("p1", "CD4 COUNT", 180.0, now)],
//! );
//!
//! let service = LogicService::new();
//! let options = EvalOptions::at(now);
//! let latest_low = service.eval_query("LAST {CD4 COUNT} < 200", &timeline, &options).unwrap();
//! assert_eq!(latest_low.as_number(), Some(180.0));
//!
//! let alert = service.eval_query("EXISTS {CD4 COUNT} < 200", &timeline, &options).unwrap();
//! assert_eq!(alert.as_boolean(), Some(true));
//! ```

pub mod data;
pub mod service;

// Re-export all public APIs from internal crates
pub use clinlogic_ast as ast;
pub use clinlogic_diagnostics as diagnostics;
pub use clinlogic_eval as eval;
pub use clinlogic_parser as parser;
pub use clinlogic_types as types;

// Convenience re-exports
pub use clinlogic_ast::{Criteria, Rule};
pub use clinlogic_diagnostics::{LogicError, Result};
pub use clinlogic_eval::{EngineConfig, EvalOptions, LogicEngine, LogicResult, Timeline};
pub use clinlogic_parser::parse;
pub use data::DataSet;
pub use service::{LogicService, RuleDefinition};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
