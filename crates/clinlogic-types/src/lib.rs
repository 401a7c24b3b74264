//! Clinical logic value types
//!
//! This crate defines the values the logic engine reasons about:
//! - `Duration` normalized to days, with the unit it was built from
//! - `Value` / `ValueType` for literals and rule parameters
//! - `Observation`, the time-stamped clinical fact supplied by data access

pub mod duration;
pub mod observation;
pub mod value;

pub use duration::{Duration, DurationUnit, UnknownDurationUnit};
pub use observation::Observation;
pub use value::{Code, Value, ValueType};
