//! Diagnostics and error handling for clinical logic
//!
//! This crate provides the error handling infrastructure shared by the parser, the
//! evaluation engine and the command-line tool: error codes, source locations and
//! diagnostic reporting.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for logic operations
pub type Result<T> = std::result::Result<T, LogicError>;
