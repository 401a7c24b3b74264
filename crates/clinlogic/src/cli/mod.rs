//! CLI functionality for the clinlogic tool
//!
//! This module contains all CLI-related functionality including:
//! - Query and rule evaluation over JSON data files
//! - Query and rule file checking
//! - Rule listing
//! - Output formatting

pub mod check;
pub mod eval;
pub mod output;
pub mod rules;
