//! Clinical logic abstract syntax
//!
//! This crate defines the operator vocabulary, the criteria trees built from it, and
//! the rules that give a criteria tree a token and typed parameters.

mod criteria;
mod operator;
mod rule;

pub use criteria::*;
pub use operator::*;
pub use rule::*;
