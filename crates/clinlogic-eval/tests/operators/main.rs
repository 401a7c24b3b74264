//! Operator evaluation tests, one module per operator family

mod aggregate;
mod common;
mod comparison;
mod existence;
mod logical;
mod temporal;
