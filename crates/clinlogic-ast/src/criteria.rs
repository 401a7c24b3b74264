//! Criteria expression trees
//!
//! A `Criteria` is the tree a rule is made of. Leaves are literals, data references,
//! rule parameters and the reference time; interior nodes apply an [`Operator`] to one,
//! two or many operands. Trees are usually assembled with the fluent builder methods:
//!
//! ```
//! use clinlogic_ast::Criteria;
//!
//! // LAST {CD4 COUNT} < 200
//! let low_cd4 = Criteria::reference("CD4 COUNT").lt(200).last();
//! assert!(low_cd4.validate().is_ok());
//! ```

use crate::{Arity, Operator};
use chrono::{DateTime, Utc};
use clinlogic_types::{Duration, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reference to clinical data: a concept name or a registered rule token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReference {
    pub token: String,
    /// Arguments passed when the token names a parameterized rule
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: IndexMap<String, Value>,
}

impl DataReference {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            args: IndexMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}

/// Expression tree element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criteria {
    Literal { value: Value },
    Reference(DataReference),
    /// Rule parameter, resolved from the bound parameters at evaluation time
    Parameter { name: String },
    /// The current reference ("now") time of the evaluation
    ReferenceTime,
    Unary {
        operator: Operator,
        operand: Box<Criteria>,
    },
    Binary {
        operator: Operator,
        left: Box<Criteria>,
        right: Box<Criteria>,
    },
    Nary {
        operator: Operator,
        operands: Vec<Criteria>,
    },
}

/// Structural problem found by [`Criteria::validate`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("{operator} expects {expected} operand(s), found {found}")]
    Arity {
        operator: Operator,
        expected: Arity,
        found: usize,
    },
    #[error("invalid operand for {operator}: {message}")]
    InvalidOperand { operator: Operator, message: String },
}

impl Criteria {
    // Leaves

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Reference to a concept or rule token
    pub fn reference(token: impl Into<String>) -> Self {
        Self::Reference(DataReference::new(token))
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self::Parameter { name: name.into() }
    }

    pub fn now() -> Self {
        Self::ReferenceTime
    }

    // Generic constructors

    pub fn unary(operator: Operator, operand: Criteria) -> Self {
        Self::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(operator: Operator, left: Criteria, right: Criteria) -> Self {
        Self::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn nary(operator: Operator, operands: Vec<Criteria>) -> Self {
        Self::Nary { operator, operands }
    }

    // Comparison

    /// Apply a binary operator with an arbitrary right-hand operand
    pub fn compare(self, operator: Operator, rhs: Criteria) -> Self {
        Self::binary(operator, self, rhs)
    }

    pub fn equal_to(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Equals, self, Self::literal(value))
    }

    pub fn gt(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Gt, self, Self::literal(value))
    }

    pub fn gte(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Gte, self, Self::literal(value))
    }

    pub fn lt(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Lt, self, Self::literal(value))
    }

    pub fn lte(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Lte, self, Self::literal(value))
    }

    pub fn contains(self, value: impl Into<Value>) -> Self {
        Self::binary(Operator::Contains, self, Self::literal(value))
    }

    // Temporal

    pub fn before(self, at: DateTime<Utc>) -> Self {
        Self::binary(Operator::Before, self, Self::literal(at))
    }

    pub fn after(self, at: DateTime<Utc>) -> Self {
        Self::binary(Operator::After, self, Self::literal(at))
    }

    /// Evaluate this subtree as if the reference time were `at`
    pub fn as_of(self, at: DateTime<Utc>) -> Self {
        Self::binary(Operator::AsOf, self, Self::literal(at))
    }

    pub fn within(self, duration: Duration) -> Self {
        Self::binary(Operator::Within, self, Self::literal(duration))
    }

    // Aggregation and existence

    pub fn last(self) -> Self {
        Self::unary(Operator::Last, self)
    }

    pub fn first(self) -> Self {
        Self::unary(Operator::First, self)
    }

    /// The `n` most recent elements, most recent first
    pub fn last_n(self, n: usize) -> Self {
        Self::binary(Operator::Last, self, Self::count_literal(n))
    }

    /// The `n` earliest elements, oldest first
    pub fn first_n(self, n: usize) -> Self {
        Self::binary(Operator::First, self, Self::count_literal(n))
    }

    pub fn exists(self) -> Self {
        Self::unary(Operator::Exists, self)
    }

    pub fn not_exists(self) -> Self {
        Self::unary(Operator::NotExists, self)
    }

    pub fn count(self) -> Self {
        Self::unary(Operator::Count, self)
    }

    pub fn average(self) -> Self {
        Self::unary(Operator::Average, self)
    }

    pub fn distinct(self) -> Self {
        Self::unary(Operator::Distinct, self)
    }

    // Logical

    /// Conjunction; chained calls extend one flat operand list
    pub fn and(self, other: Criteria) -> Self {
        self.join(Operator::And, other)
    }

    /// Disjunction; chained calls extend one flat operand list
    pub fn or(self, other: Criteria) -> Self {
        self.join(Operator::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::unary(Operator::Not, self)
    }

    fn join(self, operator: Operator, other: Criteria) -> Self {
        match self {
            Self::Nary {
                operator: op,
                mut operands,
            } if op == operator => {
                operands.push(other);
                Self::Nary { operator, operands }
            }
            lhs => Self::Nary {
                operator,
                operands: vec![lhs, other],
            },
        }
    }

    fn count_literal(n: usize) -> Self {
        Self::literal(Value::Integer(i64::try_from(n).unwrap_or(i64::MAX)))
    }

    /// Operator of an interior node
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Self::Unary { operator, .. }
            | Self::Binary { operator, .. }
            | Self::Nary { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    /// Operands of an interior node, in order; empty for leaves
    pub fn operands(&self) -> Vec<&Criteria> {
        match self {
            Self::Unary { operand, .. } => vec![operand.as_ref()],
            Self::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Nary { operands, .. } => operands.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Data references in the tree, in depth-first order
    pub fn references(&self) -> Vec<&DataReference> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a DataReference>) {
        if let Self::Reference(r) = self {
            out.push(r);
        }
        for child in self.operands() {
            child.collect_references(out);
        }
    }

    /// Check operand counts and the shape of literal operands throughout the tree
    pub fn validate(&self) -> Result<(), CriteriaError> {
        let Some(operator) = self.operator() else {
            return Ok(());
        };
        let operands = self.operands();

        let arity = operator.arity();
        if !arity.accepts(operands.len()) {
            return Err(CriteriaError::Arity {
                operator,
                expected: arity,
                found: operands.len(),
            });
        }

        if let Some(Self::Literal { value }) = operands.get(1) {
            let ok = match operator {
                Operator::Within => matches!(value, Value::Duration(_)),
                Operator::AsOf => matches!(value, Value::Datetime(_)),
                Operator::Last | Operator::First => matches!(value, Value::Integer(n) if *n >= 0),
                _ => true,
            };
            if !ok {
                return Err(CriteriaError::InvalidOperand {
                    operator,
                    message: format!("unexpected literal {}", value),
                });
            }
        }

        operands.into_iter().try_for_each(Criteria::validate)
    }
}

impl From<DataReference> for Criteria {
    fn from(r: DataReference) -> Self {
        Self::Reference(r)
    }
}

impl From<Value> for Criteria {
    fn from(value: Value) -> Self {
        Self::Literal { value }
    }
}

// Rendering back to query text

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "NULL"),
        Value::Boolean(true) => write!(f, "TRUE"),
        Value::Boolean(false) => write!(f, "FALSE"),
        Value::Numeric(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{:.1}", n),
        Value::Text(s) => write!(f, "\"{}\"", escape(s)),
        Value::Coded(c) => match &c.system {
            Some(system) => write!(f, "#\"{}\"|\"{}\"", escape(system), escape(&c.code)),
            None => write!(f, "#\"{}\"", escape(&c.code)),
        },
        Value::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        other => write!(f, "{}", other),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_operand(f: &mut fmt::Formatter<'_>, c: &Criteria) -> fmt::Result {
    match c {
        Criteria::Unary { .. } | Criteria::Binary { .. } | Criteria::Nary { .. } => {
            write!(f, "({})", c)
        }
        leaf => write!(f, "{}", leaf),
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value } => write_literal(f, value),
            Self::Reference(r) => {
                write!(f, "{{{}}}", r.token)?;
                if !r.args.is_empty() {
                    write!(f, "(")?;
                    for (i, (name, value)) in r.args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{} = ", name)?;
                        write_literal(f, value)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Parameter { name } => write!(f, "${}", name),
            Self::ReferenceTime => write!(f, "NOW"),
            Self::Unary { operator, operand } => {
                write!(f, "{} ", operator.symbol())?;
                write_operand(f, operand)
            }
            Self::Binary {
                operator: op @ (Operator::Last | Operator::First),
                left,
                right,
            } => {
                write!(f, "{} ", op.symbol())?;
                write_operand(f, right)?;
                write!(f, " FROM ")?;
                write_operand(f, left)
            }
            Self::Binary {
                operator,
                left,
                right,
            } => {
                write_operand(f, left)?;
                write!(f, " {} ", operator.symbol())?;
                write_operand(f, right)
            }
            Self::Nary { operator, operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", operator.symbol())?;
                    }
                    write_operand(f, operand)?;
                }
                Ok(())
            }
        }
    }
}
