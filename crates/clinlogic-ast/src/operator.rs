//! Logic operators with category and arity information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad family an operator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorCategory {
    Logical,
    Comparison,
    Temporal,
    Existence,
    Aggregation,
}

/// Number of operands an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// Exactly this many operands
    Exactly(usize),
    /// At least this many operands
    AtLeast(usize),
    /// Inclusive range of operand counts
    Between(usize, usize),
}

impl Arity {
    pub const fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(lo, hi) => count >= lo && count <= hi,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
            Self::Between(lo, hi) => write!(f, "{} to {}", lo, hi),
        }
    }
}

/// The closed operator vocabulary of the logic language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    // Logical
    /// Conjunction, short-circuits on the first false operand
    And,
    /// Disjunction, short-circuits on the first true operand
    Or,
    Not,

    // Comparison
    Equals,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring or membership test
    Contains,

    // Temporal
    Before,
    After,
    /// Effective time within a duration of the reference time
    Within,
    /// Rebinds the reference time for a subtree
    AsOf,

    // Existence
    Exists,
    NotExists,

    // Aggregation
    /// Most recent element(s) of a sequence
    Last,
    /// Earliest element(s) of a sequence
    First,
    Count,
    Average,
    Distinct,
}

impl Operator {
    pub const ALL: [Operator; 20] = [
        Self::And,
        Self::Or,
        Self::Not,
        Self::Equals,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Contains,
        Self::Before,
        Self::After,
        Self::Within,
        Self::AsOf,
        Self::Exists,
        Self::NotExists,
        Self::Last,
        Self::First,
        Self::Count,
        Self::Average,
        Self::Distinct,
    ];

    /// Canonical upper-case name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Equals => "EQUALS",
            Self::Gt => "GT",
            Self::Gte => "GTE",
            Self::Lt => "LT",
            Self::Lte => "LTE",
            Self::Contains => "CONTAINS",
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::Within => "WITHIN",
            Self::AsOf => "ASOF",
            Self::Exists => "EXISTS",
            Self::NotExists => "NOT_EXISTS",
            Self::Last => "LAST",
            Self::First => "FIRST",
            Self::Count => "COUNT",
            Self::Average => "AVERAGE",
            Self::Distinct => "DISTINCT",
        }
    }

    /// Spelling used by the query language
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::AsOf => "AS OF",
            Self::NotExists => "NOT EXISTS",
            other => other.name(),
        }
    }

    pub const fn category(&self) -> OperatorCategory {
        match self {
            Self::And | Self::Or | Self::Not => OperatorCategory::Logical,
            Self::Equals | Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Contains => {
                OperatorCategory::Comparison
            }
            Self::Before | Self::After | Self::Within | Self::AsOf => OperatorCategory::Temporal,
            Self::Exists | Self::NotExists => OperatorCategory::Existence,
            Self::Last | Self::First | Self::Count | Self::Average | Self::Distinct => {
                OperatorCategory::Aggregation
            }
        }
    }

    /// Operand count accepted by this operator.
    ///
    /// `LAST` and `FIRST` take an optional second operand holding the number of
    /// elements to keep.
    pub const fn arity(&self) -> Arity {
        match self {
            Self::And | Self::Or => Arity::AtLeast(1),
            Self::Not
            | Self::Exists
            | Self::NotExists
            | Self::Count
            | Self::Average
            | Self::Distinct => Arity::Exactly(1),
            Self::Last | Self::First => Arity::Between(1, 2),
            Self::Equals
            | Self::Gt
            | Self::Gte
            | Self::Lt
            | Self::Lte
            | Self::Contains
            | Self::Before
            | Self::After
            | Self::Within
            | Self::AsOf => Arity::Exactly(2),
        }
    }

    /// Check if this is an ordering or equality comparison
    pub const fn is_comparison(&self) -> bool {
        matches!(self, Self::Equals | Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    /// Check if this operator only supports equality-style comparison
    pub const fn is_equality(&self) -> bool {
        matches!(self, Self::Equals)
    }

    pub const fn is_logical(&self) -> bool {
        matches!(self.category(), OperatorCategory::Logical)
    }

    /// Look up an operator by canonical name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
