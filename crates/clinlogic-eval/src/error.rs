//! Evaluation errors for the logic engine

use clinlogic_ast::{Arity, CriteriaError, Operator};
use clinlogic_diagnostics::{
    ErrorCode, LOGIC0100, LOGIC0101, LOGIC0102, LOGIC0103, LOGIC0104, LOGIC0201, LOGIC0202,
    LOGIC0203, LOGIC0204, LOGIC0400, LogicError,
};
use clinlogic_types::ValueType;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur during evaluation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Operand of the wrong type for an operator
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A required rule parameter was not supplied
    #[error("Missing required parameter: {name}")]
    MissingRequiredParameter { name: String },

    /// Token names neither a registered rule nor a concept known to the data source
    #[error("Unknown data reference: {token}")]
    UnknownDataReference { token: String },

    /// Operator applied to the wrong number of operands
    #[error("{operator} expects {expected} operand(s), found {found}")]
    ArityMismatch {
        operator: Operator,
        expected: Arity,
        found: usize,
    },

    /// Parameter referenced by the criteria but not bound
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    /// No rule registered under the token
    #[error("Unknown rule: {token}")]
    UnknownRule { token: String },

    /// Rule criteria failed structural validation
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    /// Maximum recursion depth exceeded
    #[error("Maximum recursion depth of {depth} exceeded")]
    RecursionLimit { depth: usize },

    /// Internal error (should not happen)
    #[error("Internal evaluation error: {message}")]
    Internal { message: String },
}

impl EvalError {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingRequiredParameter { name: name.into() }
    }

    pub fn unknown_reference(token: impl Into<String>) -> Self {
        Self::UnknownDataReference {
            token: token.into(),
        }
    }

    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    pub fn unknown_rule(token: impl Into<String>) -> Self {
        Self::UnknownRule {
            token: token.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Diagnostic code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TypeMismatch { .. } => LOGIC0201,
            Self::MissingRequiredParameter { .. } => LOGIC0101,
            Self::UnknownDataReference { .. } => LOGIC0202,
            Self::ArityMismatch { .. } => LOGIC0203,
            Self::UnknownParameter { .. } => LOGIC0103,
            Self::UnknownRule { .. } => LOGIC0100,
            Self::InvalidCriteria(_) => LOGIC0104,
            Self::RecursionLimit { .. } => LOGIC0204,
            Self::Internal { .. } => LOGIC0400,
        }
    }
}

impl From<EvalError> for LogicError {
    fn from(err: EvalError) -> Self {
        let code = err.code();
        let token = match &err {
            EvalError::UnknownRule { token } => Some(token.clone()),
            _ => None,
        };
        if code.is_rule_error() {
            LogicError::rule(code, err.to_string(), token)
        } else if code.is_system_error() {
            LogicError::system(code, err.to_string())
        } else {
            LogicError::evaluation(code, err.to_string())
        }
    }
}

/// Failure to bind actual arguments to a rule's declared parameters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Parameter '{name}' expects {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ValueType,
        found: ValueType,
    },

    #[error("Missing required parameter: {name}")]
    MissingRequiredParameter { name: String },
}

impl BindingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::TypeMismatch { .. } => LOGIC0102,
            Self::MissingRequiredParameter { .. } => LOGIC0101,
        }
    }
}

impl From<BindingError> for EvalError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::TypeMismatch {
                name,
                expected,
                found,
            } => EvalError::type_mismatch(
                format!("{} for parameter '{}'", expected, name),
                found.to_string(),
            ),
            BindingError::MissingRequiredParameter { name } => EvalError::missing_parameter(name),
        }
    }
}
