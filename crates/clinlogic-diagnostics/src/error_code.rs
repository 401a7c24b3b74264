//! Logic error codes following a structured numbering system
//!
//! Error code ranges:
//! - LOGIC0001-LOGIC0099: Parse errors (query syntax)
//! - LOGIC0100-LOGIC0199: Rule errors (registration, parameter binding)
//! - LOGIC0200-LOGIC0299: Evaluation errors (runtime)
//! - LOGIC0400-LOGIC0499: System errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a parse error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a rule error (0100-0199)
    pub const fn is_rule_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an evaluation error (0200-0299)
    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LOGIC{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(3, ErrorInfo::new("Invalid token reference")
        .with_help("Token references are written in braces, e.g. {CD4 COUNT}"));
    map.insert(4, ErrorInfo::new("Invalid literal"));
    map.insert(5, ErrorInfo::new("Invalid date/time format")
        .with_help("Dates must be written as YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]"));
    map.insert(6, ErrorInfo::new("Invalid duration unit"));
    map.insert(7, ErrorInfo::new("Missing closing delimiter"));
    map.insert(8, ErrorInfo::new("Query nested too deeply")
        .with_help("Split the query into rules that reference each other"));

    // Rule errors (0100-0199)
    map.insert(100, ErrorInfo::new("Unknown rule token"));
    map.insert(101, ErrorInfo::new("Missing required parameter"));
    map.insert(102, ErrorInfo::new("Parameter type mismatch"));
    map.insert(103, ErrorInfo::new("Unknown parameter"));
    map.insert(104, ErrorInfo::new("Invalid rule definition"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Evaluation failed"));
    map.insert(201, ErrorInfo::new("Type mismatch"));
    map.insert(202, ErrorInfo::new("Unknown data reference")
        .with_help("The data source has no concept or rule registered under this token"));
    map.insert(203, ErrorInfo::new("Operator arity mismatch"));
    map.insert(204, ErrorInfo::new("Recursion limit exceeded"));
    map.insert(205, ErrorInfo::new("Retrieve failed"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Configuration error"));
    map.insert(406, ErrorInfo::new("Invalid format"));

    map
});

// Convenient error code constants

// Parse errors
pub const LOGIC0001: ErrorCode = ErrorCode::new(1);
pub const LOGIC0002: ErrorCode = ErrorCode::new(2);
pub const LOGIC0003: ErrorCode = ErrorCode::new(3);
pub const LOGIC0004: ErrorCode = ErrorCode::new(4);
pub const LOGIC0005: ErrorCode = ErrorCode::new(5);
pub const LOGIC0006: ErrorCode = ErrorCode::new(6);
pub const LOGIC0007: ErrorCode = ErrorCode::new(7);
pub const LOGIC0008: ErrorCode = ErrorCode::new(8);

// Rule errors
pub const LOGIC0100: ErrorCode = ErrorCode::new(100);
pub const LOGIC0101: ErrorCode = ErrorCode::new(101);
pub const LOGIC0102: ErrorCode = ErrorCode::new(102);
pub const LOGIC0103: ErrorCode = ErrorCode::new(103);
pub const LOGIC0104: ErrorCode = ErrorCode::new(104);

// Evaluation errors
pub const LOGIC0200: ErrorCode = ErrorCode::new(200);
pub const LOGIC0201: ErrorCode = ErrorCode::new(201);
pub const LOGIC0202: ErrorCode = ErrorCode::new(202);
pub const LOGIC0203: ErrorCode = ErrorCode::new(203);
pub const LOGIC0204: ErrorCode = ErrorCode::new(204);
pub const LOGIC0205: ErrorCode = ErrorCode::new(205);

// System errors
pub const LOGIC0400: ErrorCode = ErrorCode::new(400);
pub const LOGIC0401: ErrorCode = ErrorCode::new(401);
pub const LOGIC0402: ErrorCode = ErrorCode::new(402);
pub const LOGIC0406: ErrorCode = ErrorCode::new(406);
