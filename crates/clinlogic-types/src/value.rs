//! Literal and parameter values
//!
//! `Value` is the runtime representation of literals in a criteria tree and of actual
//! arguments supplied to a rule. `ValueType` is the closed tag set used to check
//! parameter types structurally.

use crate::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A coded value, e.g. a concept answer from a terminology
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl Code {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Codes match when the code strings agree and, if both carry a system, the
    /// systems agree too.
    pub fn matches(&self, other: &Code) -> bool {
        if self.code != other.code {
            return false;
        }
        match (&self.system, &other.system) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.system {
            Some(system) => write!(f, "{}|{}", system, self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Runtime value of a literal or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Absent / unknown
    Null,
    Boolean(bool),
    Integer(i64),
    Numeric(f64),
    Text(String),
    Coded(Code),
    Datetime(DateTime<Utc>),
    Duration(Duration),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type tag of this value; `Null` reports `Any`
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Any,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Numeric(_) => ValueType::Numeric,
            Self::Text(_) => ValueType::Text,
            Self::Coded(_) => ValueType::Coded,
            Self::Datetime(_) => ValueType::Datetime,
            Self::Duration(_) => ValueType::Duration,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view; integers are promoted
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&Code> {
        match self {
            Self::Coded(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Datetime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "\"{}\"", s),
            Self::Coded(c) => write!(f, "#\"{}\"", c),
            Self::Datetime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Duration(d) => write!(f, "{}", d),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Code> for Value {
    fn from(c: Code) -> Self {
        Self::Coded(c)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Datetime(dt)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Closed set of value type tags used for parameter declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Integer,
    Numeric,
    Text,
    Coded,
    Datetime,
    Duration,
    Any,
}

impl ValueType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Coded => "Coded",
            Self::Datetime => "Datetime",
            Self::Duration => "Duration",
            Self::Any => "Any",
        }
    }

    /// Whether a value carries this tag. `Any` accepts everything; the other tags
    /// require an exact match, so an `Integer` does not satisfy `Numeric`.
    pub fn accepts(&self, value: &Value) -> bool {
        *self == Self::Any || value.value_type() == *self
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::from(5).value_type(), ValueType::Integer);
        assert_eq!(Value::from(5.0).value_type(), ValueType::Numeric);
        assert_eq!(Value::Null.value_type(), ValueType::Any);
    }

    #[test]
    fn test_type_acceptance_is_strict() {
        assert!(ValueType::Integer.accepts(&Value::Integer(3)));
        assert!(!ValueType::Numeric.accepts(&Value::Integer(3)));
        assert!(ValueType::Any.accepts(&Value::Text("x".into())));
    }

    #[test]
    fn test_number_promotion() {
        assert_eq!(Value::Integer(200).as_number(), Some(200.0));
        assert_eq!(Value::Text("200".into()).as_number(), None);
    }

    #[test]
    fn test_code_matching() {
        let plain = Code::new("POSITIVE");
        let loinc = Code::new("POSITIVE").with_system("LOINC");
        let snomed = Code::new("POSITIVE").with_system("SNOMED");
        assert!(plain.matches(&loinc));
        assert!(!loinc.matches(&snomed));
        assert!(!plain.matches(&Code::new("NEGATIVE")));
    }

    #[test]
    fn test_serde_shape() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let json = serde_json::to_value(Value::Datetime(dt)).unwrap();
        assert_eq!(json["type"], "Datetime");

        let back: Value = serde_json::from_str(r#"{"type":"Numeric","value":350.0}"#).unwrap();
        assert_eq!(back, Value::Numeric(350.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Coded(Code::new("YES")).to_string(), "#\"YES\"");
        assert_eq!(Value::Duration(Duration::days(3.0)).to_string(), "3 days");
    }
}
