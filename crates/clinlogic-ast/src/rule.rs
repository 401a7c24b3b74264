//! Rules: named, parameterized criteria

use crate::Criteria;
use clinlogic_types::{Value, ValueType};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Declaration of a rule parameter.
///
/// A required parameter must be supplied by the caller and its default is never used.
/// An optional parameter falls back to `default`, which may itself be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl RuleParameterInfo {
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, value_type: ValueType, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: false,
            default,
        }
    }
}

/// A criteria tree registered under a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub token: String,
    pub criteria: Criteria,
    #[serde(default)]
    pub parameters: Vec<RuleParameterInfo>,
    #[serde(default)]
    pub tags: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    pub fn new(token: impl Into<String>, criteria: Criteria) -> Self {
        Self {
            token: token.into(),
            criteria,
            parameters: Vec::new(),
            tags: IndexSet::new(),
            description: None,
        }
    }

    pub fn with_parameter(mut self, parameter: RuleParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&RuleParameterInfo> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
