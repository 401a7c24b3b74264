//! Rules command implementation

use super::output::{self, OutputFormat};
use crate::LogicService;
use anyhow::{Context, Result};
use clinlogic_ast::Rule;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for rules command
pub struct RulesConfig {
    pub rules_file: PathBuf,
    pub filter: Option<String>,
    pub tag: Option<String>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// Listing entry for one registered rule
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct RuleRow {
    #[tabled(rename = "Token")]
    pub token: String,
    #[tabled(rename = "Tags", display_with = "join")]
    pub tags: Vec<String>,
    #[tabled(rename = "Parameters", display_with = "join")]
    pub parameters: Vec<String>,
    #[tabled(rename = "Description", display_with = "display_description")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleRow {
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            token: rule.token.clone(),
            tags: rule.tags.iter().cloned().collect(),
            parameters: rule
                .parameters
                .iter()
                .map(|p| {
                    let marker = if p.required { "" } else { "?" };
                    format!("{}{}: {}", p.name, marker, p.value_type)
                })
                .collect(),
            description: rule.description.clone(),
        }
    }
}

fn join(items: &[String]) -> String {
    items.join(", ")
}

fn display_description(description: &Option<String>) -> String {
    description.clone().unwrap_or_default()
}

/// List the rules of a rules file, optionally filtered by token or tag
pub fn list(config: RulesConfig) -> Result<()> {
    let service = LogicService::new();
    let text = output::read_file(&config.rules_file, "rules")?;
    service
        .load_rules_json(&text)
        .with_context(|| format!("Failed to load rules from {}", config.rules_file.display()))?;

    let rows = select(&service, config.filter.as_deref(), config.tag.as_deref());
    let content = output::render(&rows, config.format)?;
    output::write_output(&content, config.output_file.as_deref())
}

/// Rules matching a case-insensitive token fragment and a tag, in registration order
pub fn select(service: &LogicService, filter: Option<&str>, tag: Option<&str>) -> Vec<RuleRow> {
    let registry = service.registry();
    let tokens = match filter {
        Some(partial) => registry.find_tokens(partial),
        None => registry.tokens(),
    };
    tokens
        .iter()
        .filter_map(|token| registry.find(token))
        .filter(|rule| tag.is_none_or(|t| rule.tags.contains(t)))
        .map(|rule| RuleRow::from_rule(&rule))
        .collect()
}
