//! Eval command implementation

use super::output::{self, OutputFormat};
use crate::{DataSet, EngineConfig, LogicService};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clinlogic_ast::{Criteria, DataReference};
use clinlogic_eval::{
    EvalOptions, LogicResult, ObservationRetriever, ParameterBindings, materialize_cohort,
};
use clinlogic_parser::parse_value;
use clinlogic_types::Value;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

/// Configuration for eval command
pub struct EvalConfig {
    pub queries: Vec<String>,
    pub rule: Option<String>,
    pub data: PathBuf,
    pub subject: Option<String>,
    pub params: Vec<String>,
    pub now: Option<String>,
    pub rules_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

/// One evaluated expression for one subject
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ResultRow {
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Expression")]
    pub expression: String,
    #[tabled(rename = "Result", display_with = "display_result")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<LogicResult>,
    #[tabled(rename = "Error", display_with = "display_error")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn display_result(result: &Option<LogicResult>) -> String {
    result.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn display_error(error: &Option<String>) -> String {
    error.clone().unwrap_or_default()
}

/// Evaluate queries or a registered rule for the subjects of a data file
pub async fn eval(config: EvalConfig) -> Result<()> {
    if config.queries.is_empty() && config.rule.is_none() {
        bail!("Nothing to evaluate: pass one or more queries or --rule <TOKEN>");
    }

    let service = LogicService::with_config(load_engine_config(config.config_file.as_deref())?);
    if let Some(path) = &config.rules_file {
        let text = output::read_file(path, "rules")?;
        let count = service
            .load_rules_json(&text)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        log::info!("loaded {} rule(s) from {}", count, path.display());
    }

    let params = parse_parameters(&config.params)?;
    let now = config.now.as_deref().map(parse_now).transpose()?;
    let expressions = build_expressions(&service, &config, &params)?;

    let data = DataSet::from_json(&output::read_file(&config.data, "data")?)
        .with_context(|| format!("Failed to load data from {}", config.data.display()))?;
    let retriever = data.into_retriever();
    let subjects = match &config.subject {
        Some(subject) => vec![subject.clone()],
        None => retriever.subjects().await?,
    };

    let concepts: IndexSet<String> = expressions
        .iter()
        .flat_map(|(_, c)| service.referenced_concepts(c))
        .collect();
    let concepts: Vec<String> = concepts.into_iter().collect();
    log::debug!("retrieving {:?} for {} subject(s)", concepts, subjects.len());
    let timelines = materialize_cohort(&retriever, &subjects, &concepts).await?;

    // Rule arguments travel on the reference; query parameters go into the context
    let options = EvalOptions {
        now,
        parameters: if config.rule.is_some() {
            ParameterBindings::new()
        } else {
            ParameterBindings::from(params)
        },
    };

    let mut rows = Vec::new();
    for timeline in &timelines {
        for (name, criteria) in &expressions {
            let (result, error) = match service.evaluate(criteria, timeline, &options) {
                Ok(result) => (Some(result), None),
                Err(e) => (None, Some(format!("{}: {}", e.code(), e))),
            };
            rows.push(ResultRow {
                subject: timeline.subject().to_string(),
                expression: name.clone(),
                result,
                error,
            });
        }
    }

    let failures = rows.iter().filter(|r| r.error.is_some()).count();
    let content = output::render(&rows, config.format)?;
    output::write_output(&content, config.output_file.as_deref())?;

    if failures > 0 {
        eprintln!(
            "{}",
            output::format_warning(&format!("{} evaluation(s) failed", failures))
        );
    }
    Ok(())
}

/// Parse every query up front, printing a diagnostic for each failure
fn build_expressions(
    service: &LogicService,
    config: &EvalConfig,
    params: &IndexMap<String, Value>,
) -> Result<Vec<(String, Criteria)>> {
    let mut expressions = Vec::new();
    let mut failed = 0;
    for query in &config.queries {
        match clinlogic_parser::parse(query) {
            Ok(criteria) => expressions.push((query.clone(), criteria)),
            Err(e) => {
                eprint!("{}", e.to_diagnostic().render(query));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} query(s) failed to parse", failed);
    }

    if let Some(token) = &config.rule {
        service.registry().get_rule(token)?;
        let mut reference = DataReference::new(token.as_str());
        reference.args = params.clone();
        expressions.push((token.clone(), Criteria::Reference(reference)));
    }
    Ok(expressions)
}

fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = output::read_file(path, "config")?;
    EngineConfig::from_json(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse parameter strings (name=value) into a map
///
/// Values use query literal syntax (`200`, `6 months`, `2024-01-31`, `#A16`); anything
/// else is taken as text.
pub fn parse_parameters(params: &[String]) -> Result<IndexMap<String, Value>> {
    let mut result = IndexMap::new();
    for param in params {
        let Some((name, value)) = param.split_once('=') else {
            bail!("Invalid parameter format: '{}'. Expected 'name=value'", param);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid parameter format: '{}'. Missing name", param);
        }
        let value = value.trim();
        let value = parse_value(value).unwrap_or_else(|_| Value::Text(value.to_string()));
        result.insert(name.to_string(), value);
    }
    Ok(result)
}

/// Parse a `--now` override written as a query date literal
pub fn parse_now(text: &str) -> Result<DateTime<Utc>> {
    match parse_value(text)? {
        Value::Datetime(at) => Ok(at),
        other => bail!("Expected a date for --now, got {}", other.value_type()),
    }
}
