//! Check command implementation

use super::output;
use crate::RuleDefinition;
use anyhow::{Result, bail};
use clinlogic_ast::Criteria;
use clinlogic_types::{Value, ValueType};
use colored::Colorize;
use indexmap::IndexSet;
use std::path::PathBuf;

/// Configuration for check command
pub struct CheckConfig {
    pub queries: Vec<String>,
    pub rules_files: Vec<PathBuf>,
}

/// Outcome of checking one query or rule
#[derive(Debug, Default)]
pub struct CheckReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Parse queries and rule files, reporting diagnostics without evaluating anything
pub fn check(config: CheckConfig) -> Result<()> {
    if config.queries.is_empty() && config.rules_files.is_empty() {
        bail!("Nothing to check: pass one or more queries or --rules <FILE>");
    }

    let mut errors = 0;
    let mut warnings = 0;

    for query in &config.queries {
        match clinlogic_parser::parse(query) {
            Ok(criteria) => match criteria.validate() {
                Ok(()) => println!("{} {}", "✓".green().bold(), query.cyan()),
                Err(e) => {
                    println!("{} {}", "✗".red().bold(), query.cyan());
                    println!("  {}: {}", "error".red().bold(), e);
                    errors += 1;
                }
            },
            Err(e) => {
                println!("{} {}", "✗".red().bold(), query.cyan());
                print!("{}", e.to_diagnostic().render(query));
                errors += 1;
            }
        }
    }

    for path in &config.rules_files {
        let text = output::read_file(path, "rules")?;
        println!("{}", path.display().to_string().cyan().bold());
        let definitions = match RuleDefinition::from_json(&text) {
            Ok(definitions) => definitions,
            Err(e) => {
                println!("  {}: {}", "error".red().bold(), e);
                errors += 1;
                continue;
            }
        };

        let mut seen = IndexSet::new();
        for definition in &definitions {
            let mut report = check_definition(definition);
            if !seen.insert(definition.token.as_str()) {
                report
                    .warnings
                    .push(format!("Duplicate token '{}' replaces an earlier rule", definition.token));
            }
            print_report(&definition.token, &report);
            errors += report.errors.len();
            warnings += report.warnings.len();
        }
    }

    println!();
    if errors > 0 {
        bail!("Check failed: {} error(s), {} warning(s)", errors, warnings);
    }
    if warnings > 0 {
        println!("{}", output::format_warning(&format!("{} warning(s)", warnings)));
    } else {
        println!("{}", output::format_success("No problems found"));
    }
    Ok(())
}

/// Parse and validate a rule definition, then check its parameters against its query
pub fn check_definition(definition: &RuleDefinition) -> CheckReport {
    let mut report = CheckReport::default();
    let rule = match definition.to_rule() {
        Ok(rule) => rule,
        Err(e) => {
            report.errors.push(e.to_string());
            return report;
        }
    };
    let used = parameter_names(&rule.criteria);
    for name in &used {
        if rule.parameter(name).is_none() {
            report
                .errors
                .push(format!("Parameter '${}' is used but not declared", name));
        }
    }
    for declared in &rule.parameters {
        if !used.contains(declared.name.as_str()) {
            report
                .warnings
                .push(format!("Parameter '{}' is declared but never used", declared.name));
        }
        if let Some(default) = &declared.default {
            if declared.required {
                report.warnings.push(format!(
                    "Required parameter '{}' has a default that is never used",
                    declared.name
                ));
            } else if !default_fits(declared.value_type, default) {
                report.errors.push(format!(
                    "Default of parameter '{}' is {}, expected {}",
                    declared.name,
                    default.value_type(),
                    declared.value_type
                ));
            }
        }
    }
    report
}

/// Integer defaults widen to Numeric when bound
fn default_fits(value_type: ValueType, default: &Value) -> bool {
    value_type.accepts(default)
        || (value_type == ValueType::Numeric && matches!(default, Value::Integer(_)))
}

fn parameter_names(criteria: &Criteria) -> IndexSet<&str> {
    let mut names = IndexSet::new();
    collect_parameters(criteria, &mut names);
    names
}

fn collect_parameters<'a>(criteria: &'a Criteria, out: &mut IndexSet<&'a str>) {
    if let Criteria::Parameter { name } = criteria {
        out.insert(name.as_str());
    }
    for child in criteria.operands() {
        collect_parameters(child, out);
    }
}

fn print_report(token: &str, report: &CheckReport) {
    let status = if report.errors.is_empty() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {}", status, token);
    for error in &report.errors {
        println!("    {}: {}", "error".red().bold(), error);
    }
    for warning in &report.warnings {
        println!("    {}: {}", "warning".yellow().bold(), warning);
    }
}
