//! Rule registry
//!
//! Rules are registered under unique tokens. The registry is shared behind `Arc` and
//! uses an interior lock, so rules can be added or replaced while other threads evaluate.

use crate::error::{EvalError, EvalResult};
use clinlogic_ast::{Rule, RuleParameterInfo};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::sync::Arc;

/// Registered rules, in registration order
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: RwLock<IndexMap<String, Arc<Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> EvalResult<Self> {
        let registry = Self::new();
        registry.add_rules(rules)?;
        Ok(registry)
    }

    /// Register a rule, replacing any rule with the same token.
    ///
    /// The criteria are validated first; an invalid rule is not registered.
    pub fn add_rule(&self, rule: Rule) -> EvalResult<()> {
        rule.criteria.validate()?;
        let token = rule.token.clone();
        if self.rules.write().insert(token.clone(), Arc::new(rule)).is_some() {
            log::debug!("replaced rule '{}'", token);
        } else {
            log::debug!("registered rule '{}'", token);
        }
        Ok(())
    }

    /// Register several rules together, replacing rules with the same tokens.
    ///
    /// All criteria are validated before the lock is taken: either every rule is
    /// registered or none is.
    pub fn add_rules(&self, rules: impl IntoIterator<Item = Rule>) -> EvalResult<usize> {
        let rules = rules
            .into_iter()
            .map(|rule| rule.criteria.validate().map(|()| rule))
            .collect::<Result<Vec<_>, _>>()?;
        let count = rules.len();
        let mut registered = self.rules.write();
        for rule in rules {
            registered.insert(rule.token.clone(), Arc::new(rule));
        }
        log::debug!("registered {} rule(s)", count);
        Ok(count)
    }

    /// Replace the rule registered under the rule's token
    pub fn update_rule(&self, rule: Rule) -> EvalResult<()> {
        rule.criteria.validate()?;
        let mut rules = self.rules.write();
        match rules.get_mut(&rule.token) {
            Some(slot) => {
                *slot = Arc::new(rule);
                Ok(())
            }
            None => Err(EvalError::unknown_rule(rule.token)),
        }
    }

    /// Remove a rule, returning it if it was registered
    pub fn remove_rule(&self, token: &str) -> Option<Arc<Rule>> {
        self.rules.write().shift_remove(token)
    }

    pub fn get_rule(&self, token: &str) -> EvalResult<Arc<Rule>> {
        self.find(token).ok_or_else(|| EvalError::unknown_rule(token))
    }

    pub fn find(&self, token: &str) -> Option<Arc<Rule>> {
        self.rules.read().get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.rules.read().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    pub fn rules(&self) -> Vec<Arc<Rule>> {
        self.rules.read().values().cloned().collect()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.rules.read().keys().cloned().collect()
    }

    /// Tokens containing `partial`, ignoring case
    pub fn find_tokens(&self, partial: &str) -> Vec<String> {
        let needle = partial.to_lowercase();
        self.rules
            .read()
            .keys()
            .filter(|token| token.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn tokens_tagged(&self, tag: &str) -> Vec<String> {
        self.rules
            .read()
            .values()
            .filter(|rule| rule.tags.contains(tag))
            .map(|rule| rule.token.clone())
            .collect()
    }

    /// Every tag in use, in first-use order
    pub fn tags(&self) -> Vec<String> {
        let rules = self.rules.read();
        let tags: IndexSet<&String> = rules.values().flat_map(|rule| rule.tags.iter()).collect();
        tags.into_iter().cloned().collect()
    }

    /// Tags in use containing `partial`, ignoring case
    pub fn find_tags(&self, partial: &str) -> Vec<String> {
        let needle = partial.to_lowercase();
        self.tags()
            .into_iter()
            .filter(|tag| tag.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn tags_of(&self, token: &str) -> EvalResult<Vec<String>> {
        Ok(self.get_rule(token)?.tags.iter().cloned().collect())
    }

    /// Tag a registered rule; tagging twice is a no-op
    pub fn add_tag(&self, token: &str, tag: impl Into<String>) -> EvalResult<()> {
        let mut rules = self.rules.write();
        let slot = rules.get_mut(token).ok_or_else(|| EvalError::unknown_rule(token))?;
        Arc::make_mut(slot).tags.insert(tag.into());
        Ok(())
    }

    /// Untag a registered rule, returning whether the tag was present
    pub fn remove_tag(&self, token: &str, tag: &str) -> EvalResult<bool> {
        let mut rules = self.rules.write();
        let slot = rules.get_mut(token).ok_or_else(|| EvalError::unknown_rule(token))?;
        if !slot.tags.contains(tag) {
            return Ok(false);
        }
        Ok(Arc::make_mut(slot).tags.shift_remove(tag))
    }

    /// Declared parameters of a registered rule
    pub fn parameters_of(&self, token: &str) -> EvalResult<Vec<RuleParameterInfo>> {
        Ok(self.get_rule(token)?.parameters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinlogic_ast::{Criteria, Operator};
    use clinlogic_types::ValueType;
    use pretty_assertions::assert_eq;

    fn registry() -> RuleRegistry {
        RuleRegistry::from_rules([
            Rule::new("LOW CD4", Criteria::reference("CD4 COUNT").lt(200).last()).with_tag("hiv"),
            Rule::new("HIV POSITIVE", Criteria::reference("HIV TEST").exists())
                .with_tag("hiv")
                .with_tag("screening"),
            Rule::new("OVERWEIGHT", Criteria::reference("BMI").gt(25).last()),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.get_rule("LOW CD4").is_ok());
        assert_eq!(
            registry.get_rule("MISSING").unwrap_err(),
            EvalError::unknown_rule("MISSING")
        );
    }

    #[test]
    fn test_add_replaces_update_requires_existing() {
        let registry = registry();
        registry
            .add_rule(Rule::new("LOW CD4", Criteria::reference("CD4 COUNT").lt(350).last()))
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get_rule("LOW CD4").unwrap().tags.is_empty());

        let err = registry
            .update_rule(Rule::new("NEW", Criteria::literal(true)))
            .unwrap_err();
        assert_eq!(err, EvalError::unknown_rule("NEW"));
        assert!(registry.update_rule(Rule::new("OVERWEIGHT", Criteria::literal(true))).is_ok());
    }

    #[test]
    fn test_invalid_criteria_rejected() {
        let registry = RuleRegistry::new();
        let bad = Rule::new("BAD", Criteria::nary(Operator::Not, vec![]));
        assert!(matches!(registry.add_rule(bad), Err(EvalError::InvalidCriteria(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove() {
        let registry = registry();
        assert!(registry.remove_rule("HIV POSITIVE").is_some());
        assert!(registry.remove_rule("HIV POSITIVE").is_none());
        assert_eq!(registry.tokens(), vec!["LOW CD4", "OVERWEIGHT"]);
    }

    #[test]
    fn test_add_rules_is_all_or_nothing() {
        let registry = RuleRegistry::new();
        let err = registry
            .add_rules([
                Rule::new("GOOD", Criteria::reference("CD4 COUNT").exists()),
                Rule::new(
                    "BAD",
                    Criteria::binary(Operator::AsOf, Criteria::reference("CD4 COUNT"), Criteria::literal(5)),
                ),
            ])
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidCriteria(_)), "{:?}", err);
        assert!(registry.is_empty());

        let count = registry
            .add_rules([
                Rule::new("A", Criteria::literal(true)),
                Rule::new("B", Criteria::literal(false)),
            ])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(registry.tokens(), vec!["A", "B"]);
    }

    #[test]
    fn test_retag_registered_rule() {
        let registry = registry();
        let evaluating = registry.get_rule("OVERWEIGHT").unwrap();

        registry.add_tag("OVERWEIGHT", "metabolic").unwrap();
        registry.add_tag("OVERWEIGHT", "metabolic").unwrap();
        assert_eq!(registry.tags_of("OVERWEIGHT").unwrap(), vec!["metabolic"]);
        assert_eq!(registry.tokens_tagged("metabolic"), vec!["OVERWEIGHT"]);
        // Rules already handed out keep their tags
        assert!(evaluating.tags.is_empty());

        assert!(registry.remove_tag("HIV POSITIVE", "screening").unwrap());
        assert!(!registry.remove_tag("HIV POSITIVE", "screening").unwrap());
        assert_eq!(registry.tags_of("HIV POSITIVE").unwrap(), vec!["hiv"]);

        assert_eq!(
            registry.add_tag("MISSING", "x").unwrap_err(),
            EvalError::unknown_rule("MISSING")
        );
        assert!(registry.tags_of("MISSING").is_err());
    }

    #[test]
    fn test_find_tags() {
        let registry = registry();
        registry.add_tag("OVERWEIGHT", "HIV-related").unwrap();
        assert_eq!(registry.find_tags("HIV"), vec!["hiv", "HIV-related"]);
        assert_eq!(registry.find_tags("screen"), vec!["screening"]);
        assert!(registry.find_tags("zzz").is_empty());
    }

    #[test]
    fn test_parameters_of() {
        let criteria = Criteria::reference("CD4 COUNT").compare(Operator::Lt, Criteria::parameter("threshold"));
        let rule = Rule::new("LOW", criteria)
            .with_parameter(RuleParameterInfo::required("threshold", ValueType::Numeric));
        let registry = RuleRegistry::from_rules([rule]).unwrap();
        let params = registry.parameters_of("LOW").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "threshold");
        assert!(registry.parameters_of("HIGH").is_err());
    }

    #[test]
    fn test_search() {
        let registry = registry();
        assert_eq!(registry.find_tokens("cd4"), vec!["LOW CD4"]);
        assert_eq!(registry.tokens_tagged("hiv"), vec!["LOW CD4", "HIV POSITIVE"]);
        assert_eq!(registry.tags(), vec!["hiv", "screening"]);
        assert!(registry.find_tokens("xyz").is_empty());
    }
}
