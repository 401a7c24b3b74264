//! Binding actual arguments to declared rule parameters

use crate::error::BindingError;
use clinlogic_ast::RuleParameterInfo;
use clinlogic_types::{Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parameter values visible to a rule's criteria, in binding order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBindings(IndexMap<String, Value>);

impl ParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &IndexMap<String, Value> {
        &self.0
    }
}

impl From<IndexMap<String, Value>> for ParameterBindings {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterBindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Bind actual arguments to a rule's declared parameters.
///
/// Parameters are processed in declaration order and the first failure is returned;
/// nothing is bound unless every parameter binds. For each declared parameter:
///
/// - a supplied argument must carry the declared type; an `Integer` widens to `Numeric`
/// - a missing argument is an error when the parameter is required
/// - otherwise the declared default is used, or `Null` when there is none
///
/// An explicit `Null` argument counts as missing. Arguments the rule does not declare
/// are passed through after the declared ones.
pub fn bind(
    parameters: &[RuleParameterInfo],
    actuals: &IndexMap<String, Value>,
) -> Result<ParameterBindings, BindingError> {
    let mut bound = IndexMap::with_capacity(parameters.len().max(actuals.len()));

    for param in parameters {
        let value = match actuals.get(&param.name).filter(|v| !v.is_null()) {
            Some(actual) => coerce(param, actual)?,
            None if param.required => {
                return Err(BindingError::MissingRequiredParameter {
                    name: param.name.clone(),
                });
            }
            None => param.default.clone().unwrap_or(Value::Null),
        };
        bound.insert(param.name.clone(), value);
    }

    for (name, value) in actuals {
        if !bound.contains_key(name) {
            log::trace!("passing through undeclared parameter '{}'", name);
            bound.insert(name.clone(), value.clone());
        }
    }

    Ok(ParameterBindings(bound))
}

fn coerce(param: &RuleParameterInfo, actual: &Value) -> Result<Value, BindingError> {
    match (param.value_type, actual) {
        (ValueType::Numeric, Value::Integer(i)) => Ok(Value::Numeric(*i as f64)),
        (expected, value) if expected.accepts(value) => Ok(value.clone()),
        (expected, value) => Err(BindingError::TypeMismatch {
            name: param.name.clone(),
            expected,
            found: value.value_type(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinlogic_types::Duration;
    use pretty_assertions::assert_eq;

    fn actuals<const N: usize>(pairs: [(&str, Value); N]) -> IndexMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_required_without_argument() {
        let params = [RuleParameterInfo::required("threshold", ValueType::Integer)];
        assert_eq!(
            bind(&params, &IndexMap::new()),
            Err(BindingError::MissingRequiredParameter {
                name: "threshold".into()
            })
        );
    }

    #[test]
    fn test_optional_uses_default() {
        let params = [RuleParameterInfo::optional(
            "threshold",
            ValueType::Integer,
            Some(Value::Integer(5)),
        )];
        let bound = bind(&params, &IndexMap::new()).unwrap();
        assert_eq!(bound.get("threshold"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_optional_without_default_is_null() {
        let params = [RuleParameterInfo::optional("window", ValueType::Duration, None)];
        let bound = bind(&params, &IndexMap::new()).unwrap();
        assert_eq!(bound.get("window"), Some(&Value::Null));
    }

    #[test]
    fn test_required_ignores_default() {
        let mut param = RuleParameterInfo::required("threshold", ValueType::Integer);
        param.default = Some(Value::Integer(5));
        assert!(bind(&[param], &IndexMap::new()).is_err());
    }

    #[test]
    fn test_explicit_null_counts_as_missing() {
        let params = [
            RuleParameterInfo::optional("a", ValueType::Integer, Some(Value::Integer(1))),
            RuleParameterInfo::required("b", ValueType::Integer),
        ];
        let bound = bind(&params, &actuals([("a", Value::Null), ("b", Value::Integer(2))])).unwrap();
        assert_eq!(bound.get("a"), Some(&Value::Integer(1)));
        assert!(bind(&params, &actuals([("b", Value::Null)])).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let params = [RuleParameterInfo::required("window", ValueType::Duration)];
        assert_eq!(
            bind(&params, &actuals([("window", Value::Integer(3))])),
            Err(BindingError::TypeMismatch {
                name: "window".into(),
                expected: ValueType::Duration,
                found: ValueType::Integer,
            })
        );
    }

    #[test]
    fn test_integer_widens_to_numeric() {
        let params = [RuleParameterInfo::required("threshold", ValueType::Numeric)];
        let bound = bind(&params, &actuals([("threshold", Value::Integer(350))])).unwrap();
        assert_eq!(bound.get("threshold"), Some(&Value::Numeric(350.0)));

        let params = [RuleParameterInfo::required("count", ValueType::Integer)];
        assert!(bind(&params, &actuals([("count", Value::Numeric(1.5))])).is_err());
    }

    #[test]
    fn test_first_error_in_declaration_order() {
        let params = [
            RuleParameterInfo::required("first", ValueType::Text),
            RuleParameterInfo::required("second", ValueType::Text),
        ];
        let err = bind(&params, &actuals([("first", Value::Integer(1))])).unwrap_err();
        assert!(matches!(err, BindingError::TypeMismatch { ref name, .. } if name == "first"));
    }

    #[test]
    fn test_undeclared_pass_through_after_declared() {
        let params = [RuleParameterInfo::optional("window", ValueType::Duration, None)];
        let bound = bind(
            &params,
            &actuals([
                ("extra", Value::Text("x".into())),
                ("window", Value::Duration(Duration::days(3.0))),
            ]),
        )
        .unwrap();
        let names: Vec<&str> = bound.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["window", "extra"]);
    }
}
