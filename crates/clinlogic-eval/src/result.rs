//! Results produced by evaluating criteria
//!
//! A [`LogicResult`] is empty, a single time-qualified item, or an ordered sequence of
//! items. Results are built fresh by each evaluation and never mutated afterwards.

use chrono::{DateTime, Utc};
use clinlogic_types::{Code, Duration, Observation, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Value carried by a result item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ResultValue {
    Boolean(bool),
    Numeric(f64),
    Coded(Code),
    Text(String),
    Datetime(DateTime<Utc>),
    Duration(Duration),
    /// An observation drawn from the subject's timeline
    Observation(Arc<Observation>),
}

impl ResultValue {
    /// Convert a literal; `Null` has no result value and integers become numeric
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Boolean(b) => Some(Self::Boolean(b)),
            Value::Integer(i) => Some(Self::Numeric(i as f64)),
            Value::Numeric(n) => Some(Self::Numeric(n)),
            Value::Text(s) => Some(Self::Text(s)),
            Value::Coded(c) => Some(Self::Coded(c)),
            Value::Datetime(dt) => Some(Self::Datetime(dt)),
            Value::Duration(d) => Some(Self::Duration(d)),
        }
    }

    /// The plain value; observations yield their observed value
    pub fn to_value(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Boolean(*b),
            Self::Numeric(n) => Value::Numeric(*n),
            Self::Coded(c) => Value::Coded(c.clone()),
            Self::Text(s) => Value::Text(s.clone()),
            Self::Datetime(dt) => Value::Datetime(*dt),
            Self::Duration(d) => Value::Duration(*d),
            Self::Observation(obs) => obs.value.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Numeric(_) => "Numeric",
            Self::Coded(_) => "Coded",
            Self::Text(_) => "Text",
            Self::Datetime(_) => "Datetime",
            Self::Duration(_) => "Duration",
            Self::Observation(_) => "Observation",
        }
    }

    pub fn as_observation(&self) -> Option<&Observation> {
        match self {
            Self::Observation(obs) => Some(obs),
            _ => None,
        }
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observation(obs) => write!(f, "{} {}", obs.concept, obs.value),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

/// A value with an optional effective time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub value: ResultValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<DateTime<Utc>>,
}

impl ResultItem {
    /// An item without time qualification
    pub fn new(value: ResultValue) -> Self {
        Self {
            value,
            effective: None,
        }
    }

    pub fn at(value: ResultValue, effective: DateTime<Utc>) -> Self {
        Self {
            value,
            effective: Some(effective),
        }
    }

    /// An observation, qualified by its effective time
    pub fn observation(observation: Arc<Observation>) -> Self {
        let effective = observation.effective_at;
        Self::at(ResultValue::Observation(observation), effective)
    }

    /// The time this item is positioned at: its effective time, or the value itself
    /// when the value is a datetime.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.effective.or(match &self.value {
            ResultValue::Datetime(dt) => Some(*dt),
            _ => None,
        })
    }

    pub fn to_value(&self) -> Value {
        self.value.to_value()
    }
}

impl fmt::Display for ResultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective {
            Some(at) => write!(f, "{} @ {}", self.value, at.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}", self.value),
        }
    }
}

/// Outcome of an evaluation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LogicResult {
    /// The distinguished empty result
    #[default]
    Empty,
    Item(ResultItem),
    /// Ordered items; never empty
    Sequence(Vec<ResultItem>),
}

impl LogicResult {
    pub fn item(item: ResultItem) -> Self {
        Self::Item(item)
    }

    /// Build a sequence; an empty list normalizes to [`LogicResult::Empty`]
    pub fn sequence(items: Vec<ResultItem>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Sequence(items)
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::Item(ResultItem::new(ResultValue::Boolean(value)))
    }

    /// A boolean qualified with the time of the item it was derived from
    pub fn boolean_at(value: bool, effective: Option<DateTime<Utc>>) -> Self {
        Self::Item(ResultItem {
            value: ResultValue::Boolean(value),
            effective,
        })
    }

    pub fn numeric(value: f64) -> Self {
        Self::Item(ResultItem::new(ResultValue::Numeric(value)))
    }

    /// Result for a literal value; `Null` is empty
    pub fn from_value(value: Value) -> Self {
        ResultValue::from_value(value).map_or(Self::Empty, |v| Self::Item(ResultItem::new(v)))
    }

    /// Truth value for logical operators.
    ///
    /// `Empty` counts as false; a boolean item, or an observation with a boolean value,
    /// gives its value. Anything else is not boolean-valued and returns `None`.
    pub fn truth(&self) -> Option<bool> {
        match self {
            Self::Empty => Some(false),
            Self::Item(item) => item.to_value().as_boolean(),
            Self::Sequence(_) => None,
        }
    }

    pub fn items(&self) -> &[ResultItem] {
        match self {
            Self::Empty => &[],
            Self::Item(item) => std::slice::from_ref(item),
            Self::Sequence(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<ResultItem> {
        match self {
            Self::Empty => Vec::new(),
            Self::Item(item) => vec![item],
            Self::Sequence(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether at least one item is present
    pub fn exists(&self) -> bool {
        !self.is_empty()
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Item(item) => item.to_value().as_boolean(),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Item(item) => item.to_value().as_number(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Item(item) => item.to_value().as_text().map(str::to_string),
            _ => None,
        }
    }

    /// Effective time of a single item
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Item(item) => item.time(),
            _ => None,
        }
    }

    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Item(item) => item.value.type_name(),
            Self::Sequence(_) => "Sequence",
        }
    }
}

impl fmt::Display for LogicResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "(empty)"),
            Self::Item(item) => write!(f, "{}", item),
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_sequence_normalizes() {
        assert_eq!(LogicResult::sequence(Vec::new()), LogicResult::Empty);
        assert!(!LogicResult::sequence(Vec::new()).exists());
    }

    #[test]
    fn test_truth() {
        assert_eq!(LogicResult::Empty.truth(), Some(false));
        assert_eq!(LogicResult::boolean(true).truth(), Some(true));
        assert_eq!(LogicResult::numeric(1.0).truth(), None);

        let flag = Arc::new(Observation::new("p1", "HIV POSITIVE", true, day(3)));
        assert_eq!(LogicResult::item(ResultItem::observation(flag)).truth(), Some(true));
    }

    #[test]
    fn test_item_time_falls_back_to_datetime_value() {
        let item = ResultItem::new(ResultValue::Datetime(day(5)));
        assert_eq!(item.time(), Some(day(5)));
        assert_eq!(ResultItem::new(ResultValue::Numeric(1.0)).time(), None);
    }

    #[test]
    fn test_integer_literal_is_numeric() {
        assert_eq!(LogicResult::from_value(Value::Integer(3)), LogicResult::numeric(3.0));
        assert_eq!(LogicResult::from_value(Value::Null), LogicResult::Empty);
    }

    #[test]
    fn test_display() {
        let obs = Arc::new(Observation::new("p1", "CD4 COUNT", 180.0, day(2)));
        let result = LogicResult::sequence(vec![
            ResultItem::observation(obs),
            ResultItem::new(ResultValue::Boolean(false)),
        ]);
        assert_eq!(result.to_string(), "[CD4 COUNT 180 @ 2024-01-02T00:00:00, false]");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(LogicResult::boolean_at(true, Some(day(1)))).unwrap();
        assert_eq!(json["kind"], "item");
        assert_eq!(json["value"]["value"]["type"], "Boolean");
        assert_eq!(json["value"]["effective"], "2024-01-01T00:00:00Z");
        assert_eq!(serde_json::to_value(LogicResult::Empty).unwrap()["kind"], "empty");
    }
}
