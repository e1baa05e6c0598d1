//! Rule module: defines the runtime filter conditions produced by snippets.
//!
//! This module provides the Rule type and the Operator, AttrName, RuleValue
//! and SnippetId types it is built from.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    StartsWith,
    EndsWith,
    Between,
    Intersects,
}

impl Operator {
    /// Operators that can compare a feature range `[from, until]` against a rule range.
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between | Operator::Intersects)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Gt => "GT",
            Operator::Ge => "GE",
            Operator::Lt => "LT",
            Operator::Le => "LE",
            Operator::In => "IN",
            Operator::StartsWith => "STARTSWITH",
            Operator::EndsWith => "ENDSWITH",
            Operator::Between => "BETWEEN",
            Operator::Intersects => "INTERSECTS",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_ascii_uppercase().as_str() {
            "EQ" => Operator::Eq,
            "NE" => Operator::Ne,
            "GT" => Operator::Gt,
            "GE" => Operator::Ge,
            "LT" => Operator::Lt,
            "LE" => Operator::Le,
            "IN" => Operator::In,
            "STARTSWITH" => Operator::StartsWith,
            "ENDSWITH" => Operator::EndsWith,
            "BETWEEN" => Operator::Between,
            "INTERSECTS" => Operator::Intersects,
            _ => return Err(format!("unknown operator '{}'", s)),
        };
        Ok(op)
    }
}

/// Identifies the snippet a rule or adjustment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnippetId {
    Index(u64),
    Name(String),
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetId::Index(i) => write!(f, "{}", i),
            SnippetId::Name(n) => f.write_str(n),
        }
    }
}

impl From<u64> for SnippetId {
    fn from(i: u64) -> Self {
        SnippetId::Index(i)
    }
}

impl From<&str> for SnippetId {
    fn from(n: &str) -> Self {
        SnippetId::Name(n.to_string())
    }
}

/// One attribute name, or several.
///
/// Several names are OR-combined for single-value operators. For range
/// operators a list of exactly two names is read as a `[from, until]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrName {
    One(String),
    Many(Vec<String>),
}

impl AttrName {
    pub fn names(&self) -> &[String] {
        match self {
            AttrName::One(name) => std::slice::from_ref(name),
            AttrName::Many(names) => names,
        }
    }

    /// True if at least one non-empty name is present.
    pub fn is_usable(&self) -> bool {
        self.names().iter().any(|n| !n.is_empty())
    }
}

impl From<&str> for AttrName {
    fn from(name: &str) -> Self {
        AttrName::One(name.to_string())
    }
}

impl From<String> for AttrName {
    fn from(name: String) -> Self {
        AttrName::One(name)
    }
}

impl<const N: usize> From<[&str; N]> for AttrName {
    fn from(names: [&str; N]) -> Self {
        AttrName::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// The comparison value of a rule: a scalar, or a list.
///
/// A list means "any of" for single-value operators and `[min, max]` for
/// range operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    List(Vec<Value>),
    Single(Value),
}

impl RuleValue {
    pub fn values(&self) -> &[Value] {
        match self {
            RuleValue::Single(v) => std::slice::from_ref(v),
            RuleValue::List(vs) => vs,
        }
    }

    /// `[min, max]` if this is a list of exactly two values.
    pub fn as_range(&self) -> Option<(&Value, &Value)> {
        match self {
            RuleValue::List(vs) if vs.len() == 2 => Some((&vs[0], &vs[1])),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        match self {
            RuleValue::Single(v) => !v.is_null(),
            RuleValue::List(_) => true,
        }
    }
}

macro_rules! rule_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for RuleValue {
                fn from(v: $ty) -> Self {
                    RuleValue::Single(v.into())
                }
            }
        )*
    };
}

rule_value_from!(Value, &str, String, f64, i64, i32, bool);

impl<T: Into<Value>> From<Vec<T>> for RuleValue {
    fn from(vs: Vec<T>) -> Self {
        RuleValue::List(vs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for RuleValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        RuleValue::List(iter.into_iter().map(Into::into).collect())
    }
}

/// A filter condition, as emitted by a snippet whenever its selection changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_id: Option<SnippetId>,
    #[serde(default)]
    pub startup: bool,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub attr_name: Option<AttrName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_name_until: Option<String>,
    pub operator: Operator,
    #[serde(default)]
    pub value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_title: Option<String>,
}

impl Rule {
    pub fn new(attr_name: impl Into<AttrName>, operator: Operator, value: impl Into<RuleValue>) -> Self {
        Self {
            snippet_id: None,
            startup: false,
            fixed: false,
            attr_name: Some(attr_name.into()),
            attr_name_until: None,
            operator,
            value: Some(value.into()),
            format: None,
            tag_title: None,
        }
    }

    pub fn with_snippet_id(mut self, snippet_id: impl Into<SnippetId>) -> Self {
        self.snippet_id = Some(snippet_id.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_attr_name_until(mut self, attr_name_until: impl Into<String>) -> Self {
        self.attr_name_until = Some(attr_name_until.into());
        self
    }

    /// A rule takes part in evaluation only with a usable name and a defined value.
    pub fn is_well_formed(&self) -> bool {
        self.attr_name.as_ref().is_some_and(AttrName::is_usable)
            && self.value.as_ref().is_some_and(RuleValue::is_defined)
    }

    /// The `[from, until]` attribute pair a range operator reads from the feature.
    pub fn range_attr_names(&self) -> Option<(&str, &str)> {
        if !self.operator.is_range() {
            return None;
        }
        let names = self.attr_name.as_ref()?.names();
        match (&self.attr_name_until, names) {
            (Some(until), [from, ..]) => Some((from.as_str(), until.as_str())),
            (None, [from, until]) => Some((from.as_str(), until.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_operator_from_str() {
        assert_eq!("eq".parse::<Operator>(), Ok(Operator::Eq));
        assert_eq!("STARTSWITH".parse::<Operator>(), Ok(Operator::StartsWith));
        assert_eq!("Intersects".parse::<Operator>(), Ok(Operator::Intersects));
        assert!("LIKE".parse::<Operator>().is_err());
        assert_eq!(Operator::EndsWith.to_string(), "ENDSWITH");
    }

    #[test]
    fn test_range_attr_names() {
        let pair = Rule::new(["from", "until"], Operator::Intersects, vec![0, 10]);
        assert_eq!(pair.range_attr_names(), Some(("from", "until")));

        let until = Rule::new("from", Operator::Between, vec![0, 10])
            .with_attr_name_until("until");
        assert_eq!(until.range_attr_names(), Some(("from", "until")));

        let single = Rule::new("from", Operator::Between, vec![0, 10]);
        assert_eq!(single.range_attr_names(), None);

        let not_range = Rule::new(["a", "b"], Operator::Eq, 1);
        assert_eq!(not_range.range_attr_names(), None);
    }

    #[test]
    fn test_well_formed() {
        assert!(Rule::new("a", Operator::Eq, 1).is_well_formed());
        assert!(!Rule::new("", Operator::Eq, 1).is_well_formed());
        assert!(!Rule::new("a", Operator::Eq, Value::Null).is_well_formed());
        let mut missing = Rule::new("a", Operator::Eq, 1);
        missing.value = None;
        assert!(!missing.is_well_formed());
    }

    #[test]
    fn test_rule_emission_round_trip() {
        let json = r#"{
            "snippetId": 3,
            "startup": false,
            "fixed": true,
            "attrName": ["start", "end"],
            "operator": "INTERSECTS",
            "value": ["01.01.2020", "31.12.2020"],
            "format": "DD.MM.YYYY",
            "tagTitle": "2020"
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.snippet_id, Some(SnippetId::Index(3)));
        assert!(rule.fixed);
        assert_eq!(rule.operator, Operator::Intersects);
        assert_eq!(rule.attr_name, Some(AttrName::from(["start", "end"])));
        assert_eq!(
            rule.value.as_ref().and_then(RuleValue::as_range),
            Some((&Value::from("01.01.2020"), &Value::from("31.12.2020")))
        );
        let back: Rule = serde_json::from_str(&serde_json::to_string(&rule).unwrap()).unwrap();
        assert_eq!(rule, back);
    }

    #[test]
    fn test_rule_without_value_deserializes() {
        let rule: Rule = serde_json::from_str(r#"{"attrName": "a", "operator": "EQ"}"#).unwrap();
        assert!(!rule.is_well_formed());
    }
}
