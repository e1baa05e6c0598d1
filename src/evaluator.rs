//! Evaluator module: decides whether feature values satisfy rules.
//!
//! This module provides check_rule for a single rule against one or two
//! attribute values, and check_rules for AND-combining a rule set against a feature.

use crate::context::AttributeSource;
use crate::date::value_to_date;
use crate::rule::{Operator, Rule, RuleValue};
use crate::types::{Value, NULL};
use log::trace;
use std::cmp::Ordering;

/// Checks `value1` (and `value2` for ranges) against a single rule.
///
/// Single-value operators compare `value1` with the rule value, or with each
/// element of a list rule value where any match counts. `BETWEEN` and
/// `INTERSECTS` read `[value1, value2]` as the feature range when `value2` is
/// given. A rule without a defined value never matches.
pub fn check_rule(rule: &Rule, value1: &Value, value2: Option<&Value>) -> bool {
    let Some(rule_value) = rule.value.as_ref().filter(|v| v.is_defined()) else {
        trace!("rule on {:?} has no value, treating as no match", rule.attr_name);
        return false;
    };
    let format = rule.format.as_deref();
    match rule.operator {
        Operator::Eq => any_of(rule_value, |v| value1 == v),
        Operator::Ne => !any_of(rule_value, |v| value1 == v),
        Operator::Gt => any_of(rule_value, |v| cmp_ord(value1, v, format) == Some(Ordering::Greater)),
        Operator::Ge => any_of(rule_value, |v| {
            matches!(cmp_ord(value1, v, format), Some(Ordering::Greater | Ordering::Equal))
        }),
        Operator::Lt => any_of(rule_value, |v| cmp_ord(value1, v, format) == Some(Ordering::Less)),
        Operator::Le => any_of(rule_value, |v| {
            matches!(cmp_ord(value1, v, format), Some(Ordering::Less | Ordering::Equal))
        }),
        Operator::In => cmp_str(value1, rule_value, |hay, needle| hay.contains(needle)),
        Operator::StartsWith => cmp_str(value1, rule_value, |hay, needle| hay.starts_with(needle)),
        Operator::EndsWith => cmp_str(value1, rule_value, |hay, needle| hay.ends_with(needle)),
        Operator::Between => check_between(rule_value, value1, value2, format),
        Operator::Intersects => check_intersects(rule_value, value1, value2, format),
    }
}

/// Checks every rule against the feature; stops at the first rule that fails.
///
/// An empty rule set matches any feature.
pub fn check_rules<F: AttributeSource + ?Sized>(feature: &F, rules: &[Rule]) -> bool {
    rules.iter().all(|rule| check_feature_rule(feature, rule))
}

/// Checks one rule against a feature, resolving the attribute values it names.
pub fn check_feature_rule<F: AttributeSource + ?Sized>(feature: &F, rule: &Rule) -> bool {
    if !rule.is_well_formed() {
        trace!("skipping malformed {} rule {:?}", rule.operator, rule.snippet_id);
        return false;
    }
    if let Some((from, until)) = rule.range_attr_names() {
        let value1 = feature.get(from).unwrap_or(&NULL);
        let value2 = feature.get(until).unwrap_or(&NULL);
        return check_rule(rule, value1, Some(value2));
    }
    rule.attr_name
        .iter()
        .flat_map(|a| a.names())
        .filter(|name| !name.is_empty())
        .any(|name| check_rule(rule, feature.get(name).unwrap_or(&NULL), None))
}

fn any_of<P: FnMut(&Value) -> bool>(rule_value: &RuleValue, pred: P) -> bool {
    rule_value.values().iter().any(pred)
}

// Ordering for GT/GE/LT/LE and ranges. With a format dates win, otherwise numbers.
// Anything that reads as neither is unordered and never matches.
fn cmp_ord(a: &Value, b: &Value, format: Option<&str>) -> Option<Ordering> {
    if format.is_some() {
        cmp_dates(a, b, format).or_else(|| cmp_numbers(a, b))
    } else {
        cmp_numbers(a, b).or_else(|| cmp_dates(a, b, None))
    }
}

fn cmp_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    a.as_number()?.partial_cmp(&b.as_number()?)
}

fn cmp_dates(a: &Value, b: &Value, format: Option<&str>) -> Option<Ordering> {
    if matches!(a, Value::Number(_)) && matches!(b, Value::Number(_)) {
        return None;
    }
    Some(value_to_date(a, format)?.cmp(&value_to_date(b, format)?))
}

// Case-insensitive string test, OR-combined over list rule values.
fn cmp_str<F>(value: &Value, rule_value: &RuleValue, test: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    if value.is_null() {
        return false;
    }
    let hay = value.to_lowercase_string();
    rule_value
        .values()
        .iter()
        .filter(|v| !v.is_null())
        .any(|v| test(&hay, &v.to_lowercase_string()))
}

fn within(x: &Value, min: &Value, max: &Value, format: Option<&str>) -> bool {
    matches!(cmp_ord(x, min, format), Some(Ordering::Greater | Ordering::Equal))
        && matches!(cmp_ord(x, max, format), Some(Ordering::Less | Ordering::Equal))
}

fn check_between(rule_value: &RuleValue, value1: &Value, value2: Option<&Value>, format: Option<&str>) -> bool {
    match (rule_value.as_range(), value2) {
        // feature range [value1, value2] contained in [min, max]
        (Some((min, max)), Some(value2)) => {
            matches!(cmp_ord(value1, min, format), Some(Ordering::Greater | Ordering::Equal))
                && matches!(cmp_ord(value2, max, format), Some(Ordering::Less | Ordering::Equal))
        }
        (Some((min, max)), None) => within(value1, min, max, format),
        // rule value bounded by the two call arguments
        (None, Some(value2)) => match rule_value {
            RuleValue::Single(v) => within(v, value1, value2, format),
            RuleValue::List(_) => false,
        },
        (None, None) => false,
    }
}

fn check_intersects(rule_value: &RuleValue, value1: &Value, value2: Option<&Value>, format: Option<&str>) -> bool {
    match (rule_value.as_range(), value2) {
        // overlap unless the feature range ends before min or starts after max
        (Some((min, max)), Some(value2)) => {
            matches!(cmp_ord(value2, min, format), Some(Ordering::Greater | Ordering::Equal))
                && matches!(cmp_ord(value1, max, format), Some(Ordering::Less | Ordering::Equal))
        }
        (Some((min, max)), None) => within(value1, min, max, format),
        (None, Some(value2)) => match rule_value {
            RuleValue::Single(v) => within(v, value1, value2, format),
            RuleValue::List(_) => false,
        },
        (None, None) => false,
    }
}
