//! Types module: defines attribute values and semantic attribute types.
//!
//! This module provides the Value and AttrType enums and the conversion from
//! XML Schema type names to semantic types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a feature attribute, as discovered from a remote schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    String,
    Number,
    Boolean,
    Date,
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::String => "string",
            AttrType::Number => "number",
            AttrType::Boolean => "boolean",
            AttrType::Date => "date",
        };
        f.write_str(name)
    }
}

/// Maps an XML Schema type name such as `xsd:integer` to its semantic type.
///
/// The namespace prefix is ignored and unknown names fall back to
/// [`AttrType::String`].
pub fn convert_attr_type_xml(xsd_type: &str) -> AttrType {
    let local = xsd_type.rsplit(':').next().unwrap_or(xsd_type);
    match local.to_ascii_lowercase().as_str() {
        "integer" | "int" | "long" | "short" | "decimal" | "double" | "float" => AttrType::Number,
        "boolean" => AttrType::Boolean,
        "date" | "datetime" => AttrType::Date,
        _ => AttrType::String,
    }
}

/// A single attribute value read from a feature or carried by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Shared null value handed out for missing attributes.
pub static NULL: Value = Value::Null;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric reading of this value: numbers as-is, strings if they parse as
    /// a finite float. `NaN`, infinities and everything else yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            Value::Null | Value::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Lower-cased string form, used by every case-insensitive comparison.
    pub fn to_lowercase_string(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // Integral floats print without a fraction: 4.0 -> "4"
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_convert_attr_type_xml() {
        assert_eq!(convert_attr_type_xml("xsd:integer"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:int"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:long"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:short"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:decimal"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:double"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:float"), AttrType::Number);
        assert_eq!(convert_attr_type_xml("xsd:boolean"), AttrType::Boolean);
        assert_eq!(convert_attr_type_xml("xsd:date"), AttrType::Date);
        assert_eq!(convert_attr_type_xml("xsd:dateTime"), AttrType::Date);
        assert_eq!(convert_attr_type_xml("xsd:string"), AttrType::String);
    }

    #[test]
    fn test_convert_attr_type_xml_unknown_defaults_to_string() {
        assert_eq!(convert_attr_type_xml(""), AttrType::String);
        assert_eq!(convert_attr_type_xml("gml:PointPropertyType"), AttrType::String);
        assert_eq!(convert_attr_type_xml("double"), AttrType::Number);
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::from(3).as_number(), Some(3.0));
        assert_eq!(Value::from(" 2.5 ").as_number(), Some(2.5));
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::from(f64::NAN).as_number(), None);
        assert_eq!(Value::from("Infinity").as_number(), None);
        assert_eq!(Value::from("-inf").as_number(), None);
        assert_eq!(Value::from(f64::INFINITY).as_number(), None);
        assert_eq!(Value::from(true).as_number(), None);
        assert_eq!(Value::Null.as_number(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(4.0).to_string(), "4");
        assert_eq!(Value::from(-1.5).to_string(), "-1.5");
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(Value::from("Foo").to_lowercase_string(), "foo");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_serialization_deserialization() {
        let vals: Vec<Value> = serde_json::from_str(r#"[null, true, 1, 2.5, "x"]"#).unwrap();
        assert_eq!(
            vals,
            vec![Value::Null, Value::Bool(true), Value::Number(1.0), Value::Number(2.5), Value::from("x")]
        );
        let json = serde_json::to_string(&AttrType::Date).unwrap();
        assert_eq!(json, "\"date\"");
    }
}
