//! Context module: read-only attribute access for features under evaluation.
//!
//! This module provides the AttributeSource trait and the map-backed Feature type.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Anything that can hand out attribute values by name.
///
/// Map layers supply features through this trait; the engine only reads.
pub trait AttributeSource {
    fn get(&self, attr_name: &str) -> Option<&Value>;
}

impl<S: AttributeSource + ?Sized> AttributeSource for &S {
    fn get(&self, attr_name: &str) -> Option<&Value> {
        (**self).get(attr_name)
    }
}

impl AttributeSource for HashMap<String, Value> {
    fn get(&self, attr_name: &str) -> Option<&Value> {
        HashMap::get(self, attr_name)
    }
}

impl AttributeSource for BTreeMap<String, Value> {
    fn get(&self, attr_name: &str) -> Option<&Value> {
        BTreeMap::get(self, attr_name)
    }
}

/// A feature backed by an attribute map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature {
    values: HashMap<String, Value>,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, attr_name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(attr_name.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

impl AttributeSource for Feature {
    fn get(&self, attr_name: &str) -> Option<&Value> {
        self.values.get(attr_name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Feature {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FeatureBuilder {
    values: HashMap<String, Value>,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, attr_name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(attr_name.into(), value.into());
        self
    }

    pub fn build(self) -> Feature {
        Feature { values: self.values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_set_and_get_value() {
        let mut feature = Feature::new();
        feature.set("foo", 42);
        assert_eq!(feature.get("foo"), Some(&Value::Number(42.0)));
        assert_eq!(feature.get("bar"), None);
    }

    #[test]
    fn test_builder_last_write_wins() {
        let feature = FeatureBuilder::new()
            .attr("kind", "school")
            .attr("kind", "kita")
            .build();
        assert_eq!(feature.get("kind"), Some(&Value::from("kita")));
    }

    #[test]
    fn test_plain_maps_are_attribute_sources() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), Value::from(true));
        assert_eq!(AttributeSource::get(&map, "a"), Some(&Value::Bool(true)));
        let tree: BTreeMap<String, Value> = map.into_iter().collect();
        assert_eq!(AttributeSource::get(&tree, "a"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_serialization_deserialization() {
        let feature: Feature = [("name", Value::from("Alster")), ("depth", Value::from(7.5))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&feature).unwrap();
        let deserialized: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(feature, deserialized);
        let parsed: Feature = serde_json::from_str(r#"{"name": "Elbe", "open": false}"#).unwrap();
        assert_eq!(parsed.get("open"), Some(&Value::Bool(false)));
    }
}
