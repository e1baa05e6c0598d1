//! Schema module: the attribute-name to semantic-type registry of a feature type.
//!
//! This module provides the AttrTypeMap type and its builder. A map is built
//! once per schema discovery and is read-only afterwards.

use crate::types::AttrType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrTypeMap {
    types: HashMap<String, AttrType>,
}

impl AttrTypeMap {
    pub fn get(&self, attr_name: &str) -> Option<AttrType> {
        self.types.get(attr_name).copied()
    }

    pub fn contains(&self, attr_name: &str) -> bool {
        self.types.contains_key(attr_name)
    }

    pub fn types(&self) -> &HashMap<String, AttrType> {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Attribute names in sorted order.
    pub fn attr_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Default)]
pub struct AttrTypeMapBuilder {
    types: HashMap<String, AttrType>,
}

impl AttrTypeMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, attr_name: impl Into<String>, ty: AttrType) -> Self {
        self.insert(attr_name, ty);
        self
    }

    pub fn insert(&mut self, attr_name: impl Into<String>, ty: AttrType) {
        self.types.insert(attr_name.into(), ty);
    }

    pub fn build(self) -> AttrTypeMap {
        AttrTypeMap { types: self.types }
    }
}
