//! Config module: filter configuration of map layers.
//!
//! A configuration lists the filterable layers and, per layer, the snippets
//! shown to the user. It is read from JSON.

use crate::rule::SnippetId;
use crate::snippets::SnippetConfig;
use crate::FilterError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStrategy {
    /// Filter as soon as a snippet changes.
    #[default]
    Passive,
    /// Filter only when the user asks for it.
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerFilter {
    pub layer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub strategy: FilterStrategy,
    #[serde(default)]
    pub search_in_map_extent: bool,
    /// WFS endpoint used for attribute type discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typename: Option<String>,
    #[serde(default)]
    pub snippets: Vec<SnippetConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub layers: Vec<LayerFilter>,
}

impl FilterConfig {
    /// Parses a configuration and gives every snippet without an id its position.
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        let mut config: FilterConfig =
            serde_json::from_str(json).map_err(|e| FilterError::Config(e.to_string()))?;
        config.assign_snippet_ids();
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FilterError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&LayerFilter> {
        self.layers.iter().find(|l| l.layer_id == layer_id)
    }

    fn assign_snippet_ids(&mut self) {
        for layer in &mut self.layers {
            for (index, snippet) in layer.snippets.iter_mut().enumerate() {
                if snippet.snippet_id.is_none() {
                    snippet.snippet_id = Some(SnippetId::Index(index as u64));
                }
            }
        }
    }
}
