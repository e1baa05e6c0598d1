//! Filter module: the active rules of a layer and their application to features.
//!
//! This module provides the RuleSet type. Snippets replace their rule whenever
//! their selection changes; the map then re-filters its features.

use crate::context::AttributeSource;
use crate::evaluator::check_rules;
use crate::rule::{Rule, SnippetId};
use log::debug;
use serde::{Deserialize, Serialize};

/// Rules keyed by snippet, at most one per snippet id.
///
/// Rules without a snippet id are kept side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `rule`, replacing the rule of the same snippet if there is one.
    pub fn set_rule(&mut self, rule: Rule) {
        let slot = rule
            .snippet_id
            .as_ref()
            .and_then(|id| self.rules.iter().position(|r| r.snippet_id.as_ref() == Some(id)));
        match slot {
            Some(i) => self.rules[i] = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn remove_rule(&mut self, snippet_id: &SnippetId) -> Option<Rule> {
        let i = self.rules.iter().position(|r| r.snippet_id.as_ref() == Some(snippet_id))?;
        Some(self.rules.remove(i))
    }

    /// Removes every rule that is not `fixed`.
    pub fn clear(&mut self) {
        self.rules.retain(|r| r.fixed);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if the feature satisfies every rule.
    pub fn matches<F: AttributeSource + ?Sized>(&self, feature: &F) -> bool {
        check_rules(feature, &self.rules)
    }

    /// The features that satisfy every rule, in their original order.
    pub fn filter<'a, F: AttributeSource>(&self, features: &'a [F]) -> Vec<&'a F> {
        let matching: Vec<&F> = features.iter().filter(|f| self.matches(*f)).collect();
        debug!("{} of {} features match {} rules", matching.len(), features.len(), self.rules.len());
        matching
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        iter.into_iter().for_each(|rule| set.set_rule(rule));
        set
    }
}
