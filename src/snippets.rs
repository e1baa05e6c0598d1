//! Snippets module: aggregates value statistics that size filter widgets.
//!
//! Features arrive page by page. [`get_snippet_adjustments`] computes the
//! statistics of one page; [`AdjustmentAccumulator`] merges the pages of one
//! aggregation run and freezes once the last page is in.

use crate::context::AttributeSource;
use crate::date::{parse_date, snippet_date_compare};
use crate::rule::{AttrName, Operator, SnippetId};
use crate::FilterError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnippetType {
    Dropdown,
    Checkbox,
    Slider,
    SliderRange,
    Date,
    DateRange,
    FeatureInfo,
    /// Widgets without value statistics, e.g. free text inputs.
    #[serde(other)]
    Other,
}

/// A configured filter widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_id: Option<SnippetId>,
    #[serde(rename = "type")]
    pub snippet_type: SnippetType,
    #[serde(default)]
    pub attr_name: Option<AttrName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SnippetConfig {
    pub fn new(snippet_type: SnippetType, attr_name: impl Into<AttrName>) -> Self {
        Self {
            snippet_id: None,
            snippet_type,
            attr_name: Some(attr_name.into()),
            operator: None,
            format: None,
            title: None,
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

    /// The configured id, or the snippet's position in its list.
    pub fn id_or_index(&self, index: usize) -> SnippetId {
        self.snippet_id.clone().unwrap_or(SnippetId::Index(index as u64))
    }

    /// Non-empty attribute names of this snippet.
    pub fn attr_names(&self) -> Vec<&str> {
        self.attr_name
            .iter()
            .flat_map(|a| a.names())
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// Statistics for one snippet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Adjustment {
    /// Distinct values in first-seen order (dropdown, checkbox).
    Values { value: Vec<String> },
    /// Numeric bounds (slider, sliderRange).
    Range { min: f64, max: f64 },
    /// Date bounds as the original strings (date, dateRange).
    DateRange { min: String, max: String },
    /// Distinct values per attribute in first-seen order (featureInfo).
    AttrValues(BTreeMap<String, Vec<String>>),
}

/// Lifecycle flags of an aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Lifecycle {
    pub start: bool,
    pub finish: bool,
}

impl Lifecycle {
    pub fn for_page(page: u32, total: Option<u32>) -> Self {
        Self {
            start: page == 1,
            finish: total == Some(page),
        }
    }
}

/// The statistics of one page, keyed by snippet id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetAdjustments {
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    #[serde(flatten)]
    pub adjustments: BTreeMap<SnippetId, Adjustment>,
}

/// Flattens the attribute names of all snippets into one list, in order.
pub fn get_list_of_relevant_attr_names(snippets: &[SnippetConfig]) -> Vec<String> {
    snippets
        .iter()
        .flat_map(|s| s.attr_names())
        .map(str::to_string)
        .collect()
}

/// Reads every named attribute of every feature as a string, grouped by name.
///
/// Values keep their order and duplicates; missing and null attributes are skipped.
pub fn get_attr_values_of_items_grouped_by_attr_names<F: AttributeSource>(
    features: &[F],
    attr_names: &[String],
) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for name in attr_names {
        grouped.entry(name.clone()).or_default();
    }
    for feature in features {
        for name in attr_names {
            if let Some(value) = feature.get(name).filter(|v| !v.is_null()) {
                if let Some(values) = grouped.get_mut(name) {
                    values.push(value.to_string());
                }
            }
        }
    }
    grouped
}

/// Computes the snippet statistics of one page of features.
///
/// Returns `None` for page 0; pages are numbered from 1. The lifecycle flags
/// report `start` on page 1 and `finish` when `page == total`.
pub fn get_snippet_adjustments<F: AttributeSource>(
    snippets: &[SnippetConfig],
    features: &[F],
    page: u32,
    total: Option<u32>,
) -> Option<SnippetAdjustments> {
    if page == 0 {
        return None;
    }
    let attr_names = get_list_of_relevant_attr_names(snippets);
    let grouped = get_attr_values_of_items_grouped_by_attr_names(features, &attr_names);
    let mut adjustments = BTreeMap::new();
    for (index, snippet) in snippets.iter().enumerate() {
        if let Some(adjustment) = adjust_snippet(snippet, &grouped) {
            adjustments.insert(snippet.id_or_index(index), adjustment);
        }
    }
    debug!(
        "page {}/{:?}: {} features, {} adjustments",
        page,
        total,
        features.len(),
        adjustments.len()
    );
    Some(SnippetAdjustments {
        lifecycle: Lifecycle::for_page(page, total),
        adjustments,
    })
}

fn adjust_snippet(snippet: &SnippetConfig, grouped: &HashMap<String, Vec<String>>) -> Option<Adjustment> {
    let names = snippet.attr_names();
    let first = *names.first()?;
    let values_of = |name: &str| grouped.get(name).map(Vec::as_slice).unwrap_or_default();
    let format = snippet.format.as_deref();
    match snippet.snippet_type {
        SnippetType::Dropdown | SnippetType::Checkbox => {
            let mut value = Vec::new();
            for &name in &names {
                push_unique(&mut value, values_of(name));
            }
            (!value.is_empty()).then_some(Adjustment::Values { value })
        }
        SnippetType::Slider => {
            let (min, max) = numeric_bounds(values_of(first))?;
            Some(Adjustment::Range { min, max })
        }
        SnippetType::SliderRange => {
            let until = names.get(1).copied().unwrap_or(first);
            let (min, _) = numeric_bounds(values_of(first))?;
            let (_, max) = numeric_bounds(values_of(until))?;
            Some(Adjustment::Range { min, max })
        }
        SnippetType::Date => {
            let (min, max) = date_bounds(values_of(first), format)?;
            Some(Adjustment::DateRange { min, max })
        }
        SnippetType::DateRange => {
            let until = names.get(1).copied().unwrap_or(first);
            let (min, _) = date_bounds(values_of(first), format)?;
            let (_, max) = date_bounds(values_of(until), format)?;
            Some(Adjustment::DateRange { min, max })
        }
        SnippetType::FeatureInfo => {
            let mut per_attr = BTreeMap::new();
            for &name in &names {
                let mut unique = Vec::new();
                push_unique(&mut unique, values_of(name));
                per_attr.insert(name.to_string(), unique);
            }
            Some(Adjustment::AttrValues(per_attr))
        }
        SnippetType::Other => None,
    }
}

fn push_unique(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

fn numeric_bounds(values: &[String]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .fold(None, |acc, n| match acc {
            None => Some((n, n)),
            Some((min, max)) => Some((f64::min(min, n), f64::max(max, n))),
        })
}

// Unparsable dates are left out of the bounds.
fn date_bounds(values: &[String], format: Option<&str>) -> Option<(String, String)> {
    let mut valid = values.iter().filter(|v| parse_date(v, format).is_some());
    let first = valid.next()?;
    let (mut min, mut max) = (first, first);
    for value in valid {
        if snippet_date_compare(value, min, format) == Ordering::Less {
            min = value;
        }
        if snippet_date_compare(value, max, format) == Ordering::Greater {
            max = value;
        }
    }
    Some((min.clone(), max.clone()))
}

fn merge_adjustment(existing: &mut Adjustment, incoming: Adjustment, format: Option<&str>) {
    match (existing, incoming) {
        (Adjustment::Values { value }, Adjustment::Values { value: more }) => push_unique(value, &more),
        (Adjustment::Range { min, max }, Adjustment::Range { min: lo, max: hi }) => {
            *min = f64::min(*min, lo);
            *max = f64::max(*max, hi);
        }
        (Adjustment::DateRange { min, max }, Adjustment::DateRange { min: lo, max: hi }) => {
            if snippet_date_compare(&lo, min, format) == Ordering::Less {
                *min = lo;
            }
            if snippet_date_compare(&hi, max, format) == Ordering::Greater {
                *max = hi;
            }
        }
        (Adjustment::AttrValues(per_attr), Adjustment::AttrValues(more)) => {
            for (name, values) in more {
                push_unique(per_attr.entry(name).or_default(), &values);
            }
        }
        (existing, incoming) => *existing = incoming,
    }
}

/// Running statistics over all pages of one aggregation run.
///
/// Page 1 starts a new run and clears earlier results. Once `page == total`
/// has been ingested the accumulator is frozen until the next page 1.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentAccumulator {
    adjustments: BTreeMap<SnippetId, Adjustment>,
    finished: bool,
}

impl AdjustmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregates one page and merges it into the running result.
    ///
    /// The returned flags carry `finish: true` exactly once per run.
    pub fn ingest<F: AttributeSource>(
        &mut self,
        snippets: &[SnippetConfig],
        features: &[F],
        page: u32,
        total: Option<u32>,
    ) -> Result<Lifecycle, FilterError> {
        if page == 1 {
            self.adjustments.clear();
            self.finished = false;
        } else if self.finished {
            warn!("page {} arrived after aggregation finished", page);
            return Err(FilterError::AccumulatorFrozen);
        }
        let page_result =
            get_snippet_adjustments(snippets, features, page, total).ok_or(FilterError::InvalidPage(page))?;
        let formats: HashMap<SnippetId, Option<&str>> = snippets
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id_or_index(i), s.format.as_deref()))
            .collect();
        for (id, incoming) in page_result.adjustments {
            let format = formats.get(&id).copied().flatten();
            match self.adjustments.get_mut(&id) {
                Some(existing) => merge_adjustment(existing, incoming, format),
                None => {
                    self.adjustments.insert(id, incoming);
                }
            }
        }
        self.finished = page_result.lifecycle.finish;
        Ok(page_result.lifecycle)
    }

    pub fn get(&self, snippet_id: &SnippetId) -> Option<&Adjustment> {
        self.adjustments.get(snippet_id)
    }

    pub fn adjustments(&self) -> &BTreeMap<SnippetId, Adjustment> {
        &self.adjustments
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_adjustments(self) -> BTreeMap<SnippetId, Adjustment> {
        self.adjustments
    }
}
