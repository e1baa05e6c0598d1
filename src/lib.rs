//! Featurefilter: an attribute-rule filter engine for map features.
//!
//! The crate evaluates typed comparison, range and set operators against the
//! attributes of map features, discovers attribute types through WFS
//! `DescribeFeatureType`, and aggregates value statistics over paginated
//! feature batches so filter widgets ("snippets") can size themselves.
//!
//! # Architecture
//! - Values and semantic attribute types ([`Value`], [`AttrType`])
//! - Feature access ([`AttributeSource`], [`Feature`])
//! - Rules and their evaluation ([`Rule`], [`check_rule`], [`check_rules`], [`RuleSet`])
//! - Schema discovery ([`describe_feature_type_wfs`], [`AttrTypeMap`])
//! - Snippet aggregation ([`get_snippet_adjustments`], [`AdjustmentAccumulator`])
//! - Configuration ([`FilterConfig`])

mod config;
mod context;
mod date;
mod describe;
mod evaluator;
mod filter;
mod rule;
mod schema;
mod snippets;
mod types;

pub use config::*;
pub use context::*;
pub use date::*;
pub use describe::*;
pub use evaluator::*;
pub use filter::*;
pub use rule::*;
pub use schema::*;
pub use snippets::*;
pub use types::*;

use thiserror::Error;

/// Unified error type for featurefilter operations.
///
/// The first six variants are the schema discovery failures, listed in the
/// order the response validation pipeline checks them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("invalid response: the response carries no XML document")]
    InvalidResponse,
    #[error("empty response: the XML document has no child elements")]
    EmptyResponse,
    #[error("invalid schema: the schema root is not an element")]
    InvalidSchema,
    #[error("empty schema: the schema has no child elements")]
    EmptySchema,
    #[error("{0}")]
    ServiceException(String),
    #[error("unknown typename: {0}")]
    UnknownTypename(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("the accumulator is frozen, aggregation already finished")]
    AccumulatorFrozen,
    #[error("invalid page number {0}, pages start at 1")]
    InvalidPage(u32),
}
