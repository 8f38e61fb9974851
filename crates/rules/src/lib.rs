//! KPI rule documents.
//!
//! This crate provides:
//! - YAML-based rule definitions with serde deserialization
//! - `ThresholdCatalog`: fixed per-KPI domain bounds, case-insensitive lookup
//! - `InsightConfig`: volatility ratio and sensitivity defaults
//! - Filesystem loader with `extends` inheritance

pub mod insight_config;
pub mod loader;
pub mod schema;
pub mod threshold_catalog;

pub use insight_config::{CompiledInsightConfig, InsightConfigRule, InsightConfigSpec};
pub use loader::{LoadResult, LoadStatus, LoadedRules, RuleError, RuleLoader};
pub use schema::{CommonMetadata, RuleDocument, RuleEnvelope, RuleKind};
pub use threshold_catalog::{ThresholdCatalog, ThresholdCatalogRule, ThresholdPair};
