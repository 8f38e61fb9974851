//! Rule document schema shared by every rule kind.
//!
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `RuleDocument`: enum dispatching to kind-specific types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::insight_config::InsightConfigRule;
use crate::threshold_catalog::ThresholdCatalogRule;

// ── Rule kind enum ──────────────────────────────────────────────────

/// Supported rule kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    ThresholdCatalog,
    InsightConfig,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::ThresholdCatalog => write!(f, "ThresholdCatalog"),
            RuleKind::InsightConfig => write!(f, "InsightConfig"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ThresholdCatalog" => Ok(RuleKind::ThresholdCatalog),
            "InsightConfig" => Ok(RuleKind::InsightConfig),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}

// ── Rule envelope (first-pass) ──────────────────────────────────────

/// Lightweight first-pass deserializer that reads only the header fields.
///
/// Used during two-pass loading: first extract `kind` to determine the
/// concrete type, then deserialize the full document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Value,
}

impl RuleEnvelope {
    /// Parse the `kind` field into a typed [`RuleKind`].
    pub fn rule_kind(&self) -> std::result::Result<RuleKind, String> {
        self.kind.parse()
    }

    /// Two-pass: reconstruct the full YAML and deserialize into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<RuleDocument, String> {
        let yaml = serde_yaml::to_string(self).map_err(|e| e.to_string())?;
        RuleDocument::from_yaml_kind(self.rule_kind()?, &yaml)
    }
}

// ── Rule document ───────────────────────────────────────────────────

/// A fully typed rule document.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    ThresholdCatalog(ThresholdCatalogRule),
    InsightConfig(InsightConfigRule),
}

impl RuleDocument {
    /// Deserialize YAML text whose kind is already known.
    pub fn from_yaml_kind(kind: RuleKind, yaml: &str) -> std::result::Result<Self, String> {
        match kind {
            RuleKind::ThresholdCatalog => serde_yaml::from_str(yaml)
                .map(RuleDocument::ThresholdCatalog)
                .map_err(|e| e.to_string()),
            RuleKind::InsightConfig => serde_yaml::from_str(yaml)
                .map(RuleDocument::InsightConfig)
                .map_err(|e| e.to_string()),
        }
    }

    /// Get the common metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::ThresholdCatalog(rule) => &rule.metadata,
            RuleDocument::InsightConfig(rule) => &rule.metadata,
        }
    }

    /// Get the rule kind.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::ThresholdCatalog(_) => RuleKind::ThresholdCatalog,
            RuleDocument::InsightConfig(_) => RuleKind::InsightConfig,
        }
    }
}

// ── Metadata ────────────────────────────────────────────────────────

/// Metadata block shared by all rule kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Parent rule ID for inheritance. The loader deep-merges the parent's
    /// spec into this rule, with child fields taking precedence.
    #[serde(default)]
    pub extends: Option<String>,
}

fn default_true() -> bool {
    true
}
