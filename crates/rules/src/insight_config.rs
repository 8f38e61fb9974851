//! InsightConfig rule kind: volatility ratio and sensitivity defaults for
//! actionable insight classification.

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

const BUILTIN_YAML: &str = include_str!("../../../data/rules/insight.yml");

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level InsightConfig rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InsightConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: InsightConfigSpec,
}

/// Specification section of an InsightConfig rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InsightConfigSpec {
    /// A group is actionable when extrema exceed `rows * volatility_ratio`.
    #[serde(default = "default_volatility_ratio")]
    pub volatility_ratio: f64,
    /// Sensitivity used when the caller does not pick one.
    #[serde(default = "default_sensitivity")]
    pub default_sensitivity: f64,
    /// Text attached to every actionable row.
    #[serde(default = "default_action_label")]
    pub action_label: String,
}

fn default_volatility_ratio() -> f64 {
    0.2
}

fn default_sensitivity() -> f64 {
    1.0
}

fn default_action_label() -> String {
    "High uncertainty → Technician check".to_string()
}

impl Default for InsightConfigSpec {
    fn default() -> Self {
        Self {
            volatility_ratio: default_volatility_ratio(),
            default_sensitivity: default_sensitivity(),
            action_label: default_action_label(),
        }
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Pre-compiled insight config (the spec is already typed).
pub type CompiledInsightConfig = InsightConfigSpec;

impl InsightConfigRule {
    /// Validate and compile the YAML config.
    pub fn compile(&self) -> Result<CompiledInsightConfig> {
        let spec = &self.spec;
        if !spec.volatility_ratio.is_finite() || spec.volatility_ratio < 0.0 {
            return Err(RuleError::Validation(format!(
                "insight config '{}': volatility_ratio must be >= 0, got {}",
                self.metadata.id, spec.volatility_ratio
            )));
        }
        if !spec.default_sensitivity.is_finite() || spec.default_sensitivity <= 0.0 {
            return Err(RuleError::Validation(format!(
                "insight config '{}': default_sensitivity must be > 0, got {}",
                self.metadata.id, spec.default_sensitivity
            )));
        }
        Ok(spec.clone())
    }
}

impl InsightConfigSpec {
    /// The config shipped in `data/rules/insight.yml`.
    pub fn builtin() -> Result<Self> {
        let rule: InsightConfigRule = serde_yaml::from_str(BUILTIN_YAML)?;
        rule.compile()
    }
}
