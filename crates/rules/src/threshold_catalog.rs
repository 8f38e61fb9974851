//! ThresholdCatalog rule kind: fixed engineering bounds per KPI.
//!
//! The compiled [`ThresholdCatalog`] is immutable and keyed by [`KpiName`],
//! so every lookup is case-insensitive. KPIs missing from the catalog get an
//! empty [`ThresholdPair`] and are analyzed on statistics alone.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use ckpi_core::KpiName;

use crate::loader::{Result, RuleError};
use crate::schema::CommonMetadata;

const BUILTIN_YAML: &str = include_str!("../../../data/rules/thresholds.yml");

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ThresholdCatalog rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdCatalogRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ThresholdCatalogSpec,
}

/// Specification section of a ThresholdCatalog rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdCatalogSpec {
    /// KPI name → bounds, in declaration order.
    pub kpis: IndexMap<String, ThresholdPair>,
}

/// Domain bounds for one KPI. Either side may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
}

impl ThresholdPair {
    pub const NONE: ThresholdPair = ThresholdPair {
        low: None,
        high: None,
    };

    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self { low, high }
    }

    pub fn is_unbounded(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Immutable KPI → threshold lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdCatalog {
    id: String,
    entries: IndexMap<KpiName, ThresholdPair>,
}

impl ThresholdCatalogRule {
    /// Compile into a lookup table.
    ///
    /// Names that collide case-insensitively are rejected. Inverted bounds
    /// are kept as given and only logged.
    pub fn compile(&self) -> Result<ThresholdCatalog> {
        let mut entries = IndexMap::with_capacity(self.spec.kpis.len());
        for (name, pair) in &self.spec.kpis {
            let kpi = KpiName::new(name.as_str());
            if let (Some(low), Some(high)) = (pair.low, pair.high) {
                if low >= high {
                    warn!(kpi = %kpi, low, high, "threshold low bound is not below high bound");
                }
            }
            if entries.insert(kpi.clone(), *pair).is_some() {
                return Err(RuleError::Validation(format!(
                    "catalog '{}' lists KPI '{}' more than once (names are case-insensitive)",
                    self.metadata.id, kpi
                )));
            }
        }
        Ok(ThresholdCatalog {
            id: self.metadata.id.clone(),
            entries,
        })
    }
}

impl ThresholdCatalog {
    /// The catalog shipped in `data/rules/thresholds.yml`.
    pub fn builtin() -> Result<Self> {
        let rule: ThresholdCatalogRule = serde_yaml::from_str(BUILTIN_YAML)?;
        rule.compile()
    }

    /// Build a catalog directly from (name, pair) entries.
    pub fn from_entries<I, S>(id: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ThresholdPair)>,
        S: Into<KpiName>,
    {
        Self {
            id: id.into(),
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Bounds for `kpi`, or [`ThresholdPair::NONE`] when the KPI is unknown.
    pub fn lookup(&self, kpi: &str) -> ThresholdPair {
        self.get(&KpiName::new(kpi))
    }

    pub fn get(&self, kpi: &KpiName) -> ThresholdPair {
        self.entries.get(kpi).copied().unwrap_or(ThresholdPair::NONE)
    }

    pub fn contains(&self, kpi: &str) -> bool {
        self.entries.contains_key(&KpiName::new(kpi))
    }

    /// Catalog KPIs in declaration order.
    pub fn kpi_names(&self) -> Vec<KpiName> {
        self.entries.keys().cloned().collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
