use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// KPI identity that compares case-insensitively.
///
/// The original spelling is kept for display; equality, hashing and ordering
/// use only the lowercase key, so a `KpiName` can be used directly as a map
/// key at every lookup boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KpiName {
    display: String,
    key: String,
}

impl KpiName {
    pub fn new(name: impl Into<String>) -> Self {
        let display: String = name.into().trim().to_string();
        let key = display.to_lowercase();
        Self { display, key }
    }

    /// Spelling as first seen (catalog or source file).
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Lowercase identity key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Case-insensitive comparison against a raw name.
    pub fn matches(&self, other: &str) -> bool {
        self.key == other.trim().to_lowercase()
    }
}

impl PartialEq for KpiName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for KpiName {}

impl Hash for KpiName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for KpiName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KpiName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for KpiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<String> for KpiName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for KpiName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<KpiName> for String {
    fn from(k: KpiName) -> Self {
        k.display
    }
}

/// Opaque, comparable identifier for floors and equipment.
///
/// Integers sort numerically and before any text label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl Label {
    /// Parse a raw cell. Integral floats such as `"3.0"` become `Int(3)`.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Label::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                return Label::Int(f as i64);
            }
        }
        Label::Text(s.to_string())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::parse(s)
    }
}

/// One KPI reading for a piece of equipment on a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub kpi: KpiName,
    pub floor: Label,
    pub equipment: Label,
    /// `None` when the source value was missing or not a finite number.
    pub ave: Option<f64>,
}

impl Measurement {
    pub fn new(
        timestamp: NaiveDateTime,
        kpi: impl Into<KpiName>,
        floor: impl Into<Label>,
        equipment: impl Into<Label>,
        ave: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            kpi: kpi.into(),
            floor: floor.into(),
            equipment: equipment.into(),
            ave: coerce_value(ave),
        }
    }
}

/// Normalize a numeric reading: NaN and infinities count as missing.
pub fn coerce_value(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Parse a raw numeric cell, treating anything unparseable as missing.
pub fn parse_value(raw: &str) -> Option<f64> {
    coerce_value(raw.trim().parse::<f64>().ok())
}
