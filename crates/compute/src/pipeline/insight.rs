//! Actionable-insight classification over group summaries.
//!
//! A group is actionable when its extrema rate exceeds the volatility ratio:
//! `(peaks + lows) > rows * ratio`. Each actionable group gets a remedy code
//! derived from its extrema count, `(count % 3) + 1`.

use std::fmt;

use serde::Serialize;

use ckpi_core::{KpiName, Label};
use ckpi_rules::InsightConfigSpec;

use super::aggregate::GroupSummary;

pub const DEFAULT_VOLATILITY_RATIO: f64 = 0.2;

pub const DEFAULT_ACTION_LABEL: &str = "High uncertainty → Technician check";

/// Suggested follow-up for an actionable group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub enum RemedyCode {
    Code1,
    Code2,
    Code3,
}

impl RemedyCode {
    pub fn for_extrema_count(count: usize) -> Self {
        match count % 3 {
            0 => Self::Code1,
            1 => Self::Code2,
            _ => Self::Code3,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Code1 => 1,
            Self::Code2 => 2,
            Self::Code3 => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Code1 => "Follow solution 1",
            Self::Code2 => "Follow solution 2",
            Self::Code3 => "This is the reason for the error",
        }
    }
}

impl From<RemedyCode> for u8 {
    fn from(code: RemedyCode) -> Self {
        code.code()
    }
}

impl fmt::Display for RemedyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One actionable group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRow {
    pub kpi: KpiName,
    pub floor: Label,
    pub action_needed: bool,
    pub action: String,
    pub remedy: RemedyCode,
    pub remedy_text: String,
    pub peaks: usize,
    pub lows: usize,
    pub rows: usize,
}

/// Flags volatile groups. Holds no state between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightClassifier {
    volatility_ratio: f64,
    action_label: String,
}

impl Default for InsightClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_VOLATILITY_RATIO)
    }
}

impl From<&InsightConfigSpec> for InsightClassifier {
    fn from(spec: &InsightConfigSpec) -> Self {
        Self::new(spec.volatility_ratio).with_action_label(spec.action_label.clone())
    }
}

impl InsightClassifier {
    pub fn new(volatility_ratio: f64) -> Self {
        Self {
            volatility_ratio,
            action_label: DEFAULT_ACTION_LABEL.to_string(),
        }
    }

    pub fn with_action_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = label.into();
        self
    }

    pub fn volatility_ratio(&self) -> f64 {
        self.volatility_ratio
    }

    pub fn action_label(&self) -> &str {
        &self.action_label
    }

    /// Zero-row groups are never actionable.
    pub fn is_actionable(&self, summary: &GroupSummary) -> bool {
        summary.rows > 0
            && summary.extrema_count() as f64 > summary.rows as f64 * self.volatility_ratio
    }

    /// Actionable rows in input order.
    pub fn classify(&self, summaries: &[GroupSummary]) -> Vec<InsightRow> {
        summaries
            .iter()
            .filter(|s| self.is_actionable(s))
            .map(|s| {
                let remedy = RemedyCode::for_extrema_count(s.extrema_count());
                InsightRow {
                    kpi: s.kpi.clone(),
                    floor: s.floor.clone(),
                    action_needed: true,
                    action: self.action_label.clone(),
                    remedy,
                    remedy_text: remedy.description().to_string(),
                    peaks: s.peaks,
                    lows: s.lows,
                    rows: s.rows,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(peaks: usize, lows: usize, rows: usize) -> GroupSummary {
        GroupSummary {
            kpi: KpiName::new("doorfriction"),
            floor: Label::Int(1),
            peaks,
            lows,
            rows,
        }
    }

    #[test]
    fn remedy_cycles_through_table() {
        assert_eq!(RemedyCode::for_extrema_count(0), RemedyCode::Code1);
        assert_eq!(RemedyCode::for_extrema_count(1), RemedyCode::Code2);
        assert_eq!(RemedyCode::for_extrema_count(2), RemedyCode::Code3);
        assert_eq!(RemedyCode::for_extrema_count(4), RemedyCode::Code2);
        assert_eq!(RemedyCode::Code3.description(), "This is the reason for the error");
        assert_eq!(RemedyCode::Code2.to_string(), "Follow solution 2");
    }

    #[test]
    fn remedy_serializes_as_number() {
        assert_eq!(serde_json::to_string(&RemedyCode::Code3).unwrap(), "3");
    }

    #[test]
    fn ratio_threshold_is_strict() {
        let c = InsightClassifier::default();
        assert!(c.is_actionable(&summary(1, 1, 5)));
        assert!(!c.is_actionable(&summary(1, 0, 10)));
        // 2 == 10 * 0.2 is not above the ratio.
        assert!(!c.is_actionable(&summary(1, 1, 10)));
    }

    #[test]
    fn zero_rows_never_actionable() {
        let c = InsightClassifier::new(0.0);
        assert!(!c.is_actionable(&summary(0, 0, 0)));
        assert!(!c.is_actionable(&summary(0, 0, 4)));
    }

    #[test]
    fn classify_keeps_order_and_fills_row() {
        let mut second = summary(3, 1, 6);
        second.floor = Label::Int(7);
        let summaries = vec![summary(1, 1, 5), summary(0, 1, 50), second];

        let rows = InsightClassifier::default().classify(&summaries);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].floor, Label::Int(1));
        assert_eq!(rows[0].remedy, RemedyCode::Code3);
        assert_eq!(rows[1].floor, Label::Int(7));
        assert_eq!(rows[1].remedy, RemedyCode::Code2);
        assert_eq!(rows[1].remedy_text, "Follow solution 2");
        assert_eq!(rows[1].action, DEFAULT_ACTION_LABEL);
        assert!(rows.iter().all(|r| r.action_needed));
        assert_eq!((rows[1].peaks, rows[1].lows, rows[1].rows), (3, 1, 6));
    }

    #[test]
    fn classifier_from_insight_config() {
        let spec = InsightConfigSpec {
            volatility_ratio: 0.5,
            default_sensitivity: 1.0,
            action_label: "Inspect".to_string(),
        };
        let c = InsightClassifier::from(&spec);
        assert_eq!(c.volatility_ratio(), 0.5);
        assert_eq!(c.action_label(), "Inspect");
        assert!(!c.is_actionable(&summary(1, 1, 5)));
    }
}
