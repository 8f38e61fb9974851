//! Selection of equipment, floors, KPIs and a date window.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use ckpi_core::{CkpiError, KpiName, Label, Measurement};

/// How many distinct equipment ids and floors are pre-selected.
pub const DEFAULT_CHOICE_COUNT: usize = 2;

/// Inclusive calendar-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// First to last measurement date, `None` for no measurements.
    pub fn spanning(measurements: &[Measurement]) -> Option<Self> {
        let dates = measurements.iter().map(|m| m.timestamp.date());
        let start = dates.clone().min()?;
        let end = dates.max()?;
        Some(Self { start, end })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Quick date windows ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePreset {
    #[default]
    Custom,
    PastWeek,
    PastMonth,
    PastThreeMonths,
    PastSixMonths,
    PastYear,
}

impl DatePreset {
    pub const ALL: [DatePreset; 6] = [
        Self::Custom,
        Self::PastWeek,
        Self::PastMonth,
        Self::PastThreeMonths,
        Self::PastSixMonths,
        Self::PastYear,
    ];

    /// Window length in days, `None` for [`DatePreset::Custom`].
    pub fn days(self) -> Option<i64> {
        match self {
            Self::Custom => None,
            Self::PastWeek => Some(7),
            Self::PastMonth => Some(30),
            Self::PastThreeMonths => Some(90),
            Self::PastSixMonths => Some(180),
            Self::PastYear => Some(365),
        }
    }

    /// `[today - days, today]`, or `None` for a custom window.
    pub fn range_ending(self, today: NaiveDate) -> Option<DateRange> {
        self.days()
            .map(|d| DateRange::new(today - Duration::days(d), today))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::PastWeek => "past-week",
            Self::PastMonth => "past-month",
            Self::PastThreeMonths => "past-3-months",
            Self::PastSixMonths => "past-6-months",
            Self::PastYear => "past-year",
        }
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePreset {
    type Err = CkpiError;

    /// Accepts `past-week`, `Past Week`, `past_week` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace([' ', '_'], "-");
        let norm = norm
            .replace("three", "3")
            .replace("six", "6");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == norm)
            .ok_or_else(|| {
                CkpiError::InvalidConfig(format!(
                    "unknown date preset '{}', expected one of: {}",
                    s,
                    Self::ALL.map(|p| p.as_str()).join(", ")
                ))
            })
    }
}

/// Sorted distinct equipment ids.
pub fn distinct_equipment(measurements: &[Measurement]) -> Vec<Label> {
    distinct(measurements.iter().map(|m| &m.equipment))
}

/// Sorted distinct floors.
pub fn distinct_floors(measurements: &[Measurement]) -> Vec<Label> {
    distinct(measurements.iter().map(|m| &m.floor))
}

fn distinct<'a>(labels: impl Iterator<Item = &'a Label>) -> Vec<Label> {
    labels.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

/// The first [`DEFAULT_CHOICE_COUNT`] entries of a sorted choice list.
pub fn default_choice(choices: &[Label]) -> Vec<Label> {
    choices.iter().take(DEFAULT_CHOICE_COUNT).cloned().collect()
}

/// What to keep before analysis. Empty lists keep nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub equipment: Vec<Label>,
    pub floors: Vec<Label>,
    pub kpis: Vec<KpiName>,
    /// `None` keeps every date.
    pub date_range: Option<DateRange>,
}

impl FilterSelection {
    /// Default selection: first two equipment ids, first two floors, the
    /// given KPIs and the full date span of the data.
    pub fn defaults_for(measurements: &[Measurement], kpis: Vec<KpiName>) -> Self {
        Self {
            equipment: default_choice(&distinct_equipment(measurements)),
            floors: default_choice(&distinct_floors(measurements)),
            kpis,
            date_range: DateRange::spanning(measurements),
        }
    }

    pub fn matches(&self, m: &Measurement) -> bool {
        self.equipment.contains(&m.equipment)
            && self.floors.contains(&m.floor)
            && self.kpis.contains(&m.kpi)
            && self
                .date_range
                .map_or(true, |r| r.contains(m.timestamp.date()))
    }

    pub fn apply(&self, measurements: &[Measurement]) -> Vec<Measurement> {
        let kept: Vec<Measurement> = measurements
            .iter()
            .filter(|m| self.matches(m))
            .cloned()
            .collect();
        debug!(before = measurements.len(), after = kept.len(), "filter applied");
        kept
    }
}
