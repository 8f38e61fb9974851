//! Per-(KPI, floor) grouping and extrema detection.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use ckpi_core::{KpiName, Label, Measurement};
use ckpi_rules::{ThresholdCatalog, ThresholdPair};

use super::extrema::{ExtremaDetector, ExtremaResult};

/// Identity of one analysed series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    pub kpi: KpiName,
    pub floor: Label,
}

/// A measurement placed in its group's chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Position in the sorted group, not the source row number.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

/// Per-group counts handed to the insight classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub kpi: KpiName,
    pub floor: Label,
    pub peaks: usize,
    pub lows: usize,
    pub rows: usize,
}

impl GroupSummary {
    /// Peaks plus lows.
    pub fn extrema_count(&self) -> usize {
        self.peaks + self.lows
    }
}

/// One group's sorted series together with its detection result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeries {
    pub key: GroupKey,
    pub thresholds: ThresholdPair,
    pub points: Vec<SeriesPoint>,
    pub extrema: ExtremaResult,
}

impl GroupSeries {
    pub fn peak_points(&self) -> Vec<&SeriesPoint> {
        self.extrema.peaks.iter().filter_map(|&i| self.points.get(i)).collect()
    }

    pub fn low_points(&self) -> Vec<&SeriesPoint> {
        self.extrema.lows.iter().filter_map(|&i| self.points.get(i)).collect()
    }

    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            kpi: self.key.kpi.clone(),
            floor: self.key.floor.clone(),
            peaks: self.extrema.peak_count(),
            lows: self.extrema.low_count(),
            rows: self.points.len(),
        }
    }
}

/// Knobs for a single aggregation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateOptions {
    pub sensitivity: f64,
    /// Detect groups on the rayon pool. Output order is the same either way.
    pub parallel: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            parallel: true,
        }
    }
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateOutput {
    /// One entry per non-empty group, in selection order then floor order.
    pub summaries: Vec<GroupSummary>,
    /// Same order as `summaries`, with the points and extrema for charting.
    pub groups: Vec<GroupSeries>,
    /// Selected KPIs that had no rows at all.
    pub empty_selections: Vec<KpiName>,
}

/// Group `measurements` by (KPI, floor) for the selected KPIs and run
/// extrema detection on each group's chronologically sorted values.
///
/// KPI matching is case-insensitive and repeated selections collapse to
/// their first occurrence. Timestamp ties keep input order.
pub fn aggregate(
    measurements: &[Measurement],
    kpi_selection: &[KpiName],
    catalog: &ThresholdCatalog,
    options: &AggregateOptions,
) -> AggregateOutput {
    let mut seen = HashSet::new();
    let selection: Vec<&KpiName> = kpi_selection
        .iter()
        .filter(|k| seen.insert(k.key().to_string()))
        .collect();
    let position: HashMap<&KpiName, usize> =
        selection.iter().enumerate().map(|(i, k)| (*k, i)).collect();

    let mut partitions: BTreeMap<(usize, Label), Vec<&Measurement>> = BTreeMap::new();
    for m in measurements {
        if let Some(&pos) = position.get(&m.kpi) {
            partitions
                .entry((pos, m.floor.clone()))
                .or_default()
                .push(m);
        }
    }

    let populated: HashSet<usize> = partitions.keys().map(|(pos, _)| *pos).collect();
    let empty_selections: Vec<KpiName> = selection
        .iter()
        .enumerate()
        .filter(|(i, _)| !populated.contains(i))
        .map(|(_, k)| (*k).clone())
        .collect();
    for kpi in &empty_selections {
        info!(kpi = %kpi, "no data for KPI selection");
    }

    let detector = ExtremaDetector::new(options.sensitivity);
    let build = |((pos, floor), rows): ((usize, Label), Vec<&Measurement>)| {
        let kpi = selection[pos].clone();
        build_group(GroupKey { kpi, floor }, rows, catalog, &detector)
    };

    let jobs: Vec<_> = partitions.into_iter().collect();
    let groups: Vec<GroupSeries> = if options.parallel {
        jobs.into_par_iter().map(build).collect()
    } else {
        jobs.into_iter().map(build).collect()
    };

    let summaries: Vec<GroupSummary> = groups.iter().map(GroupSeries::summary).collect();

    debug!(
        rows = measurements.len(),
        selected = selection.len(),
        groups = groups.len(),
        empty = empty_selections.len(),
        "aggregation complete"
    );

    AggregateOutput {
        summaries,
        groups,
        empty_selections,
    }
}

fn build_group(
    key: GroupKey,
    mut rows: Vec<&Measurement>,
    catalog: &ThresholdCatalog,
    detector: &ExtremaDetector,
) -> GroupSeries {
    rows.sort_by_key(|m| m.timestamp);

    let points: Vec<SeriesPoint> = rows
        .iter()
        .enumerate()
        .map(|(index, m)| SeriesPoint {
            index,
            timestamp: m.timestamp,
            value: m.ave,
        })
        .collect();
    let values: Vec<Option<f64>> = points.iter().map(|p| p.value).collect();

    let thresholds = catalog.get(&key.kpi);
    let extrema = detector.detect(&values, thresholds);

    GroupSeries {
        key,
        thresholds,
        points,
        extrema,
    }
}
