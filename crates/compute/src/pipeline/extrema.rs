//! Local extrema detection.
//!
//! A point is a peak when it is strictly above both chronological neighbours
//! AND abnormal; it is a low when strictly below both neighbours AND
//! abnormal. "Abnormal" passes if EITHER the KPI's fixed domain bound is
//! crossed OR the series' own `mean ± sensitivity * stddev` bound is crossed.
//! The shape test is always required; the two abnormality tests are OR-ed.

use serde::Serialize;

use ckpi_rules::ThresholdPair;

use super::stats::{present, SeriesStats, StatBounds};

/// Minimum series length for any point to have two neighbours.
pub const MIN_SERIES_LEN: usize = 3;

/// Peak and low positions within one chronologically ordered series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtremaResult {
    /// Ascending indices of peaks.
    pub peaks: Vec<usize>,
    /// Ascending indices of lows.
    pub lows: Vec<usize>,
    /// Statistical bounds used, `None` when detection was not attempted.
    pub bounds: Option<StatBounds>,
}

impl ExtremaResult {
    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    pub fn low_count(&self) -> usize {
        self.lows.len()
    }

    /// Peaks plus lows.
    pub fn total(&self) -> usize {
        self.peaks.len() + self.lows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty() && self.lows.is_empty()
    }
}

/// Detects extrema with a fixed sensitivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremaDetector {
    sensitivity: f64,
}

impl Default for ExtremaDetector {
    fn default() -> Self {
        Self { sensitivity: 1.0 }
    }
}

impl ExtremaDetector {
    pub fn new(sensitivity: f64) -> Self {
        Self { sensitivity }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn detect(&self, values: &[Option<f64>], thresholds: ThresholdPair) -> ExtremaResult {
        detect_extrema(values, thresholds.low, thresholds.high, self.sensitivity)
    }
}

/// Find local peaks and lows in `values`.
///
/// Missing entries keep their index but are never a centre, and a centre
/// with a missing neighbour is skipped. The first and last points are never
/// reported. Fewer than [`MIN_SERIES_LEN`] points, or no present value,
/// yields an empty result.
pub fn detect_extrema(
    values: &[Option<f64>],
    low_threshold: Option<f64>,
    high_threshold: Option<f64>,
    sensitivity: f64,
) -> ExtremaResult {
    if values.len() < MIN_SERIES_LEN {
        return ExtremaResult::default();
    }
    let Some(stats) = SeriesStats::compute(values) else {
        return ExtremaResult::default();
    };
    let bounds = stats.bounds(sensitivity);

    let mut peaks = Vec::new();
    let mut lows = Vec::new();

    for (offset, window) in values.windows(3).enumerate() {
        let i = offset + 1;
        let (Some(a), Some(b), Some(c)) = (present(window[0]), present(window[1]), present(window[2]))
        else {
            continue;
        };

        let above_domain = high_threshold.is_some_and(|h| b > h);
        if b > a && b > c && (above_domain || b > bounds.upper) {
            peaks.push(i);
        }

        let below_domain = low_threshold.is_some_and(|l| b < l);
        if b < a && b < c && (below_domain || b < bounds.lower) {
            lows.push(i);
        }
    }

    ExtremaResult {
        peaks,
        lows,
        bounds: Some(bounds),
    }
}
