use serde::Serialize;

/// Population statistics over the present values of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Number of present (finite) values.
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by `count`).
    pub stddev: f64,
}

impl SeriesStats {
    /// Mean and standard deviation ignoring missing and non-finite values.
    ///
    /// Returns `None` when no value is present.
    pub fn compute(values: &[Option<f64>]) -> Option<Self> {
        let finite = || values.iter().filter_map(|v| present(*v));
        let count = finite().count();
        if count == 0 {
            return None;
        }
        let mean = finite().sum::<f64>() / count as f64;
        let variance = finite().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Self {
            count,
            mean,
            stddev: variance.sqrt(),
        })
    }

    /// `mean ± factor * stddev`.
    pub fn bounds(&self, factor: f64) -> StatBounds {
        StatBounds {
            mean: self.mean,
            stddev: self.stddev,
            upper: self.mean + factor * self.stddev,
            lower: self.mean - factor * self.stddev,
        }
    }
}

/// Statistical deviation bounds used by the extrema test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatBounds {
    pub mean: f64,
    pub stddev: f64,
    pub upper: f64,
    pub lower: f64,
}

/// A value usable for detection: present and finite.
pub(crate) fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}
