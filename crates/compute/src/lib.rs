//! KPI extrema detection and insight classification.
//!
//! Pure computation over already-parsed measurements: nothing in this crate
//! reads files or writes to the terminal.

pub mod pipeline;

pub use pipeline::aggregate::{
    aggregate, AggregateOptions, AggregateOutput, GroupKey, GroupSeries, GroupSummary, SeriesPoint,
};
pub use pipeline::extrema::{detect_extrema, ExtremaDetector, ExtremaResult, MIN_SERIES_LEN};
pub use pipeline::insight::{
    InsightClassifier, InsightRow, RemedyCode, DEFAULT_ACTION_LABEL, DEFAULT_VOLATILITY_RATIO,
};
pub use pipeline::metrics::PipelineMetrics;
pub use pipeline::stats::{SeriesStats, StatBounds};
pub use pipeline::{AnalysisReport, Pipeline};
