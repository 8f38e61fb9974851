use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pipeline run metrics, updated after each analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// When the last run completed.
    pub last_run: Option<DateTime<Utc>>,
    /// Duration of the last run in milliseconds.
    pub duration_ms: u64,
    /// Measurements handed to the last run.
    pub rows_processed: u64,
    /// (KPI, floor) groups analysed in the last run.
    pub groups_analyzed: u64,
    /// Groups flagged actionable in the last run.
    pub actionable_groups: u64,
    /// Completed runs since the pipeline was built.
    pub runs: u64,
    /// Rows per second over the last run.
    pub rows_per_second: f64,

    #[serde(skip)]
    total_elapsed_ms: f64,
}

impl PipelineMetrics {
    /// Record completion of an analysis run.
    pub fn record_run(&mut self, rows: u64, groups: u64, actionable: u64, elapsed: Duration) {
        self.last_run = Some(Utc::now());
        self.duration_ms = elapsed.as_millis() as u64;
        self.rows_processed = rows;
        self.groups_analyzed = groups;
        self.actionable_groups = actionable;
        self.runs += 1;
        self.total_elapsed_ms += elapsed.as_secs_f64() * 1000.0;

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rows_per_second = rows as f64 / secs;
        }
    }

    /// Mean run duration in milliseconds.
    pub fn avg_duration_ms(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_elapsed_ms / self.runs as f64
        }
    }

    pub fn timer(&self) -> RunTimer {
        RunTimer {
            start: Instant::now(),
        }
    }
}

/// A scoped timer for one run.
pub struct RunTimer {
    start: Instant,
}

impl RunTimer {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finalize the timer and record metrics.
    pub fn finish(self, metrics: &mut PipelineMetrics, rows: u64, groups: u64, actionable: u64) {
        metrics.record_run(rows, groups, actionable, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_metrics() {
        let mut m = PipelineMetrics::default();
        m.record_run(5000, 12, 3, Duration::from_millis(200));

        assert!(m.last_run.is_some());
        assert_eq!(m.rows_processed, 5000);
        assert_eq!(m.groups_analyzed, 12);
        assert_eq!(m.actionable_groups, 3);
        assert_eq!(m.duration_ms, 200);
        assert!(m.rows_per_second > 0.0);
    }

    #[test]
    fn average_over_runs() {
        let mut m = PipelineMetrics::default();
        m.record_run(10, 1, 0, Duration::from_millis(100));
        m.record_run(10, 1, 0, Duration::from_millis(300));

        assert_eq!(m.runs, 2);
        assert!((m.avg_duration_ms() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn empty_metrics() {
        let m = PipelineMetrics::default();
        assert_eq!(m.avg_duration_ms(), 0.0);
        assert!(m.last_run.is_none());
    }

    #[test]
    fn timer_records_run() {
        let mut m = PipelineMetrics::default();
        let timer = m.timer();
        timer.finish(&mut m, 42, 2, 1);
        assert_eq!(m.runs, 1);
        assert_eq!(m.rows_processed, 42);
    }
}
