//! Analysis pipeline orchestrator.
//!
//! Wires the stages into a single run over already-filtered measurements:
//!
//! - **Aggregate**: partition by (KPI, floor), sort each group by time and
//!   detect peaks and lows against domain and statistical bounds.
//! - **Classify**: flag groups whose extrema rate exceeds the volatility
//!   ratio and attach a remedy code.

pub mod aggregate;
pub mod extrema;
pub mod insight;
pub mod metrics;
pub mod stats;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use ckpi_core::config::AnalysisConfig;
use ckpi_core::{KpiName, Measurement};
use ckpi_rules::{InsightConfigSpec, ThresholdCatalog};

use self::aggregate::{aggregate, AggregateOptions, GroupSeries, GroupSummary};
use self::insight::{InsightClassifier, InsightRow};
use self::metrics::PipelineMetrics;

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub sensitivity: f64,
    pub volatility_ratio: f64,
    pub summaries: Vec<GroupSummary>,
    pub groups: Vec<GroupSeries>,
    pub insights: Vec<InsightRow>,
    /// Selected KPIs with no rows after filtering.
    pub empty_selections: Vec<KpiName>,
}

impl AnalysisReport {
    pub fn has_insights(&self) -> bool {
        !self.insights.is_empty()
    }

    /// Groups for one KPI, in floor order.
    pub fn groups_for<'a>(&'a self, kpi: &'a KpiName) -> impl Iterator<Item = &'a GroupSeries> + 'a {
        self.groups.iter().filter(move |g| &g.key.kpi == kpi)
    }
}

/// Main pipeline combining aggregation and classification.
pub struct Pipeline {
    catalog: Arc<ThresholdCatalog>,
    options: AggregateOptions,
    classifier: InsightClassifier,
    /// Run metrics.
    pub metrics: PipelineMetrics,
}

impl Pipeline {
    /// Pipeline with default sensitivity and volatility ratio.
    pub fn new(catalog: impl Into<Arc<ThresholdCatalog>>) -> Self {
        Self {
            catalog: catalog.into(),
            options: AggregateOptions::default(),
            classifier: InsightClassifier::default(),
            metrics: PipelineMetrics::default(),
        }
    }

    /// Pipeline configured from the insight rule, with env overrides applied.
    pub fn from_config(
        catalog: impl Into<Arc<ThresholdCatalog>>,
        insight: &InsightConfigSpec,
        analysis: &AnalysisConfig,
    ) -> Self {
        let classifier =
            InsightClassifier::new(analysis.volatility_ratio_or(insight.volatility_ratio))
                .with_action_label(insight.action_label.clone());
        Self::new(catalog)
            .with_sensitivity(analysis.sensitivity_or(insight.default_sensitivity))
            .with_parallel(analysis.parallel)
            .with_classifier(classifier)
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.options.sensitivity = sensitivity;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    pub fn with_classifier(mut self, classifier: InsightClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn catalog(&self) -> &ThresholdCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    pub fn classifier(&self) -> &InsightClassifier {
        &self.classifier
    }

    /// Aggregate, detect and classify `measurements` for `kpi_selection`.
    pub fn run(&mut self, measurements: &[Measurement], kpi_selection: &[KpiName]) -> AnalysisReport {
        let timer = self.metrics.timer();

        let output = aggregate(measurements, kpi_selection, &self.catalog, &self.options);
        debug!(groups = output.summaries.len(), "aggregate completed");

        let insights = self.classifier.classify(&output.summaries);

        timer.finish(
            &mut self.metrics,
            measurements.len() as u64,
            output.summaries.len() as u64,
            insights.len() as u64,
        );

        info!(
            rows = measurements.len(),
            groups = output.summaries.len(),
            actionable = insights.len(),
            sensitivity = self.options.sensitivity,
            elapsed_ms = self.metrics.duration_ms,
            "analysis completed"
        );

        AnalysisReport {
            sensitivity: self.options.sensitivity,
            volatility_ratio: self.classifier.volatility_ratio(),
            summaries: output.summaries,
            groups: output.groups,
            insights,
            empty_selections: output.empty_selections,
        }
    }
}
