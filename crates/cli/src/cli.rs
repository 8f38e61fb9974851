use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use ckpi_core::{KpiName, Label, Measurement};
use ckpi_ingest::{default_choice, distinct_equipment, distinct_floors, DatePreset, DateRange, FilterSelection};

/// KPI peak/low detection with an actionable-insight report.
///
/// Reads a measurement file, narrows it to the chosen equipment, floors,
/// KPIs and dates, flags local extrema per (KPI, floor) and lists the
/// groups that need a technician.
#[derive(Parser, Debug)]
#[command(name = "ckpi", about = "KPI extrema detection and actionable insight report")]
pub struct CliArgs {
    /// Measurement file: CSV, JSON or Parquet
    #[arg(long, short, env = "CKPI_FILE")]
    pub file: PathBuf,

    /// Equipment id(s) to include (default: the first two in the file)
    #[arg(long = "eq", value_delimiter = ',')]
    pub equipment: Vec<String>,

    /// Floor(s) to include (default: the first two in the file)
    #[arg(long = "floor", value_delimiter = ',')]
    pub floors: Vec<String>,

    /// KPI name(s) to analyse (default: every KPI in the threshold catalog)
    #[arg(long = "kpi", value_delimiter = ',')]
    pub kpis: Vec<String>,

    /// Quick date window: custom, past-week, past-month, past-3-months,
    /// past-6-months or past-year
    #[arg(long, default_value = "custom")]
    pub range: DatePreset,

    /// First day for a custom range, YYYY-MM-DD (default: earliest date in the file)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day for a custom range, YYYY-MM-DD (default: latest date in the file)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Standard deviation multiplier for the statistical bounds (0.5 to 3.0)
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Extrema fraction above which a group is actionable
    #[arg(long)]
    pub volatility_ratio: Option<f64>,

    /// Directory with ThresholdCatalog / InsightConfig rule documents
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Write the actionable report to this file (.csv, .parquet or .json)
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the full analysis as JSON instead of the terminal report
    #[arg(long)]
    pub json: bool,

    /// Analyse groups on the current thread only
    #[arg(long)]
    pub sequential: bool,

    /// List the equipment, floors and date span found in the file and exit
    #[arg(long)]
    pub list: bool,
}

impl CliArgs {
    /// Resolve the filter, filling unset choices with defaults taken from
    /// the data and `catalog_kpis`.
    pub fn selection(
        &self,
        measurements: &[Measurement],
        catalog_kpis: Vec<KpiName>,
        today: NaiveDate,
    ) -> FilterSelection {
        let equipment = if self.equipment.is_empty() {
            default_choice(&distinct_equipment(measurements))
        } else {
            self.equipment.iter().map(|s| Label::parse(s)).collect()
        };
        let floors = if self.floors.is_empty() {
            default_choice(&distinct_floors(measurements))
        } else {
            self.floors.iter().map(|s| Label::parse(s)).collect()
        };
        let kpis = if self.kpis.is_empty() {
            catalog_kpis
        } else {
            self.kpis.iter().map(|s| KpiName::new(s.trim())).collect()
        };

        let date_range = self.range.range_ending(today).or_else(|| {
            let span = DateRange::spanning(measurements);
            match (self.start.or(span.map(|r| r.start)), self.end.or(span.map(|r| r.end))) {
                (Some(start), Some(end)) => Some(DateRange::new(start, end)),
                _ => None,
            }
        });

        FilterSelection {
            equipment,
            floors,
            kpis,
            date_range,
        }
    }
}
