use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::collections::HashSet;
use std::io::{self, Write};

use ckpi_compute::{AnalysisReport, GroupSeries, InsightRow, SeriesPoint};
use ckpi_core::{KpiName, Label};
use ckpi_ingest::DateRange;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const KPI: Color = Color::Cyan;
    const PEAK: Color = Color::Red;
    const LOW: Color = Color::Blue;
    const ACTION: Color = Color::Yellow;
    const OK: Color = Color::Green;
    const WARNING: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Renders analysis results to stdout.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Per-KPI floor lines followed by the actionable insights table.
    ///
    /// `kpis` is the selection in display order; repeats are shown once.
    pub fn print_report(&self, report: &AnalysisReport, kpis: &[KpiName]) -> Result<()> {
        let mut stdout = io::stdout();
        let mut seen = HashSet::new();

        for kpi in kpis.iter().filter(|k| seen.insert((*k).clone())) {
            if report.empty_selections.contains(kpi) {
                execute!(
                    stdout,
                    SetForegroundColor(Colors::DIM),
                    Print(format!("No data for KPI: {}\n", kpi)),
                    ResetColor,
                )?;
                continue;
            }

            execute!(
                stdout,
                SetForegroundColor(Colors::KPI),
                Print(format!("\nKPI: {}\n", kpi)),
                ResetColor,
            )?;
            for group in report.groups_for(kpi) {
                execute!(stdout, Print(format!("  {}\n", format_group_line(group))))?;
                for point in group.peak_points() {
                    execute!(
                        stdout,
                        SetForegroundColor(Colors::PEAK),
                        Print(format!("    {}\n", format_point("peak", point))),
                        ResetColor,
                    )?;
                }
                for point in group.low_points() {
                    execute!(
                        stdout,
                        SetForegroundColor(Colors::LOW),
                        Print(format!("    {}\n", format_point("low", point))),
                        ResetColor,
                    )?;
                }
            }
        }

        self.print_insights(&report.insights)?;
        stdout.flush()?;
        Ok(())
    }

    /// The actionable insights table, or a note that nothing needs action.
    pub fn print_insights(&self, rows: &[InsightRow]) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print("⚡ Actionable Insights Report ⚡\n"),
            ResetColor,
        )?;

        if rows.is_empty() {
            execute!(
                stdout,
                SetForegroundColor(Colors::OK),
                Print("No action needed for selected filters.\n"),
                ResetColor,
            )?;
            stdout.flush()?;
            return Ok(());
        }

        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", insight_header())),
            Print(format!("{}\n", "-".repeat(100))),
            ResetColor,
        )?;
        for row in rows {
            execute!(
                stdout,
                SetForegroundColor(Colors::ACTION),
                Print(format!("{}\n", format_insight_row(row))),
                ResetColor,
            )?;
        }
        stdout.flush()?;
        Ok(())
    }

    /// Available filter choices found in the loaded data.
    pub fn print_choices(
        &self,
        equipment: &[Label],
        floors: &[Label],
        kpis: &[KpiName],
        span: Option<DateRange>,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        let span = span
            .map(|r| r.to_string())
            .unwrap_or_else(|| "(no dates)".to_string());
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("Available filters:\n"),
            ResetColor,
            Print(format!("  equipment: {}\n", join(equipment))),
            Print(format!("  floors:    {}\n", join(floors))),
            Print(format!("  kpis:      {}\n", join(kpis))),
            Print(format!("  dates:     {}\n", span)),
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print a warning message.
    pub fn print_warning(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::WARNING),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stderr.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "-".to_string(),
    }
}

/// `Floor 3: 12 rows, 1 peaks, 2 lows, bounds [lower, upper]`.
pub fn format_group_line(group: &GroupSeries) -> String {
    let bounds = match group.extrema.bounds {
        Some(b) => format!("bounds [{:.3}, {:.3}]", b.lower, b.upper),
        None => "bounds n/a".to_string(),
    };
    format!(
        "Floor {}: {} rows, {} peaks, {} lows, {}",
        group.key.floor,
        group.points.len(),
        group.extrema.peak_count(),
        group.extrema.low_count(),
        bounds
    )
}

pub fn format_point(kind: &str, point: &SeriesPoint) -> String {
    format!(
        "{} at {} = {}",
        kind,
        point.timestamp.format(TIMESTAMP_FORMAT),
        format_value(point.value)
    )
}

pub fn insight_header() -> String {
    format!("{:<30} {:<8} {:<36} {}", "KPI", "Floor", "Action Needed", "Remedy / Reason")
}

pub fn format_insight_row(row: &InsightRow) -> String {
    format!(
        "{:<30} {:<8} {:<36} {}",
        row.kpi.to_string(),
        row.floor.to_string(),
        row.action,
        row.remedy_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ckpi_compute::{ExtremaResult, GroupKey, RemedyCode, StatBounds};
    use ckpi_rules::ThresholdPair;

    fn point(index: usize, day: u32, value: Option<f64>) -> SeriesPoint {
        SeriesPoint {
            index,
            timestamp: NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            value,
        }
    }

    #[test]
    fn group_line_lists_counts_and_bounds() {
        let group = GroupSeries {
            key: GroupKey {
                kpi: KpiName::new("doorfriction"),
                floor: Label::Int(2),
            },
            thresholds: ThresholdPair::new(Some(30.0), Some(50.0)),
            points: vec![point(0, 1, Some(40.0)), point(1, 2, Some(55.0)), point(2, 3, Some(40.0))],
            extrema: ExtremaResult {
                peaks: vec![1],
                lows: vec![],
                bounds: Some(StatBounds {
                    mean: 45.0,
                    stddev: 7.0,
                    upper: 52.0,
                    lower: 38.0,
                }),
            },
        };
        assert_eq!(
            format_group_line(&group),
            "Floor 2: 3 rows, 1 peaks, 0 lows, bounds [38.000, 52.000]"
        );
        assert_eq!(
            format_point("peak", group.peak_points()[0]),
            "peak at 2024-04-02 09:30 = 55.000"
        );
    }

    #[test]
    fn missing_value_prints_dash() {
        assert_eq!(format_point("low", &point(0, 5, None)), "low at 2024-04-05 09:30 = -");
    }

    #[test]
    fn insight_row_lines_up_with_header() {
        let row = InsightRow {
            kpi: KpiName::new("lockHookTime"),
            floor: Label::Int(4),
            action_needed: true,
            action: "High uncertainty → Technician check".to_string(),
            remedy: RemedyCode::Code2,
            remedy_text: RemedyCode::Code2.description().to_string(),
            peaks: 1,
            lows: 0,
            rows: 3,
        };
        let line = format_insight_row(&row);
        assert!(line.starts_with("lockHookTime"));
        assert!(line.ends_with("Follow solution 2"));
        assert_eq!(
            line.find("4 ").unwrap(),
            insight_header().find("Floor").unwrap()
        );
    }

    #[test]
    fn join_handles_empty() {
        assert_eq!(join::<Label>(&[]), "(none)");
        assert_eq!(join(&[Label::Int(1), Label::from("B")]), "1, B");
    }
}
