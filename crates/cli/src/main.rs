mod cli;
mod report;
mod terminal;

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{info, warn};

use ckpi_compute::Pipeline;
use ckpi_core::config::{self, Config};
use ckpi_core::KpiName;
use ckpi_ingest::{distinct_equipment, distinct_floors, load_measurements, DateRange};
use ckpi_rules::RuleLoader;

use crate::cli::CliArgs;
use crate::terminal::Terminal;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    if let Err(e) = run(&args, &terminal) {
        terminal.print_error(&format!("{:#}", e)).ok();
        std::process::exit(1);
    }
}

fn run(args: &CliArgs, terminal: &Terminal) -> Result<()> {
    config::load_dotenv();
    let mut config = Config::from_env();
    config.log_summary();

    let rules_dir = args.rules_dir.clone().unwrap_or_else(|| config.paths.rules_dir.clone());
    let rules = RuleLoader::new(&rules_dir)
        .load_all()
        .with_context(|| format!("failed to load rules from {}", rules_dir.display()))?;
    if rules.failed_count() > 0 {
        warn!(failed = rules.failed_count(), "Some rule files failed to load");
    }

    let loaded = load_measurements(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    info!(
        rows = loaded.measurements.len(),
        dropped = loaded.dropped_rows,
        "Measurements loaded"
    );
    let measurements = loaded.measurements;

    if args.list {
        let kpis: Vec<KpiName> = measurements
            .iter()
            .map(|m| m.kpi.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        terminal.print_choices(
            &distinct_equipment(&measurements),
            &distinct_floors(&measurements),
            &kpis,
            DateRange::spanning(&measurements),
        )?;
        return Ok(());
    }

    let selection = args.selection(&measurements, rules.catalog.kpi_names(), Local::now().date_naive());
    let filtered = selection.apply(&measurements);
    if filtered.is_empty() {
        terminal.print_warning("No data after filters.")?;
        return Ok(());
    }

    // CLI flags take priority over env overrides.
    if args.sensitivity.is_some() {
        config.analysis.sensitivity = args.sensitivity;
    }
    if args.volatility_ratio.is_some() {
        config.analysis.volatility_ratio = args.volatility_ratio;
    }
    if args.sequential {
        config.analysis.parallel = false;
    }
    config.analysis.validate().context("invalid analysis settings")?;

    let mut pipeline = Pipeline::from_config(rules.catalog, &rules.insight, &config.analysis);
    config::validate_sensitivity(pipeline.options().sensitivity)
        .context("invalid sensitivity from rules")?;

    let report = pipeline.run(&filtered, &selection.kpis);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        terminal.print_report(&report, &selection.kpis)?;
    }

    if let Some(path) = &args.export {
        let path = report::resolve_export_path(path, &config.paths.report_dir);
        let written = report::export(&report.insights, &path)
            .with_context(|| format!("failed to export report to {}", path.display()))?;
        if !args.json {
            terminal.print_info(&format!("Exported {} rows to {}", written, path.display()))?;
        }
    }

    Ok(())
}
