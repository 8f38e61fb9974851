use std::path::Path;

use tracing::{info, warn};

use ckpi_core::{parse_value, CkpiError, KpiName, Label, Measurement, Result};

use crate::columns::ColumnMap;
use crate::csv_import::CsvImporter;
use crate::dates::parse_day_first;
use crate::json_import::JsonImporter;
use crate::parquet_import::ParquetImporter;
use crate::table::{RawTable, SourceFormat};

/// Measurements loaded from one file plus what had to be discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub measurements: Vec<Measurement>,
    /// Rows dropped for any reason.
    pub dropped_rows: usize,
    /// Of those, rows whose date did not parse.
    pub unparsed_dates: usize,
}

/// Read `path` in the format implied by its extension and convert it.
pub fn load_measurements(path: &Path) -> Result<IngestOutcome> {
    let format = SourceFormat::from_path(path)?;
    let table = read_table(path, format)?;
    info!(
        path = %path.display(),
        %format,
        rows = table.len(),
        columns = table.columns.len(),
        "table read"
    );
    measurements_from_table(&table)
}

pub fn read_table(path: &Path, format: SourceFormat) -> Result<RawTable> {
    match format {
        SourceFormat::Csv => CsvImporter::import(path),
        SourceFormat::Json => JsonImporter::import(path),
        SourceFormat::Parquet => ParquetImporter::import(path),
    }
}

/// Convert raw rows into measurements.
///
/// Fails when the table has no rows, a required column is absent, or not a
/// single date parses. Rows with an unparseable date or a missing KPI, floor
/// or equipment are dropped. A missing or non-numeric value is kept as `None`.
pub fn measurements_from_table(table: &RawTable) -> Result<IngestOutcome> {
    if table.is_empty() {
        return Err(CkpiError::EmptyInput);
    }
    let cols = ColumnMap::resolve(&table.columns)?;

    let mut outcome = IngestOutcome::default();
    for row in &table.rows {
        let cell = |i: usize| row.get(i).and_then(|c| c.as_deref());

        let Some(timestamp) = cell(cols.date).and_then(parse_day_first) else {
            outcome.unparsed_dates += 1;
            outcome.dropped_rows += 1;
            continue;
        };
        let (Some(kpi), Some(floor), Some(equipment)) =
            (cell(cols.kpi), cell(cols.floor), cell(cols.equipment))
        else {
            outcome.dropped_rows += 1;
            continue;
        };

        outcome.measurements.push(Measurement::new(
            timestamp,
            KpiName::new(kpi),
            Label::parse(floor),
            Label::parse(equipment),
            cell(cols.ave).and_then(parse_value),
        ));
    }

    if outcome.unparsed_dates == table.len() {
        return Err(CkpiError::NoParsableDates);
    }
    if outcome.dropped_rows > 0 {
        warn!(
            dropped = outcome.dropped_rows,
            unparsed_dates = outcome.unparsed_dates,
            "rows dropped during ingestion"
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 5]]) -> RawTable {
        let mut t = RawTable::new(
            ["ckpi_statistics_date", "ave", "ckpi", "floor", "eq"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        for r in rows {
            t.rows.push(r.iter().map(|c| crate::table::normalize_cell(c)).collect());
        }
        t
    }

    #[test]
    fn converts_rows() {
        let out = measurements_from_table(&table(&[
            ["03/04/2024", "40.5", "doorfriction", "3.0", "EQ1"],
            ["04/04/2024", "n/a", "DoorFriction", "3", "EQ1"],
        ]))
        .unwrap();
        assert_eq!(out.measurements.len(), 2);
        assert_eq!(out.dropped_rows, 0);
        let first = &out.measurements[0];
        assert_eq!(first.floor, Label::Int(3));
        assert_eq!(first.equipment, Label::Text("EQ1".to_string()));
        assert_eq!(first.ave, Some(40.5));
        assert_eq!(first.timestamp.format("%Y-%m-%d").to_string(), "2024-04-03");
        assert_eq!(out.measurements[1].ave, None);
        assert_eq!(out.measurements[1].kpi, KpiName::new("doorfriction"));
    }

    #[test]
    fn drops_unparseable_and_incomplete_rows() {
        let out = measurements_from_table(&table(&[
            ["03/04/2024", "1", "a", "1", "EQ1"],
            ["not a date", "1", "a", "1", "EQ1"],
            ["05/04/2024", "1", "", "1", "EQ1"],
        ]))
        .unwrap();
        assert_eq!(out.measurements.len(), 1);
        assert_eq!(out.dropped_rows, 2);
        assert_eq!(out.unparsed_dates, 1);
    }

    #[test]
    fn no_parsable_dates_fails() {
        let err = measurements_from_table(&table(&[["garbage", "1", "a", "1", "EQ1"]])).unwrap_err();
        assert!(matches!(err, CkpiError::NoParsableDates));
    }

    #[test]
    fn empty_table_fails() {
        assert!(matches!(measurements_from_table(&table(&[])), Err(CkpiError::EmptyInput)));
    }
}
