//! Actionable report export to CSV, Parquet or JSON.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt64Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use ckpi_compute::InsightRow;

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Arrow conversion error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported export format: {0} (use .csv, .parquet or .json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A bare file name lands in `report_dir`; anything with a directory
/// component is used as given.
pub fn resolve_export_path(path: &Path, report_dir: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => path.to_path_buf(),
        _ => report_dir.join(path),
    }
}

fn report_schema() -> Schema {
    Schema::new(vec![
        Field::new("KPI", DataType::Utf8, false),
        Field::new("Floor", DataType::Utf8, false),
        Field::new("Action Needed", DataType::Utf8, false),
        Field::new("Remedy / Reason", DataType::Utf8, false),
        Field::new("Remedy Code", DataType::UInt8, false),
        Field::new("Peaks", DataType::UInt64, false),
        Field::new("Lows", DataType::UInt64, false),
        Field::new("Rows", DataType::UInt64, false),
    ])
}

/// Convert insight rows into a single Arrow [`RecordBatch`].
pub fn insights_to_record_batch(rows: &[InsightRow]) -> Result<RecordBatch, ExportError> {
    let strings = |f: fn(&InsightRow) -> String| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let counts = |f: fn(&InsightRow) -> usize| -> ArrayRef {
        Arc::new(UInt64Array::from(rows.iter().map(|r| f(r) as u64).collect::<Vec<_>>()))
    };

    let arrays: Vec<ArrayRef> = vec![
        strings(|r| r.kpi.to_string()),
        strings(|r| r.floor.to_string()),
        strings(|r| r.action.clone()),
        strings(|r| r.remedy_text.clone()),
        Arc::new(UInt8Array::from(rows.iter().map(|r| r.remedy.code()).collect::<Vec<_>>())),
        counts(|r| r.peaks),
        counts(|r| r.lows),
        counts(|r| r.rows),
    ];
    Ok(RecordBatch::try_new(Arc::new(report_schema()), arrays)?)
}

/// Write `rows` to `path` in the format implied by its extension.
///
/// Returns the number of rows written.
pub fn export(rows: &[InsightRow], path: &Path) -> Result<usize, ExportError> {
    let format = ExportFormat::from_path(path)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => {
            let batch = insights_to_record_batch(rows)?;
            let mut writer = arrow::csv::Writer::new(File::create(path)?);
            writer.write(&batch)?;
        }
        ExportFormat::Parquet => {
            let batch = insights_to_record_batch(rows)?;
            let props = WriterProperties::builder()
                .set_compression(Compression::ZSTD(Default::default()))
                .set_key_value_metadata(Some(vec![parquet::format::KeyValue::new(
                    "ckpi.generated_at".to_string(),
                    Some(Utc::now().to_rfc3339()),
                )]))
                .build();
            let mut writer = ArrowWriter::try_new(File::create(path)?, batch.schema(), Some(props))?;
            writer.write(&batch)?;
            writer.close()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), rows)?;
        }
    }

    debug!(path = %path.display(), rows = rows.len(), "Wrote report");
    Ok(rows.len())
}
