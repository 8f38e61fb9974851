use std::fmt;
use std::path::Path;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

use ckpi_core::{CkpiError, Result};

/// Cell texts treated as missing, compared after trimming.
const MISSING_MARKERS: &[&str] = &["None", "null", "NULL", "NaN", "nan", "undefined"];

/// Untyped rows as read from a source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    /// One entry per row, aligned with `columns`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append every row of `batch`, stringifying cells of any arrow type.
    pub fn extend_from_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        let columns = batch.columns();
        self.rows.reserve(batch.num_rows());
        for row_idx in 0..batch.num_rows() {
            let mut row = Vec::with_capacity(columns.len());
            for col in columns {
                if col.is_null(row_idx) {
                    row.push(None);
                    continue;
                }
                let text = array_value_to_string(col.as_ref(), row_idx)
                    .map_err(|e| CkpiError::Arrow(e.to_string()))?;
                row.push(normalize_cell(&text));
            }
            self.rows.push(row);
        }
        Ok(())
    }
}

/// Trim a raw cell; blank cells and missing markers become `None`.
pub fn normalize_cell(raw: &str) -> Option<String> {
    let val = raw.trim();
    if val.is_empty() || MISSING_MARKERS.contains(&val) {
        None
    } else {
        Some(val.to_string())
    }
}

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Parquet,
}

impl SourceFormat {
    /// Unknown extensions are read as CSV. Spreadsheets are rejected.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "json" | "ndjson" | "jsonl" => Ok(Self::Json),
            "parquet" | "pq" => Ok(Self::Parquet),
            "xlsx" | "xls" => Err(CkpiError::UnsupportedFormat(format!(
                "{} (export the sheet as CSV)",
                path.display()
            ))),
            _ => Ok(Self::Csv),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Parquet => write!(f, "parquet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn missing_markers_become_none() {
        assert_eq!(normalize_cell("  "), None);
        assert_eq!(normalize_cell("None"), None);
        assert_eq!(normalize_cell("null"), None);
        assert_eq!(normalize_cell("NaN"), None);
        assert_eq!(normalize_cell("undefined"), None);
        assert_eq!(normalize_cell(" 4.2 "), Some("4.2".to_string()));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.CSV")).unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("a.json")).unwrap(), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("a.parquet")).unwrap(), SourceFormat::Parquet);
        assert_eq!(SourceFormat::from_path(Path::new("a.txt")).unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("noext")).unwrap(), SourceFormat::Csv);
        assert!(matches!(
            SourceFormat::from_path(Path::new("report.xlsx")),
            Err(CkpiError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn batch_cells_are_stringified() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ckpi", DataType::Utf8, true),
            Field::new("floor", DataType::Int64, true),
            Field::new("ave", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("doorfriction"), Some("null")])),
                Arc::new(Int64Array::from(vec![Some(3), None])),
                Arc::new(Float64Array::from(vec![Some(40.5), Some(1.0)])),
            ],
        )
        .unwrap();

        let mut table = RawTable::new(vec!["ckpi".into(), "floor".into(), "ave".into()]);
        table.extend_from_batch(&batch).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            vec![Some("doorfriction".to_string()), Some("3".to_string()), Some("40.5".to_string())]
        );
        assert_eq!(table.rows[1][0], None);
        assert_eq!(table.rows[1][1], None);
    }
}
