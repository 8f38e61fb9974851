use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use tracing::info;

use ckpi_core::{CkpiError, Result};

use crate::table::RawTable;

/// Records sampled to discover the header and column count.
const INFER_RECORDS: usize = 100;

pub struct CsvImporter;

impl CsvImporter {
    /// Read a headed CSV file with every column as text.
    pub fn import(path: &Path) -> Result<RawTable> {
        let mut file = File::open(path).map_err(CkpiError::Io)?;
        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(&mut file, Some(INFER_RECORDS))
            .map_err(|e| CkpiError::Arrow(e.to_string()))?;
        if inferred.fields().is_empty() {
            return Err(CkpiError::EmptyInput);
        }

        let fields: Vec<Field> = inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        file.seek(SeekFrom::Start(0))?;
        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(file)
            .map_err(|e| CkpiError::Arrow(e.to_string()))?;

        let mut table = RawTable::new(schema.fields().iter().map(|f| f.name().clone()).collect());
        for batch_result in reader {
            let batch = batch_result.map_err(|e| CkpiError::Arrow(e.to_string()))?;
            table.extend_from_batch(&batch)?;
        }

        info!("Imported {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_all_columns_as_text() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "CKPI_Statistics_Date,ave,ckpi,floor,eq").unwrap();
        writeln!(file, "03/04/2024,40.5,doorfriction,3,EQ1").unwrap();
        writeln!(file, "04/04/2024,,doorfriction,3,EQ1").unwrap();
        file.flush().unwrap();

        let table = CsvImporter::import(file.path()).unwrap();
        assert_eq!(table.columns[0], "CKPI_Statistics_Date");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0].as_deref(), Some("03/04/2024"));
        assert_eq!(table.rows[0][3].as_deref(), Some("3"));
        assert_eq!(table.rows[1][1], None);
    }
}
