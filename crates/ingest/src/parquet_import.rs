use std::path::Path;

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use ckpi_core::{CkpiError, Result};

use crate::table::RawTable;

pub struct ParquetImporter;

impl ParquetImporter {
    /// Read every row group. Columns of any arrow type are stringified.
    pub fn import(path: &Path) -> Result<RawTable> {
        let file = std::fs::File::open(path).map_err(CkpiError::Io)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| CkpiError::Parquet(e.to_string()))?;

        let columns = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let reader = builder.build().map_err(|e| CkpiError::Parquet(e.to_string()))?;

        let mut table = RawTable::new(columns);
        for batch_result in reader {
            let batch = batch_result.map_err(|e| CkpiError::Parquet(e.to_string()))?;
            table.extend_from_batch(&batch)?;
        }

        info!("Imported {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}
