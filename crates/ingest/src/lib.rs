//! Reading KPI measurement files and narrowing them to a selection.
//!
//! CSV, JSON and Parquet inputs are first read into an untyped
//! [`RawTable`], then converted to [`ckpi_core::Measurement`]s once the
//! required columns are located.

pub mod columns;
pub mod csv_import;
pub mod dates;
pub mod filter;
pub mod import;
pub mod json_import;
pub mod parquet_import;
pub mod table;

pub use columns::{ColumnMap, REQUIRED_COLUMNS};
pub use dates::parse_day_first;
pub use filter::{
    default_choice, distinct_equipment, distinct_floors, DatePreset, DateRange, FilterSelection,
};
pub use import::{load_measurements, measurements_from_table, read_table, IngestOutcome};
pub use table::{RawTable, SourceFormat};
