use ckpi_core::{CkpiError, Result};

pub const DATE_COLUMN: &str = "ckpi_statistics_date";
pub const VALUE_COLUMN: &str = "ave";
pub const KPI_COLUMN: &str = "ckpi";
pub const FLOOR_COLUMN: &str = "floor";
pub const EQUIPMENT_COLUMN: &str = "eq";

/// Checked in this order; the first absent one is reported.
pub const REQUIRED_COLUMNS: [&str; 5] =
    [DATE_COLUMN, VALUE_COLUMN, KPI_COLUMN, FLOOR_COLUMN, EQUIPMENT_COLUMN];

/// Positions of the required columns within a table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub ave: usize,
    pub kpi: usize,
    pub floor: usize,
    pub equipment: usize,
}

impl ColumnMap {
    /// Match headers case-insensitively. When two headers collide the
    /// first one wins.
    pub fn resolve(columns: &[String]) -> Result<Self> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| CkpiError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            date: find(DATE_COLUMN)?,
            ave: find(VALUE_COLUMN)?,
            kpi: find(KPI_COLUMN)?,
            floor: find(FLOOR_COLUMN)?,
            equipment: find(EQUIPMENT_COLUMN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_mixed_case_headers() {
        let map = ColumnMap::resolve(&header(&["EQ", "Floor", "extra", "CKPI", "Ave", "CKPI_Statistics_Date"])).unwrap();
        assert_eq!(
            map,
            ColumnMap {
                date: 5,
                ave: 4,
                kpi: 3,
                floor: 1,
                equipment: 0
            }
        );
    }

    #[test]
    fn names_first_missing_column() {
        let err = ColumnMap::resolve(&header(&["ckpi_statistics_date", "ave", "ckpi", "eq"])).unwrap_err();
        assert!(matches!(err, CkpiError::MissingColumn(ref c) if c == "floor"));
        assert_eq!(err.to_string(), "Required column 'floor' not found");
    }
}
