//! JSON input in three layouts: an array of records, newline-delimited
//! records, or a column-oriented object (`{"col": [..]}` or
//! `{"col": {"0": .., "1": ..}}`).

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use ckpi_core::{CkpiError, Result};

use crate::table::{normalize_cell, RawTable};

pub struct JsonImporter;

impl JsonImporter {
    pub fn import(path: &Path) -> Result<RawTable> {
        let text = std::fs::read_to_string(path).map_err(CkpiError::Io)?;
        let table = Self::parse(&text)?;
        info!("Imported {} rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn parse(text: &str) -> Result<RawTable> {
        if text.trim().is_empty() {
            return Err(CkpiError::EmptyInput);
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => from_records(items.into_iter().map(into_object)),
            Ok(Value::Object(map)) if is_column_oriented(&map) => from_columns(map),
            Ok(Value::Object(map)) => from_records(std::iter::once(Ok(map))),
            Ok(other) => Err(CkpiError::Serialize(format!(
                "expected JSON records, got {}",
                other
            ))),
            Err(_) => from_records(
                text.lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| serde_json::from_str::<Value>(l).map_err(json_err).and_then(into_object)),
            ),
        }
    }
}

fn json_err(e: serde_json::Error) -> CkpiError {
    CkpiError::Serialize(e.to_string())
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CkpiError::Serialize(format!("expected a JSON object, got {}", other))),
    }
}

fn is_column_oriented(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(|v| v.is_array() || v.is_object())
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => normalize_cell(s),
        other => normalize_cell(&other.to_string()),
    }
}

fn from_records<I>(records: I) -> Result<RawTable>
where
    I: Iterator<Item = Result<Map<String, Value>>>,
{
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sparse: Vec<Vec<(usize, Option<String>)>> = Vec::new();

    for record in records {
        let record = record?;
        let mut row = Vec::with_capacity(record.len());
        for (key, value) in &record {
            let pos = *index.entry(key.clone()).or_insert_with(|| {
                columns.push(key.clone());
                columns.len() - 1
            });
            row.push((pos, cell(value)));
        }
        sparse.push(row);
    }

    let mut table = RawTable::new(columns);
    let width = table.columns.len();
    for row in sparse {
        let mut dense = vec![None; width];
        for (pos, value) in row {
            dense[pos] = value;
        }
        table.rows.push(dense);
    }
    Ok(table)
}

fn from_columns(map: Map<String, Value>) -> Result<RawTable> {
    let columns: Vec<String> = map.keys().cloned().collect();

    // Index labels across all columns, numeric labels in numeric order.
    let mut labels: Vec<String> = Vec::new();
    let mut max_len = 0usize;
    for value in map.values() {
        match value {
            Value::Array(items) => max_len = max_len.max(items.len()),
            Value::Object(inner) => {
                for key in inner.keys() {
                    if !labels.contains(key) {
                        labels.push(key.clone());
                    }
                }
            }
            _ => {}
        }
    }
    labels.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });

    let row_count = max_len.max(labels.len());
    let mut table = RawTable::new(columns);
    for row_idx in 0..row_count {
        let row = map
            .values()
            .map(|value| match value {
                Value::Array(items) => items.get(row_idx).and_then(cell),
                Value::Object(inner) => labels
                    .get(row_idx)
                    .and_then(|label| inner.get(label))
                    .and_then(cell),
                _ => None,
            })
            .collect();
        table.rows.push(row);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column<'a>(table: &'a RawTable, name: &str) -> Vec<Option<&'a str>> {
        let pos = table.columns.iter().position(|c| c == name).unwrap();
        table.rows.iter().map(|r| r[pos].as_deref()).collect()
    }

    #[test]
    fn array_of_records() {
        let table = JsonImporter::parse(
            r#"[{"ckpi":"doorfriction","floor":3,"ave":40.5},{"ckpi":"doorfriction","floor":3,"ave":null}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(column(&table, "floor"), vec![Some("3"), Some("3")]);
        assert_eq!(column(&table, "ave"), vec![Some("40.5"), None]);
    }

    #[test]
    fn newline_delimited_records() {
        let text = "{\"ckpi\":\"a\",\"ave\":1}\n\n{\"ckpi\":\"b\",\"eq\":\"EQ2\"}\n";
        let table = JsonImporter::parse(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(column(&table, "ckpi"), vec![Some("a"), Some("b")]);
        assert_eq!(column(&table, "eq"), vec![None, Some("EQ2")]);
    }

    #[test]
    fn column_oriented_with_index_labels() {
        let text = r#"{"ckpi":{"0":"a","1":"b","10":"c","2":"d"},"ave":{"0":1,"1":2,"2":3,"10":4}}"#;
        let table = JsonImporter::parse(text).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(column(&table, "ckpi"), vec![Some("a"), Some("b"), Some("d"), Some("c")]);
        assert_eq!(column(&table, "ave"), vec![Some("1"), Some("2"), Some("3"), Some("4")]);
    }

    #[test]
    fn column_oriented_with_arrays() {
        let table = JsonImporter::parse(r#"{"ckpi":["a","b"],"ave":[1.5]}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(column(&table, "ave"), vec![Some("1.5"), None]);
    }

    #[test]
    fn empty_and_scalar_inputs_fail() {
        assert!(matches!(JsonImporter::parse("  \n"), Err(CkpiError::EmptyInput)));
        assert!(JsonImporter::parse("42").is_err());
        assert!(JsonImporter::parse("[1, 2]").is_err());
    }
}
