//! Flattening JSON API records into tables.

use fundsync_model::{CellValue, Table};
use serde_json::Value;

use crate::error::{IngestError, Result};

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) => CellValue::text(s.as_str()),
        Value::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
        Value::Bool(b) => CellValue::Text(b.to_string()),
        nested => CellValue::Text(nested.to_string()),
    }
}

/// Builds a table from a list of JSON objects.
///
/// Columns are the union of keys in first-seen order; keys missing from a
/// record become empty cells. Nested arrays and objects are kept as JSON text.
pub fn records_to_table(records: &[Value]) -> Result<Table> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        let Value::Object(map) = record else {
            return Err(IngestError::InvalidRecords {
                message: format!("expected a JSON object, found {record}"),
            });
        };
        for key in map.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns.clone());
    for record in records {
        let row = columns
            .iter()
            .map(|c| record.get(c).map_or(CellValue::Empty, json_to_cell))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}
