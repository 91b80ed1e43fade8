//! Polars `AnyValue` to model conversion.

use fundsync_model::{CellValue, Table, format_number};
use polars::prelude::*;

/// Converts a Polars `AnyValue` to its display string.
///
/// `Null` becomes the empty string; floats drop trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_number(f64::from(v)),
        AnyValue::Float64(v) => format_number(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Converts a Polars `AnyValue` to a [`CellValue`].
///
/// Strings stay text verbatim; numeric types become [`CellValue::Number`].
pub fn any_to_cell(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Empty,
        AnyValue::Int8(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int16(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int32(v) => CellValue::Number(f64::from(v)),
        AnyValue::Int64(v) => CellValue::Number(v as f64),
        AnyValue::UInt8(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt16(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt32(v) => CellValue::Number(f64::from(v)),
        AnyValue::UInt64(v) => CellValue::Number(v as f64),
        AnyValue::Float32(v) => CellValue::Number(f64::from(v)),
        AnyValue::Float64(v) => CellValue::Number(v),
        AnyValue::String(s) => CellValue::text(s),
        AnyValue::StringOwned(s) => CellValue::text(s.to_string()),
        other => CellValue::text(any_to_string(other)),
    }
}

/// Copies a DataFrame into a [`Table`], keeping column order.
///
/// Rows whose every cell is empty are skipped.
pub fn dataframe_to_table(df: &DataFrame, columns: Vec<String>) -> PolarsResult<Table> {
    let series: Vec<&Column> = df.get_columns().iter().collect();
    let mut table = Table::new(columns);
    for idx in 0..df.height() {
        let row: Vec<CellValue> = series
            .iter()
            .map(|s| any_to_cell(s.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(row);
    }
    Ok(table)
}
