//! Column-level value rewrites.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use fundsync_common::title_case;
use fundsync_model::{CellValue, Table};

/// Replaces cells of `column` equal to `from` with `to`. Returns the count.
pub fn replace_exact(table: &mut Table, column: &str, from: &str, to: &str) -> usize {
    let mut replaced = 0;
    table.map_column(column, |cell| {
        if cell.as_str() == Some(from) {
            replaced += 1;
            CellValue::text(to)
        } else {
            cell.clone()
        }
    });
    replaced
}

pub fn lowercase_column(table: &mut Table, column: &str) {
    table.map_column(column, |cell| match cell {
        CellValue::Text(s) => CellValue::Text(s.to_lowercase()),
        other => other.clone(),
    });
}

pub fn title_case_column(table: &mut Table, column: &str) {
    table.map_column(column, |cell| match cell {
        CellValue::Text(s) => CellValue::Text(title_case(s)),
        other => other.clone(),
    });
}

fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    None
}

/// Reformats timestamps in `column` with the chrono format string `format`.
///
/// Unparseable values are left as they are. Returns how many were unparseable.
pub fn format_date_column(table: &mut Table, column: &str, format: &str) -> usize {
    let mut unparsed = 0;
    table.map_column(column, |cell| match cell.as_str().and_then(parse_timestamp) {
        Some(date) => CellValue::Text(date.format(format).to_string()),
        None => {
            if !cell.is_empty() {
                unparsed += 1;
            }
            cell.clone()
        }
    });
    if unparsed > 0 {
        tracing::warn!(column, unparsed, "left unparseable dates unchanged");
    }
    unparsed
}
