//! Workbook reading through calamine.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use fundsync_common::strip_header_noise;
use fundsync_model::{CellValue, Table};

use crate::error::{IngestError, Result};

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        other => CellValue::text(other.to_string()),
    }
}

/// Reads every sheet of a workbook whose name starts with `sheet_prefix`
/// (all sheets when `None`). The first row of each sheet is the header.
///
/// Returns `(sheet name, table)` pairs in workbook order.
pub fn read_xlsx_tables(path: &Path, sheet_prefix: Option<&str>) -> Result<Vec<(String, Table)>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let workbook_error = |message: String| IngestError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    let mut tables = Vec::new();

    for sheet_name in workbook.sheet_names().to_vec() {
        if let Some(prefix) = sheet_prefix
            && !sheet_name.starts_with(prefix)
        {
            continue;
        }
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| workbook_error(format!("sheet '{sheet_name}': {e}")))?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            tables.push((sheet_name, Table::default()));
            continue;
        };
        let columns: Vec<String> = header
            .iter()
            .map(|cell| strip_header_noise(&cell.to_string()))
            .collect();
        let mut table = Table::new(columns);
        for row in rows {
            let values: Vec<CellValue> = row.iter().map(cell_to_value).collect();
            if values.iter().all(CellValue::is_empty) {
                continue;
            }
            table.push_row(values);
        }
        tracing::debug!(
            path = %path.display(),
            sheet = %sheet_name,
            rows = table.len(),
            "loaded worksheet"
        );
        tables.push((sheet_name, table));
    }

    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_fixture(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("parsed.xlsx");
        let mut workbook = Workbook::new();
        for (name, who) in [("MV Rider", "Jo"), ("MV Volunteer", "Al"), ("Other", "Zed")] {
            let sheet = workbook.add_worksheet();
            sheet.set_name(name).unwrap();
            sheet.write_string(0, 0, "First Name").unwrap();
            sheet.write_string(0, 1, "Raised").unwrap();
            sheet.write_string(1, 0, who).unwrap();
            sheet.write_number(1, 1, 25.0).unwrap();
        }
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_read_xlsx_with_prefix() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(dir.path());

        let tables = read_xlsx_tables(&path, Some("MV")).unwrap();
        let names: Vec<&str> = tables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["MV Rider", "MV Volunteer"]);
        assert_eq!(tables[0].1.rows()[0][1], CellValue::Number(25.0));
    }

    #[test]
    fn test_read_xlsx_missing_file() {
        let result = read_xlsx_tables(Path::new("/nope/missing.xlsx"), None);
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
