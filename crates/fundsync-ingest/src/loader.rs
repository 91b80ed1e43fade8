//! Format dispatch for tabular inputs.

use std::path::Path;

use fundsync_model::Table;

use crate::csv_table::read_csv_table;
use crate::error::{IngestError, Result};
use crate::xlsx::read_xlsx_tables;

/// On-disk format of a tabular input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// A table together with the name it was loaded under.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    /// Sheet name for spreadsheets, file stem for CSV.
    pub name: String,
    pub table: Table,
}

/// Loads one or more tables from `path`.
///
/// CSV files yield a single table; spreadsheets yield one table per sheet
/// matching `sheet_prefix`.
pub fn load_tables(path: &Path, sheet_prefix: Option<&str>) -> Result<Vec<LoadedTable>> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Csv) => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            Ok(vec![LoadedTable {
                name,
                table: read_csv_table(path)?,
            }])
        }
        Some(TableFormat::Spreadsheet) => Ok(read_xlsx_tables(path, sheet_prefix)?
            .into_iter()
            .map(|(name, table)| LoadedTable { name, table })
            .collect()),
        None => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Fails with [`IngestError::MissingColumn`] naming the first absent column.
pub fn require_columns(table: &Table, columns: &[&str], source_name: &str) -> Result<()> {
    match columns.iter().find(|c| !table.has_column(c)) {
        Some(column) => Err(IngestError::MissingColumn {
            column: (*column).to_string(),
            source_name: source_name.to_string(),
        }),
        None => Ok(()),
    }
}
