//! Multi-sheet workbook writer.

use std::collections::HashSet;
use std::path::Path;

use fundsync_model::{CellValue, SheetName, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::atomic::write_atomic;
use crate::error::{ReportError, Result};

/// Characters added to the widest value when sizing a column.
pub const COLUMN_PADDING: usize = 2;

/// Extra content written below a sheet's main table.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryBlock {
    /// Rows appended directly after the data rows, aligned to the main header.
    Rows(Vec<Vec<CellValue>>),
    /// A separate table with its own header, after one blank row.
    Table(Table),
}

/// One worksheet: label, main table and trailing summary blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSpec {
    pub label: String,
    pub table: Table,
    pub summaries: Vec<SummaryBlock>,
}

impl SheetSpec {
    pub fn new(label: impl Into<String>, table: Table) -> Self {
        Self {
            label: label.into(),
            table,
            summaries: Vec::new(),
        }
    }

    pub fn with_summary(mut self, block: SummaryBlock) -> Self {
        self.summaries.push(block);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookStats {
    pub sheets: usize,
    pub data_rows: usize,
}

/// Rows of one sheet as laid out on the grid; `None` is a blank spacer row.
fn layout(sheet: &SheetSpec) -> Vec<Option<Vec<CellValue>>> {
    let header = |table: &Table| {
        table
            .columns()
            .iter()
            .map(|c| CellValue::Text(c.clone()))
            .collect::<Vec<_>>()
    };
    let mut rows = vec![Some(header(&sheet.table))];
    rows.extend(sheet.table.rows().iter().cloned().map(Some));
    for block in &sheet.summaries {
        match block {
            SummaryBlock::Rows(extra) => rows.extend(extra.iter().cloned().map(Some)),
            SummaryBlock::Table(table) => {
                rows.push(None);
                rows.push(Some(header(table)));
                rows.extend(table.rows().iter().cloned().map(Some));
            }
        }
    }
    rows
}

/// Width per column: longest rendered value (header included) plus padding.
fn column_widths(grid: &[Option<Vec<CellValue>>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in grid.iter().flatten() {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.render().chars().count();
            if widths.len() <= idx {
                widths.resize(idx + 1, 0);
            }
            widths[idx] = widths[idx].max(len);
        }
    }
    widths.into_iter().map(|w| w + COLUMN_PADDING).collect()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    label: &SheetName,
    grid: &[Option<Vec<CellValue>>],
    header_format: &Format,
) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(label.as_str())?;
    for (row_idx, row) in grid.iter().enumerate() {
        let Some(row) = row else { continue };
        let row_num = row_idx as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_num = col_idx as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                CellValue::Text(s) if row_idx == 0 => {
                    worksheet.write_string_with_format(row_num, col_num, s, header_format)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
            }
        }
    }
    for (col_idx, width) in column_widths(grid).into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width as f64)?;
    }
    Ok(())
}

/// Validates labels: each must be a legal sheet name and unique ignoring case.
fn validate_labels(sheets: &[SheetSpec]) -> Result<Vec<SheetName>> {
    let mut seen = HashSet::new();
    sheets
        .iter()
        .map(|sheet| {
            let name = SheetName::new(sheet.label.clone())?;
            if !seen.insert(name.fold_key()) {
                return Err(ReportError::DuplicateSheet {
                    label: sheet.label.clone(),
                });
            }
            Ok(name)
        })
        .collect()
}

/// Writes `sheets` to a workbook at `path`, in order.
///
/// Labels are validated before anything touches the disk.
pub fn write_workbook(path: &Path, sheets: &[SheetSpec]) -> Result<WorkbookStats> {
    let names = validate_labels(sheets)?;
    let xlsx_error = |e: XlsxError| ReportError::Xlsx {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut stats = WorkbookStats::default();
    for (sheet, name) in sheets.iter().zip(&names) {
        let grid = layout(sheet);
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, name, &grid, &header_format).map_err(xlsx_error)?;
        stats.sheets += 1;
        stats.data_rows += sheet.table.len();
    }
    let bytes = workbook.save_to_buffer().map_err(xlsx_error)?;
    write_atomic(path, &bytes)?;

    tracing::info!(
        path = %path.display(),
        sheets = stats.sheets,
        rows = stats.data_rows,
        "wrote workbook"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes() -> Table {
        Table::with_rows(
            vec!["Email".into(), "Size".into()],
            vec![
                vec!["a.very.long@example.com".into(), "M".into()],
                vec!["b@x.com".into(), "L".into()],
            ],
        )
    }

    #[test]
    fn test_layout_places_summary_table_after_gap() {
        let counts = Table::with_rows(
            vec!["T-Shirt Size".into(), "Count".into()],
            vec![vec!["M".into(), CellValue::Number(1.0)]],
        );
        let sheet = SheetSpec::new("T-Shirt Sizes", sizes()).with_summary(SummaryBlock::Table(counts));
        let grid = layout(&sheet);

        assert_eq!(grid.len(), 6);
        assert!(grid[3].is_none());
        assert_eq!(grid[4].as_ref().unwrap()[0].render(), "T-Shirt Size");
    }

    #[test]
    fn test_column_widths_use_longest_value() {
        let grid = layout(&SheetSpec::new("S", sizes()));
        assert_eq!(column_widths(&grid), vec![23 + COLUMN_PADDING, 4 + COLUMN_PADDING]);
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let sheets = vec![SheetSpec::new("Rider", sizes()), SheetSpec::new("rider", sizes())];
        assert!(matches!(
            validate_labels(&sheets),
            Err(ReportError::DuplicateSheet { .. })
        ));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let sheets = vec![SheetSpec::new("a/b", sizes())];
        assert!(matches!(
            validate_labels(&sheets),
            Err(ReportError::InvalidSheet(_))
        ));
    }
}
