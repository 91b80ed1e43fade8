//! Header-driven in-memory table.
//!
//! Column sets are dynamic: they come from whatever header the source file or
//! API payload carries. Rows are stored positionally and always kept exactly as
//! wide as the header.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A single scalar cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Builds a text cell, mapping blank strings to [`CellValue::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(value) => value.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the cell; text cells are parsed leniently.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Number(value) => Some(*value),
            Self::Text(value) => {
                let cleaned: String = value
                    .trim()
                    .chars()
                    .filter(|ch| *ch != ',' && *ch != '$')
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok()
                }
            }
        }
    }

    /// String form used for display, width sizing and row equality.
    pub fn render(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(value) => value.clone(),
            Self::Number(value) => format_number(*value),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Formats a number without trailing zeros (`25.0` → `25`, `2.50` → `2.5`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let s = format!("{value}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [CellValue],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    /// Rendered value of `column`, empty when the column is absent.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(CellValue::render).unwrap_or_default()
    }

    pub fn values(&self) -> &'a [CellValue] {
        self.values
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table, padding or truncating each row to the header width.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<RowRef<'_>> {
        self.rows.get(idx).map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of a column that must exist.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ModelError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// Values of one column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Applies `f` to every value of `column`; no-op when the column is absent.
    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(&CellValue) -> CellValue) {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Appends a column. Missing trailing values are left empty.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(ModelError::DuplicateColumn { column: name });
        }
        self.columns.push(name);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
        Ok(())
    }

    /// Drops every listed column that exists; returns the names actually removed.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.iter().any(|n| n.as_ref() == c))
            .collect();
        self.retain_columns_by_mask(&keep)
    }

    /// Drops columns whose every value is empty.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| self.rows.iter().any(|row| !row[idx].is_empty()))
            .collect();
        self.retain_columns_by_mask(&keep)
    }

    fn retain_columns_by_mask(&mut self, keep: &[bool]) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for (column, keep) in self.columns.drain(..).zip(keep) {
            if *keep {
                columns.push(column);
            } else {
                dropped.push(column);
            }
        }
        self.columns = columns;
        for row in &mut self.rows {
            let mut idx = 0;
            row.retain(|_| {
                let kept = keep[idx];
                idx += 1;
                kept
            });
        }
        dropped
    }

    /// Renames columns by `(from, to)` pairs; absent sources are ignored.
    pub fn rename_columns<S: AsRef<str>, T: AsRef<str>>(&mut self, renames: &[(S, T)]) {
        for column in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from.as_ref() == column) {
                *column = to.as_ref().to_string();
            }
        }
    }

    /// Projects the table onto `columns`, in that order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| self.require_column(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|idx| row[*idx].clone()).collect())
            .collect();
        Ok(Table {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        })
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(RowRef<'_>) -> bool) {
        let columns = &self.columns;
        self.rows.retain(|values| keep(RowRef { columns, values }));
    }

    /// Copy of the rows matching `keep`.
    pub fn filter(&self, mut keep: impl FnMut(RowRef<'_>) -> bool) -> Table {
        let rows = self
            .iter_rows()
            .filter(|row| keep(*row))
            .map(|row| row.values().to_vec())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Appends `other`'s rows, aligning by column name. Columns only present
    /// in `other` are added to the end of the header.
    pub fn append(&mut self, other: &Table) {
        for column in &other.columns {
            if !self.has_column(column) {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(CellValue::Empty);
                }
            }
        }
        for row in other.iter_rows() {
            let aligned = self
                .columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or_default())
                .collect();
            self.rows.push(aligned);
        }
    }

    /// Rendered row values aligned to `columns` (absent columns render empty).
    pub fn rendered_rows<S: AsRef<str>>(&self, columns: &[S]) -> Vec<Vec<String>> {
        let indices: Vec<Option<usize>> = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect();
        self.rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.map(|i| row[i].render()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
