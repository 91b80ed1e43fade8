//! Row predicates.

use fundsync_model::{RowRef, Table};
use serde::{Deserialize, Serialize};

/// Comparison applied to one column's rendered, trimmed value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FilterOp {
    Equals(String),
    OneOf(Vec<String>),
    StartsWith(String),
    IsEmpty,
}

/// A predicate over one column, e.g. `Item Subtype == ticket`.
///
/// In config: `{ column = "Item Subtype", op = "equals", value = "ticket" }`.
///
/// Rows lacking the column render as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RowFilter {
    pub column: String,
    #[serde(flatten)]
    pub op: FilterOp,
}

impl RowFilter {
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Equals(value.into()),
        }
    }

    pub fn one_of(column: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::OneOf(values),
        }
    }

    pub fn starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::StartsWith(prefix.into()),
        }
    }

    pub fn matches(&self, row: RowRef<'_>) -> bool {
        let value = row.text(&self.column);
        let value = value.trim();
        match &self.op {
            FilterOp::Equals(expected) => value == expected,
            FilterOp::OneOf(options) => options.iter().any(|o| o == value),
            FilterOp::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            FilterOp::IsEmpty => value.is_empty(),
        }
    }

    /// Keeps matching rows; returns how many were removed.
    pub fn keep(&self, table: &mut Table) -> usize {
        let before = table.len();
        table.retain_rows(|row| self.matches(row));
        before - table.len()
    }

    /// Removes matching rows; returns how many were removed.
    pub fn exclude(&self, table: &mut Table) -> usize {
        let before = table.len();
        table.retain_rows(|row| !self.matches(row));
        before - table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundsync_model::CellValue;

    fn table() -> Table {
        Table::with_rows(
            vec!["Item Subtype".into(), "Email".into()],
            vec![
                vec!["ticket".into(), "a@x.com".into()],
                vec!["donation".into(), "b@x.com".into()],
                vec![" ticket ".into(), CellValue::Empty],
            ],
        )
    }

    #[test]
    fn keep_matching_rows() {
        let mut t = table();
        let removed = RowFilter::equals("Item Subtype", "ticket").keep(&mut t);
        assert_eq!(removed, 1);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn exclude_empty_values() {
        let mut t = table();
        let filter = RowFilter {
            column: "Email".into(),
            op: FilterOp::IsEmpty,
        };
        assert_eq!(filter.exclude(&mut t), 1);
    }

    #[test]
    fn missing_column_renders_empty() {
        let mut t = table();
        let removed = RowFilter::starts_with("Title", "2025").keep(&mut t);
        assert_eq!(removed, 3);
    }
}
