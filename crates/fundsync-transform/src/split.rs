//! Partitioning a table into labeled groups.

use std::collections::HashSet;

use fundsync_model::Table;

use crate::error::{Result, TransformError};
use crate::label::{SheetLabeler, with_suffix};

/// One partition of the input table.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitGroup {
    pub label: String,
    pub raw_value: String,
    pub table: Table,
}

/// Two raw values that cleaned to the same label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCollision {
    pub raw_value: String,
    pub base_label: String,
    pub assigned_label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitOutcome {
    pub groups: Vec<SplitGroup>,
    pub collisions: Vec<LabelCollision>,
}

impl SplitOutcome {
    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.label.as_str()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|g| g.table.len()).sum()
    }
}

/// Splits `table` by the distinct values of `column`, in first-seen order.
///
/// Labels are unique case-insensitively; a raw value whose label is already
/// taken gets a `~N` suffix and is reported as a collision.
pub fn split_by_column(table: &Table, column: &str, labeler: &SheetLabeler) -> Result<SplitOutcome> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| TransformError::missing("split", column))?;

    let mut raw_order: Vec<String> = Vec::new();
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let raw = row[idx].render().trim().to_string();
        match raw_order.iter().position(|r| *r == raw) {
            Some(pos) => buckets[pos].push(row_idx),
            None => {
                raw_order.push(raw);
                buckets.push(vec![row_idx]);
            }
        }
    }

    let mut outcome = SplitOutcome::default();
    let mut taken: HashSet<String> = HashSet::new();
    for (raw_value, rows) in raw_order.into_iter().zip(buckets) {
        let base = labeler.label(&raw_value);
        let mut label = base.clone();
        let mut n = 2;
        while taken.contains(&label.to_lowercase()) {
            label = with_suffix(&base, n);
            n += 1;
        }
        if label != base {
            tracing::warn!(
                raw_value = %raw_value,
                base = %base,
                assigned = %label,
                "group label collision"
            );
            outcome.collisions.push(LabelCollision {
                raw_value: raw_value.clone(),
                base_label: base,
                assigned_label: label.clone(),
            });
        }
        taken.insert(label.to_lowercase());

        let sub = Table::with_rows(
            table.columns().to_vec(),
            rows.iter().map(|r| table.rows()[*r].clone()).collect(),
        );
        outcome.groups.push(SplitGroup {
            label,
            raw_value,
            table: sub,
        });
    }

    tracing::debug!(
        column,
        groups = outcome.groups.len(),
        collisions = outcome.collisions.len(),
        "split table"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tickets(types: &[&str]) -> Table {
        Table::with_rows(
            vec!["Ticket Type".into(), "Email".into()],
            types
                .iter()
                .enumerate()
                .map(|(i, t)| vec![(*t).into(), format!("p{i}@x.com").into()])
                .collect(),
        )
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let table = tickets(&["2025 - Volunteer", "2025 - Rider", "2025 - Volunteer"]);
        let outcome = split_by_column(&table, "Ticket Type", &SheetLabeler::ticket_types()).unwrap();

        assert_eq!(outcome.labels(), vec!["Volunteer", "Rider"]);
        assert_eq!(outcome.groups[0].table.len(), 2);
        assert_eq!(outcome.total_rows(), 3);
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn colliding_labels_are_disambiguated() {
        let table = tickets(&["2025 - Rider", "2024 - Rider", "A - rider"]);
        let outcome = split_by_column(&table, "Ticket Type", &SheetLabeler::ticket_types()).unwrap();

        assert_eq!(outcome.labels(), vec!["Rider", "Rider~2", "rider~3"]);
        assert_eq!(outcome.collisions.len(), 2);
        assert_eq!(outcome.collisions[0].raw_value, "2024 - Rider");
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = tickets(&["x"]);
        let err = split_by_column(&table, "Title", &SheetLabeler::default()).unwrap_err();
        assert!(err.is_schema());
    }
}
