//! Change detection against the previous snapshot of a dataset.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fundsync_ingest::read_csv_table;
use fundsync_model::{CellValue, Table};

use crate::csv_out::write_csv_table;
use crate::error::Result;
use crate::snapshot::{SnapshotRecord, SnapshotRegistry};

/// Leading column of a changes file.
pub const CHANGE_COLUMN: &str = "Change";

/// Multiset difference between two tables, rows rendered as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Union of both headers: new table's columns first.
    pub columns: Vec<String>,
    pub added: Vec<Vec<String>>,
    pub removed: Vec<Vec<String>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// The change set as a table with a leading `Change` column.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![CHANGE_COLUMN.to_string()];
        columns.extend(self.columns.iter().cloned());
        let tagged = |kind: &str, row: &Vec<String>| {
            std::iter::once(CellValue::text(kind))
                .chain(row.iter().map(|v| CellValue::text(v.as_str())))
                .collect::<Vec<_>>()
        };
        let rows = self
            .added
            .iter()
            .map(|row| tagged("added", row))
            .chain(self.removed.iter().map(|row| tagged("removed", row)))
            .collect();
        Table::with_rows(columns, rows)
    }
}

/// Rows in `new` but not `old` (added) and in `old` but not `new` (removed),
/// counting duplicates. Columns are aligned by name.
pub fn diff_tables(new: &Table, old: &Table) -> ChangeSet {
    let mut columns: Vec<String> = new.columns().to_vec();
    for column in old.columns() {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    let old_rows = old.rendered_rows(&columns);
    let mut remaining: HashMap<&Vec<String>, usize> = HashMap::new();
    for row in &old_rows {
        *remaining.entry(row).or_default() += 1;
    }

    let mut added = Vec::new();
    for row in new.rendered_rows(&columns) {
        match remaining.get_mut(&row) {
            Some(n) if *n > 0 => *n -= 1,
            _ => added.push(row),
        }
    }

    let mut removed = Vec::new();
    for row in &old_rows {
        if let Some(n) = remaining.get_mut(row)
            && *n > 0
        {
            *n -= 1;
            removed.push(row.clone());
        }
    }

    ChangeSet {
        columns,
        added,
        removed,
    }
}

/// Result of snapshotting a dataset and diffing it against its predecessor.
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
    pub snapshot: SnapshotRecord,
    pub previous: Option<PathBuf>,
    pub changes: ChangeSet,
    /// `changes_<snapshot file>`, written only when there are changes.
    pub changes_file: Option<PathBuf>,
}

impl ChangeOutcome {
    pub fn describe(&self) -> String {
        match (&self.previous, &self.changes_file) {
            (None, _) => "first snapshot".to_string(),
            (Some(_), None) => "no changes".to_string(),
            (Some(_), Some(_)) => format!(
                "{} added, {} removed",
                self.changes.added.len(),
                self.changes.removed.len()
            ),
        }
    }
}

/// Records `table` as the newest snapshot of `dataset` and diffs it against
/// the single latest prior snapshot.
pub fn detect_changes(
    registry: &mut SnapshotRegistry,
    dataset: &str,
    table: &Table,
    at: DateTime<Utc>,
) -> Result<ChangeOutcome> {
    let previous = registry.latest(dataset)?;
    let snapshot = registry.record(dataset, table, at)?;

    let Some(previous_path) = previous else {
        tracing::info!(dataset, "no previous snapshot; nothing to compare");
        return Ok(ChangeOutcome {
            snapshot,
            previous: None,
            changes: ChangeSet::default(),
            changes_file: None,
        });
    };

    let prior = read_csv_table(&previous_path)?;
    let changes = diff_tables(table, &prior);
    let changes_file = if changes.is_empty() {
        tracing::info!(dataset, "no changes detected");
        None
    } else {
        let path = registry.dir().join(format!("changes_{}", snapshot.file));
        write_csv_table(&path, &changes.to_table())?;
        tracing::info!(
            dataset,
            added = changes.added.len(),
            removed = changes.removed.len(),
            path = %path.display(),
            "wrote changes file"
        );
        Some(path)
    };

    Ok(ChangeOutcome {
        snapshot,
        previous: Some(previous_path),
        changes,
        changes_file,
    })
}
