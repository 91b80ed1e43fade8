//! Transaction export cleanup: ticket filtering, team-member email fixes and
//! per-cohort subsets.

use fundsync_model::{MappingEntry, RowRef, Table};
use serde::{Deserialize, Serialize};

use crate::filter::RowFilter;
use crate::ops::replace_exact;
use crate::reconcile::{ReconcileStats, Reconciler};

pub const DESCRIPTION_COLUMN: &str = "Item Description";
pub const SUBTYPE_COLUMN: &str = "Item Subtype";
pub const TEAM_MEMBER_COLUMN: &str = "Team Member";
pub const FIRST_NAME_COLUMN: &str = "First Name";
pub const EMAIL_COLUMN: &str = "Email";

/// A transaction description routed to its own snapshot dataset and sheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cohort {
    pub description: String,
    pub dataset: String,
}

impl Cohort {
    pub fn new(description: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            dataset: dataset.into(),
        }
    }

    /// Rows whose description equals this cohort's description exactly.
    pub fn subset(&self, table: &Table) -> Table {
        let filter = RowFilter::equals(DESCRIPTION_COLUMN, self.description.as_str());
        table.filter(|row| filter.matches(row))
    }
}

/// Rewrites misspelled descriptions; returns how many cells changed.
pub fn fix_descriptions(table: &mut Table, fixes: &[(String, String)]) -> usize {
    fixes
        .iter()
        .map(|(from, to)| replace_exact(table, DESCRIPTION_COLUMN, from, to))
        .sum()
}

/// Keeps only rows with `Item Subtype == ticket`. Returns rows removed.
pub fn keep_tickets(table: &mut Table) -> usize {
    RowFilter::equals(SUBTYPE_COLUMN, "ticket").keep(table)
}

/// True when the first word of `Team Member` differs from `First Name`, ignoring case.
fn buyer_is_not_team_member(row: RowRef<'_>) -> bool {
    let team_member = row.text(TEAM_MEMBER_COLUMN);
    let team_first = team_member.split_whitespace().next().unwrap_or("");
    !team_first.eq_ignore_ascii_case(row.text(FIRST_NAME_COLUMN).trim())
}

/// Replaces `Email` with the mapped team-member address on rows bought on
/// someone else's behalf.
///
/// `entries` are keyed by the full `Team Member` value. Tables missing either
/// name column pass through unchanged.
pub fn correct_team_member_emails(table: &mut Table, entries: &[MappingEntry]) -> ReconcileStats {
    if !table.has_column(TEAM_MEMBER_COLUMN) || !table.has_column(FIRST_NAME_COLUMN) {
        tracing::debug!("no team member columns, skipping email correction");
        return ReconcileStats::default();
    }
    Reconciler::new(vec![EMAIL_COLUMN.to_string()])
        .with_id_column(TEAM_MEMBER_COLUMN)
        .with_row_predicate(buyer_is_not_team_member)
        .with_entries(entries.iter().filter(|e| !e.is_global()).cloned())
        .apply(table)
}
