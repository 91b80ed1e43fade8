//! Reports built from fundraising API records.

use fundsync_common::title_case;
use fundsync_model::{CellValue, Table};

use crate::error::{Result, TransformError};
use crate::filter::RowFilter;
use crate::label::SheetLabeler;
use crate::ops::{format_date_column, lowercase_column};
use crate::split::{SplitOutcome, split_by_column};
use crate::summary::column_total;

/// Member fields with no place in the progress report.
pub const MEMBER_DROP_FIELDS: [&str; 4] = ["id", "picture", "items", "url"];

pub const RAISED_COLUMN: &str = "Raised";
pub const TOTAL_RAISED_LABEL: &str = "Total Raised";

const TICKET_FIELDS: [(&str, &str); 8] = [
    ("name", "Name"),
    ("first_name", "First"),
    ("last_name", "Last"),
    ("email", "Email"),
    ("phone", "Phone"),
    ("title", "Title"),
    ("price", "Price"),
    ("created_at", "Signup Date"),
];

pub const TICKET_TITLE_COLUMN: &str = "Title";

/// `display_name` → `Display Name`.
pub fn field_to_header(field: &str) -> String {
    title_case(&field.replace('_', " "))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MembersReport {
    pub table: Table,
    pub total_raised: f64,
}

impl MembersReport {
    /// Summary row with the label left of the `Raised` column and the total under it.
    pub fn total_row(&self) -> Vec<CellValue> {
        let mut row = vec![CellValue::Empty; self.table.width()];
        match self.table.column_index(RAISED_COLUMN) {
            Some(idx) => {
                row[idx] = CellValue::Number(self.total_raised);
                if idx > 0 {
                    row[idx - 1] = CellValue::text(TOTAL_RAISED_LABEL);
                }
            }
            None => {
                row = vec![
                    CellValue::text(TOTAL_RAISED_LABEL),
                    CellValue::Number(self.total_raised),
                ];
            }
        }
        row
    }
}

/// Campaign members → progress table plus the sum of `Raised`.
pub fn members_report(mut members: Table) -> Result<MembersReport> {
    members.drop_columns(&MEMBER_DROP_FIELDS);
    let renames: Vec<(String, String)> = members
        .columns()
        .iter()
        .map(|c| (c.clone(), field_to_header(c)))
        .collect();
    members.rename_columns(&renames);
    let total_raised = if members.is_empty() && !members.has_column(RAISED_COLUMN) {
        0.0
    } else {
        column_total(&members, RAISED_COLUMN)?
    };
    Ok(MembersReport {
        table: members,
        total_raised,
    })
}

/// Tickets for titles starting with `year`, split by title in sorted order.
///
/// Emails are lowercased and `created_at` becomes `YYYY-MM-DD`.
pub fn tickets_report(mut tickets: Table, year: i32) -> Result<SplitOutcome> {
    if tickets.is_empty() && tickets.width() == 0 {
        return Ok(SplitOutcome::default());
    }
    lowercase_column(&mut tickets, "email");
    if tickets.has_column("title") {
        let removed = RowFilter::starts_with("title", year.to_string()).keep(&mut tickets);
        tracing::debug!(removed, year, "dropped tickets from other years");
    } else {
        tracing::warn!("ticket records have no title field, keeping every ticket");
    }

    let fields: Vec<&str> = TICKET_FIELDS.iter().map(|(field, _)| *field).collect();
    let mut report = tickets.select(&fields).map_err(|e| match e {
        fundsync_model::ModelError::MissingColumn { column } => {
            TransformError::missing("tickets report", &column)
        }
        other => TransformError::Model(other),
    })?;
    format_date_column(&mut report, "created_at", "%Y-%m-%d");
    report.rename_columns(&TICKET_FIELDS);

    let title_idx = report
        .column_index(TICKET_TITLE_COLUMN)
        .ok_or_else(|| TransformError::missing("tickets report", TICKET_TITLE_COLUMN))?;
    let mut rows = report.rows().to_vec();
    rows.sort_by_key(|row| row[title_idx].render());
    let sorted = Table::with_rows(report.columns().to_vec(), rows);

    split_by_column(&sorted, TICKET_TITLE_COLUMN, &SheetLabeler::ticket_titles())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members() -> Table {
        Table::with_rows(
            ["id", "first_name", "display_name", "picture", "raised", "goal"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![
                    CellValue::Number(1.0),
                    "jo".into(),
                    "Jo L".into(),
                    "p.png".into(),
                    CellValue::Number(120.0),
                    CellValue::Number(500.0),
                ],
                vec![
                    CellValue::Number(2.0),
                    "al".into(),
                    "Al B".into(),
                    CellValue::Empty,
                    CellValue::Number(30.5),
                    CellValue::Number(500.0),
                ],
            ],
        )
    }

    #[test]
    fn members_report_renames_and_totals() {
        let report = members_report(members()).unwrap();
        assert_eq!(
            report.table.columns(),
            &["First Name", "Display Name", "Raised", "Goal"]
        );
        assert_eq!(report.total_raised, 150.5);
        assert_eq!(
            report.total_row(),
            vec![
                CellValue::Empty,
                CellValue::text("Total Raised"),
                CellValue::Number(150.5),
                CellValue::Empty,
            ]
        );
    }

    fn ticket(title: &str, email: &str, created: &str) -> Vec<CellValue> {
        vec![
            "Jo Lee".into(),
            "Jo".into(),
            "Lee".into(),
            CellValue::text(email),
            CellValue::Empty,
            CellValue::text(title),
            CellValue::Number(50.0),
            CellValue::text(created),
        ]
    }

    #[test]
    fn tickets_report_filters_year_and_sorts_titles() {
        let columns = TICKET_FIELDS.iter().map(|(f, _)| f.to_string()).collect();
        let tickets = Table::with_rows(
            columns,
            vec![
                ticket("2025 Ride - Volunteer", "JO@X.COM", "2025-03-01T10:00:00Z"),
                ticket("2024 Ride - Rider", "old@x.com", "2024-03-01T10:00:00Z"),
                ticket("2025 Ride - Rider/Support", "b@x.com", "2025-04-02 09:30:00"),
            ],
        );

        let outcome = tickets_report(tickets, 2025).unwrap();

        assert_eq!(outcome.labels(), vec!["Rider_Support", "Volunteer"]);
        let volunteer = &outcome.groups[1].table;
        assert_eq!(volunteer.columns()[2], "Last");
        assert_eq!(volunteer.value(0, "Email").unwrap().render(), "jo@x.com");
        assert_eq!(
            volunteer.value(0, "Signup Date").unwrap().render(),
            "2025-03-01"
        );
    }

    #[test]
    fn tickets_report_requires_fields() {
        let tickets = Table::with_rows(
            vec!["title".into(), "email".into()],
            vec![vec!["2025 - Rider".into(), "a@x.com".into()]],
        );
        let err = tickets_report(tickets, 2025).unwrap_err();
        assert!(err.is_schema());
    }
}
