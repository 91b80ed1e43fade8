//! Google Contacts CSV layout.
//!
//! [`build_contact_export`] turns roster sheets into the import template;
//! [`contacts_from_export`] reads that template back into [`ContactRecord`]s
//! for the sync engine.

use fundsync_model::{CellValue, ContactRecord, MappingEntry, Table};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::ops::title_case_column;
use crate::reconcile::Reconciler;

/// Header of the Google Contacts import file, in order.
pub const CONTACT_EXPORT_COLUMNS: [&str; 36] = [
    "Name Prefix",
    "First Name",
    "Middle Name",
    "Last Name",
    "Name Suffix",
    "Phonetic First Name",
    "Phonetic Middle Name",
    "Phonetic Last Name",
    "Nickname",
    "File As",
    "E-mail 1 - Label",
    "E-mail 1 - Value",
    "Phone 1 - Label",
    "Phone 1 - Value",
    "Address 1 - Label",
    "Address 1 - Country",
    "Address 1 - Street",
    "Address 1 - Extended Address",
    "Address 1 - City",
    "Address 1 - Region",
    "Address 1 - Postal Code",
    "Address 1 - PO Box",
    "Organization Name",
    "Organization Title",
    "Organization Department",
    "Birthday",
    "Event 1 - Label",
    "Event 1 - Value",
    "Relation 1 - Label",
    "Relation 1 - Value",
    "Website 1 - Label",
    "Website 1 - Value",
    "Custom Field 1 - Label",
    "Custom Field 1 - Value",
    "Notes",
    "Labels",
];

/// Separator Google uses between several labels in one `Labels` cell.
pub const LABEL_SEPARATOR: &str = " ::: ";

const EMAIL_VALUE: &str = "E-mail 1 - Value";
const PHONE_VALUE: &str = "Phone 1 - Value";
const LABELS: &str = "Labels";

/// Assigns a contact group to every row of a sheet with this exact name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupTagRule {
    pub sheet: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactExportOptions {
    pub first_name_column: String,
    pub last_name_column: String,
    pub email_column: String,
    /// Optional; sheets without it export an empty phone.
    pub phone_column: String,
    pub tag_rules: Vec<GroupTagRule>,
    /// Tag for sheets no rule names.
    pub default_tag: String,
}

impl Default for ContactExportOptions {
    fn default() -> Self {
        Self {
            first_name_column: "First Name".to_string(),
            last_name_column: "Last Name".to_string(),
            email_column: "Email".to_string(),
            phone_column: "Phone".to_string(),
            tag_rules: vec![GroupTagRule {
                sheet: "MV Volunteer".to_string(),
                tag: "2025_Volunteer".to_string(),
            }],
            default_tag: "2025_Rider".to_string(),
        }
    }
}

impl ContactExportOptions {
    pub fn tag_for(&self, sheet: &str) -> &str {
        self.tag_rules
            .iter()
            .find(|rule| rule.sheet == sheet)
            .map_or(self.default_tag.as_str(), |rule| rule.tag.as_str())
    }
}

/// Builds the Google Contacts import table from `(sheet name, roster)` pairs.
///
/// Global `substitutions` apply to names, email, phone and tag before names
/// are title-cased.
pub fn build_contact_export<'a>(
    sheets: impl IntoIterator<Item = (&'a str, &'a Table)>,
    options: &ContactExportOptions,
    substitutions: &[MappingEntry],
) -> Result<Table> {
    const STAGE: &str = "contact export";
    let working_columns = ["First", "Last", "Email", "Phone", "Tag"];
    let mut working = Table::new(working_columns.iter().map(|c| (*c).to_string()).collect());

    for (sheet, roster) in sheets {
        for required in [
            &options.first_name_column,
            &options.last_name_column,
            &options.email_column,
        ] {
            if !roster.has_column(required) {
                return Err(TransformError::MissingColumn {
                    stage: STAGE,
                    column: format!("{required} (sheet '{sheet}')"),
                });
            }
        }
        let tag = options.tag_for(sheet);
        for row in roster.iter_rows() {
            working.push_row(vec![
                row.get(&options.first_name_column).cloned().unwrap_or_default(),
                row.get(&options.last_name_column).cloned().unwrap_or_default(),
                row.get(&options.email_column).cloned().unwrap_or_default(),
                row.get(&options.phone_column).cloned().unwrap_or_default(),
                CellValue::text(tag),
            ]);
        }
    }

    let global: Vec<MappingEntry> = substitutions
        .iter()
        .filter(|entry| entry.is_global())
        .cloned()
        .collect();
    Reconciler::new(working_columns.iter().map(|c| (*c).to_string()).collect())
        .with_entries(global)
        .apply(&mut working);
    title_case_column(&mut working, "First");
    title_case_column(&mut working, "Last");

    let mut export = Table::new(CONTACT_EXPORT_COLUMNS.iter().map(|c| (*c).to_string()).collect());
    for row in working.iter_rows() {
        let mut values = vec![CellValue::Empty; CONTACT_EXPORT_COLUMNS.len()];
        for (column, value) in [
            ("First Name", row.text("First")),
            ("Last Name", row.text("Last")),
            ("E-mail 1 - Label", "Email".to_string()),
            (EMAIL_VALUE, row.text("Email")),
            ("Phone 1 - Label", "Phone".to_string()),
            (PHONE_VALUE, row.text("Phone")),
            (LABELS, row.text("Tag")),
        ] {
            if let Some(idx) = CONTACT_EXPORT_COLUMNS.iter().position(|c| *c == column) {
                values[idx] = CellValue::text(value);
            }
        }
        export.push_row(values);
    }

    tracing::info!(contacts = export.len(), "built contact export");
    Ok(export)
}

/// Reads a contact export back into sync records.
///
/// Rows without an email are skipped with a warning.
pub fn contacts_from_export(table: &Table) -> Result<Vec<ContactRecord>> {
    for required in [EMAIL_VALUE, LABELS] {
        if !table.has_column(required) {
            return Err(TransformError::missing("contact import", required));
        }
    }

    let mut records = Vec::with_capacity(table.len());
    let mut skipped = 0usize;
    for row in table.iter_rows() {
        let phone = Some(row.text(PHONE_VALUE));
        let record = match ContactRecord::new(
            row.text("First Name"),
            row.text("Last Name"),
            &row.text(EMAIL_VALUE),
            phone,
        ) {
            Ok(record) => record,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let labels = row.text(LABELS);
        let record = labels
            .split(LABEL_SEPARATOR)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .fold(record, |record, label| record.with_group(label));
        records.push(record);
    }
    if skipped > 0 {
        tracing::warn!(skipped, "skipped contact rows without an email");
    }
    Ok(records)
}
