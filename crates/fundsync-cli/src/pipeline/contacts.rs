//! Contact export from roster sheets and sync of an existing export.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use fundsync_ingest::{MappingLayout, load_mapping_entries, load_tables, read_csv_table};
use fundsync_model::ContactRecord;
use fundsync_report::write_csv_table;
use fundsync_transform::{build_contact_export, contacts_from_export};
use tracing::{info, info_span, warn};

use super::remote::{AccountSync, sync_accounts};
use crate::config::AppConfig;

/// A contact export CSV written from roster sheets.
#[derive(Debug)]
pub struct ContactExport {
    pub path: PathBuf,
    /// Sheets that contributed rows.
    pub sheets: Vec<String>,
    pub rows: usize,
    pub records: Vec<ContactRecord>,
}

/// Builds the contact export from the sheets of `workbook` starting with
/// `contacts.sheet_prefix` and writes it to `contacts.export_file`.
pub fn export_contacts(config: &AppConfig, workbook: &Path) -> Result<ContactExport> {
    let settings = &config.contacts;
    let _span = info_span!("contact_export").entered();

    let sheets = load_tables(workbook, Some(&settings.sheet_prefix))
        .with_context(|| format!("failed to read rosters from {}", workbook.display()))?;
    if sheets.is_empty() {
        warn!(prefix = %settings.sheet_prefix, "no sheets match the roster prefix");
    }
    let substitutions = load_mapping_entries(
        &config.resolve(&settings.mapping_file),
        MappingLayout::Global,
        false,
    )?;

    let export = build_contact_export(
        sheets.iter().map(|sheet| (sheet.name.as_str(), &sheet.table)),
        &settings.export,
        &substitutions,
    )?;
    let path = config.resolve(&settings.export_file);
    write_csv_table(&path, &export)?;
    let records = contacts_from_export(&export)?;
    info!(path = %path.display(), rows = export.len(), "wrote contact export");

    Ok(ContactExport {
        path,
        sheets: sheets.into_iter().map(|sheet| sheet.name).collect(),
        rows: export.len(),
        records,
    })
}

#[derive(Debug)]
pub struct ContactsOutcome {
    pub export_file: PathBuf,
    pub records: usize,
    pub accounts: Vec<AccountSync>,
}

impl ContactsOutcome {
    pub fn is_success(&self) -> bool {
        self.accounts.iter().all(AccountSync::is_success)
    }
}

/// Syncs an existing contact export to every configured account.
pub fn run_contacts(config: &AppConfig) -> Result<ContactsOutcome> {
    let _span = info_span!("contacts").entered();
    let started = Instant::now();
    let export_file = config.resolve(&config.contacts.export_file);

    let table = read_csv_table(&export_file)
        .with_context(|| format!("contact export {}", export_file.display()))?;
    let records = contacts_from_export(&table)?;
    info!(records = records.len(), "loaded contact export");

    let accounts = sync_accounts(config, &records, &config.contacts.sync_options());
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "contact sync finished");
    Ok(ContactsOutcome {
        export_file,
        records: records.len(),
        accounts,
    })
}
