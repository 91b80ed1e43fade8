//! Steps that talk to Google: report upload and per-account contact sync.
//!
//! Failures here are recorded in the outcome rather than returned, so one
//! bad account or a rejected upload does not discard local reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fundsync_google::{DriveClient, PeopleClient, TokenSource, XLSX_MIME_TYPE};
use fundsync_model::ContactRecord;
use fundsync_sync::{ContactSync, SyncOptions, SyncReport};
use tracing::{error, info, info_span, warn};

use crate::config::{AccountConfig, AppConfig};

#[derive(Debug)]
pub struct UploadResult {
    pub path: PathBuf,
    pub folder: String,
    /// Drive file id, or the failure message.
    pub outcome: std::result::Result<String, String>,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct AccountSync {
    pub account: String,
    pub outcome: std::result::Result<SyncReport, String>,
}

impl AccountSync {
    /// Ran to completion with no record failures or skipped calls.
    pub fn is_success(&self) -> bool {
        self.outcome.as_ref().is_ok_and(SyncReport::is_clean)
    }
}

fn try_upload(config: &AppConfig, folder: &str, path: &Path) -> Result<String> {
    let token_file = config.resolve(&config.google.drive_token_file);
    let auth = TokenSource::open(&token_file)
        .with_context(|| format!("Drive credentials {}", token_file.display()))?;
    let drive = DriveClient::new(&config.google.drive_upload_url, auth)?;
    Ok(drive.upload(path, folder, XLSX_MIME_TYPE)?)
}

/// Uploads `path` to `folder`. Never retried.
pub fn upload_report(config: &AppConfig, folder: &str, path: &Path) -> UploadResult {
    let _span = info_span!("upload", path = %path.display()).entered();
    let outcome = try_upload(config, folder, path).map_err(|e| {
        error!(error = %format!("{e:#}"), "upload failed");
        format!("{e:#}")
    });
    UploadResult {
        path: path.to_path_buf(),
        folder: folder.to_string(),
        outcome,
    }
}

fn sync_account(
    config: &AppConfig,
    account: &AccountConfig,
    records: &[ContactRecord],
    options: &SyncOptions,
) -> Result<SyncReport> {
    let token_file = config.resolve(&account.token_file);
    let auth = TokenSource::open(&token_file)
        .with_context(|| format!("contacts credentials {}", token_file.display()))?;
    let people = PeopleClient::new(&config.google.people_base_url, auth)?;
    let sync = ContactSync::new(people, options.clone());
    Ok(sync.run(records.iter().cloned())?)
}

/// Syncs the same records into every configured account, in order.
pub fn sync_accounts(
    config: &AppConfig,
    records: &[ContactRecord],
    options: &SyncOptions,
) -> Vec<AccountSync> {
    if config.contacts.accounts.is_empty() {
        warn!("no contact accounts configured, nothing to sync");
    }
    config
        .contacts
        .accounts
        .iter()
        .map(|account| {
            let _span = info_span!("account", name = %account.name).entered();
            let outcome = sync_account(config, account, records, options).map_err(|e| {
                error!(error = %format!("{e:#}"), "contact sync failed");
                format!("{e:#}")
            });
            if let Ok(report) = &outcome {
                info!(
                    created = report.contacts_created,
                    added = report.memberships_added,
                    failures = report.failures.len(),
                    "account synced"
                );
            }
            AccountSync {
                account: account.name.clone(),
                outcome,
            }
        })
        .collect()
}
