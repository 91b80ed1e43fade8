//! The sync engine.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::{Duration, Instant};

use fundsync_common::redact_value;
use fundsync_model::{ContactRecord, normalize_email};
use tracing::{debug, info, info_span, warn};

use crate::directory::{ContactDirectory, RemoteContact, RemoteGroup};
use crate::error::{DirectoryError, SyncError};
use crate::retry::RetryPolicy;

/// Stop paging contacts after this many pages.
const MAX_CONTACT_PAGES: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub retry: RetryPolicy,
    /// Pause between records.
    pub request_delay: Duration,
    /// Remove memberships in `managed_groups` for contacts absent from the batch.
    pub reconcile_removals: bool,
    pub managed_groups: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_delay: Duration::from_millis(200),
            reconcile_removals: false,
            managed_groups: Vec::new(),
        }
    }
}

/// A record-level failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub email: String,
    pub operation: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records after merging duplicates by email.
    pub records: usize,
    pub duplicates_merged: usize,
    pub groups_created: usize,
    pub contacts_created: usize,
    pub memberships_added: usize,
    pub already_member: usize,
    pub memberships_removed: usize,
    /// Operations abandoned after exhausting rate-limit retries.
    pub skipped_rate_limited: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Membership add and remove calls that succeeded.
    pub fn membership_changes(&self) -> usize {
        self.memberships_added + self.memberships_removed
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped_rate_limited == 0
    }
}

/// Merges records sharing an email (case-insensitively), keeping first-seen order.
///
/// Returns the merged batch and how many records were folded away.
pub fn dedupe_by_email(records: impl IntoIterator<Item = ContactRecord>) -> (Vec<ContactRecord>, usize) {
    let mut merged: Vec<ContactRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut folded = 0;
    for mut record in records {
        record.email = normalize_email(&record.email);
        if record.email.is_empty() {
            continue;
        }
        match index.get(&record.email) {
            Some(&pos) => {
                merged[pos].merge(record);
                folded += 1;
            }
            None => {
                index.insert(record.email.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    (merged, folded)
}

/// Remote state cached for the length of one run.
#[derive(Default)]
struct RemoteState {
    /// Group name → resource name.
    groups: HashMap<String, String>,
    contacts: Vec<RemoteContact>,
    /// Lowercased email → index into `contacts`.
    by_email: HashMap<String, usize>,
}

impl RemoteState {
    fn remember_groups(&mut self, groups: Vec<RemoteGroup>) {
        for group in groups {
            self.groups.insert(group.name, group.resource_name);
        }
    }

    fn remember_contact(&mut self, contact: RemoteContact) -> usize {
        let idx = self.contacts.len();
        for key in contact.email_keys() {
            self.by_email.entry(key).or_insert(idx);
        }
        self.contacts.push(contact);
        idx
    }
}

/// Outcome of one membership add.
enum Step {
    Done,
    Skipped,
}

pub struct ContactSync<D> {
    directory: D,
    options: SyncOptions,
}

impl<D: ContactDirectory> ContactSync<D> {
    pub fn new(directory: D, options: SyncOptions) -> Self {
        Self { directory, options }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Syncs `records` into the directory.
    ///
    /// # Errors
    ///
    /// Only the initial group and contact listings abort the run; every later
    /// failure is recorded in the report.
    pub fn run(&self, records: impl IntoIterator<Item = ContactRecord>) -> Result<SyncReport, SyncError> {
        let span = info_span!("contact_sync");
        let _guard = span.enter();
        let started = Instant::now();

        let (batch, duplicates_merged) = dedupe_by_email(records);
        let mut report = SyncReport {
            records: batch.len(),
            duplicates_merged,
            ..SyncReport::default()
        };

        let mut state = RemoteState::default();
        state.remember_groups(self.directory.list_groups().map_err(|source| {
            SyncError::Prerequisite {
                operation: "list contact groups",
                source,
            }
        })?);
        self.load_contacts(&mut state)?;
        info!(
            records = batch.len(),
            duplicates_merged,
            remote_groups = state.groups.len(),
            remote_contacts = state.contacts.len(),
            "loaded remote directory"
        );

        let wanted: BTreeSet<&str> = batch
            .iter()
            .flat_map(|r| r.groups.iter().map(String::as_str))
            .collect();
        for name in wanted {
            if let Err(error) = self.ensure_group(&mut state, name, &mut report) {
                warn!(group = name, %error, "could not ensure contact group");
                report.failures.push(SyncFailure {
                    email: String::new(),
                    operation: "ensure group",
                    message: format!("{name}: {error}"),
                });
            }
        }

        for (position, record) in batch.iter().enumerate() {
            if position > 0 && !self.options.request_delay.is_zero() {
                std::thread::sleep(self.options.request_delay);
            }
            if let Err((operation, error)) = self.sync_record(&mut state, record, &mut report) {
                warn!(
                    email = redact_value(&record.email),
                    operation,
                    %error,
                    "contact sync failed for record"
                );
                report.failures.push(SyncFailure {
                    email: record.email.clone(),
                    operation,
                    message: error.to_string(),
                });
            }
        }

        if self.options.reconcile_removals {
            self.remove_stale_members(&state, &batch, &mut report);
        }

        info!(
            contacts_created = report.contacts_created,
            memberships_added = report.memberships_added,
            already_member = report.already_member,
            memberships_removed = report.memberships_removed,
            failures = report.failures.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "contact sync complete"
        );
        Ok(report)
    }

    fn load_contacts(&self, state: &mut RemoteState) -> Result<(), SyncError> {
        let mut token: Option<String> = None;
        for _ in 0..MAX_CONTACT_PAGES {
            let page = self
                .directory
                .list_contacts(token.as_deref())
                .map_err(|source| SyncError::Prerequisite {
                    operation: "list contacts",
                    source,
                })?;
            for contact in page.contacts {
                state.remember_contact(contact);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => token = Some(next),
                None => return Ok(()),
            }
        }
        warn!(pages = MAX_CONTACT_PAGES, "stopped paging contacts at the page limit");
        Ok(())
    }

    fn ensure_group(
        &self,
        state: &mut RemoteState,
        name: &str,
        report: &mut SyncReport,
    ) -> Result<(), DirectoryError> {
        if state.groups.contains_key(name) {
            return Ok(());
        }
        match self
            .options
            .retry
            .run("create group", || self.directory.create_group(name))
        {
            Ok(group) => {
                info!(group = name, resource = %group.resource_name, "created contact group");
                report.groups_created += 1;
                state.remember_groups(vec![group]);
                Ok(())
            }
            Err(error) if error.is_conflict() => {
                debug!(group = name, "group already exists, re-listing");
                state.remember_groups(self.directory.list_groups()?);
                if state.groups.contains_key(name) {
                    Ok(())
                } else {
                    Err(error)
                }
            }
            Err(error) => Err(error),
        }
    }

    fn sync_record(
        &self,
        state: &mut RemoteState,
        record: &ContactRecord,
        report: &mut SyncReport,
    ) -> Result<(), (&'static str, DirectoryError)> {
        let existing = state.by_email.get(&record.email).copied();
        let contact_idx = match existing {
            Some(idx) => idx,
            None => {
                let created = self
                    .options
                    .retry
                    .run("create contact", || self.directory.create_contact(record))
                    .map_err(|e| ("create contact", e))?;
                debug!(
                    email = redact_value(&record.email),
                    resource = %created.resource_name,
                    "created contact"
                );
                report.contacts_created += 1;
                let idx = state.remember_contact(created);
                // The new contact may not list its own email back.
                state.by_email.insert(record.email.clone(), idx);
                idx
            }
        };

        for group in &record.groups {
            let Some(group_resource) = state.groups.get(group).cloned() else {
                // Group creation already failed and was reported.
                continue;
            };
            if state.contacts[contact_idx].memberships.contains(&group_resource) {
                report.already_member += 1;
                continue;
            }
            let contact_resource = state.contacts[contact_idx].resource_name.clone();
            match self.add_member(&group_resource, &contact_resource)? {
                Step::Done => {
                    debug!(
                        email = redact_value(&record.email),
                        group = group.as_str(),
                        "added membership"
                    );
                    report.memberships_added += 1;
                    state.contacts[contact_idx].memberships.insert(group_resource);
                }
                Step::Skipped => report.skipped_rate_limited += 1,
            }
        }
        Ok(())
    }

    fn add_member(
        &self,
        group: &str,
        contact: &str,
    ) -> Result<Step, (&'static str, DirectoryError)> {
        let add = [contact.to_string()];
        match self
            .options
            .retry
            .run("add membership", || self.directory.modify_members(group, &add, &[]))
        {
            Ok(()) => Ok(Step::Done),
            Err(error) if error.is_rate_limited() => {
                warn!(group, "giving up on membership add after repeated rate limiting");
                Ok(Step::Skipped)
            }
            Err(error) => Err(("add membership", error)),
        }
    }

    fn remove_stale_members(&self, state: &RemoteState, batch: &[ContactRecord], report: &mut SyncReport) {
        let mut desired: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for record in batch {
            for group in &record.groups {
                desired
                    .entry(group.as_str())
                    .or_default()
                    .insert(record.email.as_str());
            }
        }

        for managed in &self.options.managed_groups {
            let Some(group_resource) = state.groups.get(managed) else {
                debug!(group = managed.as_str(), "managed group does not exist remotely");
                continue;
            };
            let keep = desired.get(managed.as_str());
            for contact in &state.contacts {
                if !contact.memberships.contains(group_resource) {
                    continue;
                }
                let wanted = contact
                    .email_keys()
                    .any(|email| keep.is_some_and(|emails| emails.contains(email.as_str())));
                if wanted {
                    continue;
                }
                let remove = [contact.resource_name.clone()];
                match self.options.retry.run("remove membership", || {
                    self.directory.modify_members(group_resource, &[], &remove)
                }) {
                    Ok(()) => {
                        info!(group = managed.as_str(), resource = %contact.resource_name, "removed stale membership");
                        report.memberships_removed += 1;
                    }
                    Err(error) if error.is_rate_limited() => report.skipped_rate_limited += 1,
                    Err(error) => report.failures.push(SyncFailure {
                        email: contact.emails.first().cloned().unwrap_or_default(),
                        operation: "remove membership",
                        message: error.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, group: &str) -> ContactRecord {
        ContactRecord::new("Jo", "Lee", email, None)
            .unwrap()
            .with_group(group)
    }

    #[test]
    fn dedupe_merges_case_insensitive_emails() {
        let (batch, folded) = dedupe_by_email(vec![
            record("JO@X.COM", "2025_Rider"),
            record("al@x.com", "2025_Rider"),
            record("jo@x.com", "2025_Volunteer"),
        ]);
        assert_eq!(folded, 1);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].email, "jo@x.com");
        assert_eq!(batch[0].groups.len(), 2);
        assert_eq!(batch[1].email, "al@x.com");
    }

    #[test]
    fn report_helpers() {
        let report = SyncReport {
            memberships_added: 2,
            memberships_removed: 1,
            ..SyncReport::default()
        };
        assert_eq!(report.membership_changes(), 3);
        assert!(report.is_clean());
    }
}
