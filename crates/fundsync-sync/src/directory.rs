//! The remote contact directory seam.

use std::collections::BTreeSet;

use fundsync_model::{ContactRecord, normalize_email};

use crate::error::DirectoryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGroup {
    pub resource_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContact {
    pub resource_name: String,
    pub emails: Vec<String>,
    /// Resource names of the groups this contact belongs to.
    pub memberships: BTreeSet<String>,
}

impl RemoteContact {
    /// Lowercased, trimmed, non-empty email addresses.
    pub fn email_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.emails
            .iter()
            .map(|e| normalize_email(e))
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactsPage {
    pub contacts: Vec<RemoteContact>,
    pub next_page_token: Option<String>,
}

/// Request/response operations the sync engine needs from a directory.
///
/// Implementations report rate limiting as [`DirectoryError::RateLimited`]
/// and never retry on their own; retrying is the engine's job.
pub trait ContactDirectory {
    fn list_groups(&self) -> Result<Vec<RemoteGroup>, DirectoryError>;

    fn create_group(&self, name: &str) -> Result<RemoteGroup, DirectoryError>;

    /// One page of contacts; `None` requests the first page.
    fn list_contacts(&self, page_token: Option<&str>) -> Result<ContactsPage, DirectoryError>;

    fn create_contact(&self, contact: &ContactRecord) -> Result<RemoteContact, DirectoryError>;

    fn modify_members(
        &self,
        group: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), DirectoryError>;
}

impl<D: ContactDirectory + ?Sized> ContactDirectory for &D {
    fn list_groups(&self) -> Result<Vec<RemoteGroup>, DirectoryError> {
        (**self).list_groups()
    }

    fn create_group(&self, name: &str) -> Result<RemoteGroup, DirectoryError> {
        (**self).create_group(name)
    }

    fn list_contacts(&self, page_token: Option<&str>) -> Result<ContactsPage, DirectoryError> {
        (**self).list_contacts(page_token)
    }

    fn create_contact(&self, contact: &ContactRecord) -> Result<RemoteContact, DirectoryError> {
        (**self).create_contact(contact)
    }

    fn modify_members(
        &self,
        group: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), DirectoryError> {
        (**self).modify_members(group, add, remove)
    }
}
