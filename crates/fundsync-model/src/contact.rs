use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Lowercases and trims an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A desired contact in the remote directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub given_name: String,
    pub family_name: String,
    /// Always lowercased; the identity key within a sync batch.
    pub email: String,
    pub phone: Option<String>,
    pub groups: BTreeSet<String>,
}

impl ContactRecord {
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        email: &str,
        phone: Option<String>,
    ) -> Result<Self> {
        let given_name = given_name.into().trim().to_string();
        let family_name = family_name.into().trim().to_string();
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ModelError::MissingEmail {
                name: format!("{given_name} {family_name}").trim().to_string(),
            });
        }
        Ok(Self {
            given_name,
            family_name,
            email,
            phone: phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            groups: BTreeSet::new(),
        })
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        let group = group.into();
        if !group.trim().is_empty() {
            self.groups.insert(group);
        }
        self
    }

    /// Folds another record with the same email into this one.
    ///
    /// Groups are unioned; blank names and phone are filled from `other`.
    pub fn merge(&mut self, other: ContactRecord) {
        if self.given_name.is_empty() {
            self.given_name = other.given_name;
        }
        if self.family_name.is_empty() {
            self.family_name = other.family_name;
        }
        if self.phone.is_none() {
            self.phone = other.phone;
        }
        self.groups.extend(other.groups);
    }
}
