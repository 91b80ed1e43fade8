//! Contact sync against an in-memory directory.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use fundsync_model::ContactRecord;
use fundsync_sync::{
    ContactDirectory, ContactSync, ContactsPage, DirectoryError, RemoteContact, RemoteGroup,
    RetryPolicy, SyncError, SyncOptions,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    ListGroups,
    CreateGroup(String),
    ListContacts(Option<String>),
    CreateContact(String),
    Modify {
        group: String,
        add: Vec<String>,
        remove: Vec<String>,
    },
}

#[derive(Default)]
struct State {
    groups: Vec<RemoteGroup>,
    contacts: Vec<RemoteContact>,
    calls: Vec<Call>,
    /// Errors returned, in order, by the next `modify_members` calls.
    modify_failures: VecDeque<DirectoryError>,
    /// Group names whose creation reports a conflict after creating them anyway.
    conflicting_groups: Vec<String>,
    fail_list_groups: bool,
}

#[derive(Default)]
struct FakeDirectory {
    state: RefCell<State>,
    page_size: usize,
}

impl FakeDirectory {
    fn new() -> Self {
        Self {
            page_size: 2,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn modify_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Modify { .. }))
            .count()
    }

    fn group_resource(&self, name: &str) -> String {
        self.state
            .borrow()
            .groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.resource_name.clone())
            .unwrap()
    }

    fn contact(&self, email: &str) -> Option<RemoteContact> {
        self.state
            .borrow()
            .contacts
            .iter()
            .find(|c| c.emails.iter().any(|e| e == email))
            .cloned()
    }

    fn add_group(&self, name: &str) -> String {
        let mut state = self.state.borrow_mut();
        let resource = format!("contactGroups/{}", state.groups.len() + 1);
        state.groups.push(RemoteGroup {
            resource_name: resource.clone(),
            name: name.to_string(),
        });
        resource
    }

    fn add_contact(&self, email: &str, memberships: &[&str]) -> String {
        let mut state = self.state.borrow_mut();
        let resource = format!("people/{}", state.contacts.len() + 1);
        state.contacts.push(RemoteContact {
            resource_name: resource.clone(),
            emails: vec![email.to_string()],
            memberships: memberships.iter().map(|m| m.to_string()).collect(),
        });
        resource
    }
}

impl ContactDirectory for FakeDirectory {
    fn list_groups(&self) -> Result<Vec<RemoteGroup>, DirectoryError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ListGroups);
        if state.fail_list_groups {
            return Err(DirectoryError::Upstream {
                status: 500,
                message: "unavailable".into(),
            });
        }
        Ok(state.groups.clone())
    }

    fn create_group(&self, name: &str) -> Result<RemoteGroup, DirectoryError> {
        self.state
            .borrow_mut()
            .calls
            .push(Call::CreateGroup(name.to_string()));
        let conflict = self.state.borrow().conflicting_groups.iter().any(|g| g == name);
        let resource = self.add_group(name);
        if conflict {
            return Err(DirectoryError::Conflict {
                message: format!("group {name} exists"),
            });
        }
        Ok(RemoteGroup {
            resource_name: resource,
            name: name.to_string(),
        })
    }

    fn list_contacts(&self, page_token: Option<&str>) -> Result<ContactsPage, DirectoryError> {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(Call::ListContacts(page_token.map(str::to_string)));
        let start: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let end = (start + self.page_size).min(state.contacts.len());
        Ok(ContactsPage {
            contacts: state.contacts[start..end].to_vec(),
            next_page_token: (end < state.contacts.len()).then(|| end.to_string()),
        })
    }

    fn create_contact(&self, contact: &ContactRecord) -> Result<RemoteContact, DirectoryError> {
        self.state
            .borrow_mut()
            .calls
            .push(Call::CreateContact(contact.email.clone()));
        let resource = self.add_contact(&contact.email, &[]);
        Ok(RemoteContact {
            resource_name: resource,
            emails: vec![contact.email.clone()],
            memberships: BTreeSet::new(),
        })
    }

    fn modify_members(
        &self,
        group: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Modify {
            group: group.to_string(),
            add: add.to_vec(),
            remove: remove.to_vec(),
        });
        if let Some(error) = state.modify_failures.pop_front() {
            return Err(error);
        }
        for contact in &mut state.contacts {
            if add.contains(&contact.resource_name) {
                contact.memberships.insert(group.to_string());
            }
            if remove.contains(&contact.resource_name) {
                contact.memberships.remove(group);
            }
        }
        Ok(())
    }
}

fn options() -> SyncOptions {
    SyncOptions {
        retry: RetryPolicy::immediate(3),
        request_delay: Duration::ZERO,
        ..SyncOptions::default()
    }
}

fn record(first: &str, email: &str, group: &str) -> ContactRecord {
    ContactRecord::new(first, "Lee", email, Some("555-0100".into()))
        .unwrap()
        .with_group(group)
}

#[test]
fn creates_groups_contacts_and_memberships() {
    let directory = FakeDirectory::new();
    let sync = ContactSync::new(&directory, options());

    let report = sync
        .run(vec![
            record("Jo", "JO@X.COM", "2025_Rider"),
            record("Al", "al@x.com", "2025_Volunteer"),
        ])
        .unwrap();

    assert_eq!(report.groups_created, 2);
    assert_eq!(report.contacts_created, 2);
    assert_eq!(report.memberships_added, 2);
    assert!(report.is_clean());

    let jo = directory.contact("jo@x.com").expect("email is lowercased");
    assert!(jo.memberships.contains(&directory.group_resource("2025_Rider")));
    assert!(directory.contact("JO@X.COM").is_none());
}

#[test]
fn second_run_makes_no_membership_calls() {
    let directory = FakeDirectory::new();
    let sync = ContactSync::new(&directory, options());
    let batch = vec![
        record("Jo", "jo@x.com", "2025_Rider"),
        record("Al", "al@x.com", "2025_Rider"),
        record("Bo", "bo@x.com", "2025_Volunteer"),
    ];

    sync.run(batch.clone()).unwrap();
    directory.clear_calls();
    let second = sync.run(batch).unwrap();

    assert_eq!(directory.modify_calls(), 0);
    assert_eq!(second.contacts_created, 0);
    assert_eq!(second.groups_created, 0);
    assert_eq!(second.already_member, 3);
    // Three contacts at two per page.
    let pages = directory
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::ListContacts(_)))
        .count();
    assert_eq!(pages, 2);
}

#[test]
fn existing_contact_only_gets_missing_membership() {
    let directory = FakeDirectory::new();
    let rider = directory.add_group("2025_Rider");
    directory.add_contact("jo@x.com", &[rider.as_str()]);
    let sync = ContactSync::new(&directory, options());

    let report = sync
        .run(vec![
            record("Jo", "jo@x.com", "2025_Rider"),
            record("Jo", "Jo@X.com", "2025_Volunteer"),
        ])
        .unwrap();

    assert_eq!(report.duplicates_merged, 1);
    assert_eq!(report.contacts_created, 0);
    assert_eq!(report.already_member, 1);
    assert_eq!(report.memberships_added, 1);
}

#[test]
fn group_conflict_reuses_existing_group() {
    let directory = FakeDirectory::new();
    directory
        .state
        .borrow_mut()
        .conflicting_groups
        .push("2025_Rider".into());
    let sync = ContactSync::new(&directory, options());

    let report = sync.run(vec![record("Jo", "jo@x.com", "2025_Rider")]).unwrap();

    assert_eq!(report.groups_created, 0);
    assert_eq!(report.memberships_added, 1);
    let list_calls = directory
        .calls()
        .iter()
        .filter(|c| **c == Call::ListGroups)
        .count();
    assert_eq!(list_calls, 2);
}

#[test]
fn rate_limited_membership_is_retried_then_skipped() {
    let directory = FakeDirectory::new();
    {
        let mut state = directory.state.borrow_mut();
        for _ in 0..4 {
            state
                .modify_failures
                .push_back(DirectoryError::RateLimited { retry_after: None });
        }
    }
    let sync = ContactSync::new(&directory, options());

    let report = sync
        .run(vec![
            record("Jo", "jo@x.com", "2025_Rider"),
            record("Al", "al@x.com", "2025_Rider"),
        ])
        .unwrap();

    // Jo: three rate-limited attempts then skipped. Al: one more limit, then success.
    assert_eq!(report.skipped_rate_limited, 1);
    assert_eq!(report.memberships_added, 1);
    assert_eq!(directory.modify_calls(), 5);
    assert!(report.failures.is_empty());
}

#[test]
fn upstream_error_aborts_only_that_record() {
    let directory = FakeDirectory::new();
    directory
        .state
        .borrow_mut()
        .modify_failures
        .push_back(DirectoryError::Upstream {
            status: 400,
            message: "bad request".into(),
        });
    let sync = ContactSync::new(&directory, options());

    let report = sync
        .run(vec![
            record("Jo", "jo@x.com", "2025_Rider"),
            record("Al", "al@x.com", "2025_Rider"),
        ])
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].email, "jo@x.com");
    assert_eq!(report.failures[0].operation, "add membership");
    assert_eq!(report.memberships_added, 1);
}

#[test]
fn failed_group_listing_aborts_the_run() {
    let directory = FakeDirectory::new();
    directory.state.borrow_mut().fail_list_groups = true;
    let sync = ContactSync::new(&directory, options());

    let err = sync
        .run(vec![record("Jo", "jo@x.com", "2025_Rider")])
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Prerequisite {
            operation: "list contact groups",
            ..
        }
    ));
    assert_eq!(directory.calls(), vec![Call::ListGroups]);
}

#[test]
fn removals_touch_only_managed_groups() {
    let directory = FakeDirectory::new();
    let rider = directory.add_group("2025_Rider");
    let staff = directory.add_group("Staff");
    directory.add_contact("jo@x.com", &[rider.as_str()]);
    let gone = directory.add_contact("gone@x.com", &[rider.as_str(), staff.as_str()]);

    let sync = ContactSync::new(
        &directory,
        SyncOptions {
            reconcile_removals: true,
            managed_groups: vec!["2025_Rider".into()],
            ..options()
        },
    );
    let report = sync.run(vec![record("Jo", "jo@x.com", "2025_Rider")]).unwrap();

    assert_eq!(report.memberships_removed, 1);
    let remaining = directory.contact("gone@x.com").unwrap();
    assert!(!remaining.memberships.contains(&rider));
    assert!(remaining.memberships.contains(&staff));
    assert!(directory.calls().contains(&Call::Modify {
        group: rider,
        add: vec![],
        remove: vec![gone],
    }));
}

#[test]
fn removals_are_off_by_default() {
    let directory = FakeDirectory::new();
    let rider = directory.add_group("2025_Rider");
    directory.add_contact("gone@x.com", &[rider.as_str()]);
    let sync = ContactSync::new(
        &directory,
        SyncOptions {
            managed_groups: vec!["2025_Rider".into()],
            ..options()
        },
    );

    let report = sync.run(vec![record("Jo", "jo@x.com", "2025_Rider")]).unwrap();

    assert_eq!(report.memberships_removed, 0);
    assert!(
        directory
            .contact("gone@x.com")
            .unwrap()
            .memberships
            .contains(&rider)
    );
}
