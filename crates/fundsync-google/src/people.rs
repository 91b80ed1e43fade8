//! People API v1 contact directory.

use std::collections::BTreeSet;
use std::time::Duration;

use fundsync_model::ContactRecord;
use fundsync_sync::{ContactDirectory, ContactsPage, DirectoryError, RemoteContact, RemoteGroup};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{GoogleError, Result};
use crate::token::TokenSource;

pub const DEFAULT_PEOPLE_BASE_URL: &str = "https://people.googleapis.com/v1/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONTACTS_PAGE_SIZE: &str = "200";
const GROUPS_PAGE_SIZE: &str = "1000";
const PERSON_FIELDS: &str = "names,emailAddresses,memberships";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactGroup {
    resource_name: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupList {
    #[serde(default)]
    contact_groups: Vec<ContactGroup>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupMembership {
    contact_group_resource_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Membership {
    contact_group_membership: Option<GroupMembership>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    resource_name: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    memberships: Vec<Membership>,
}

impl From<Person> for RemoteContact {
    fn from(person: Person) -> Self {
        RemoteContact {
            resource_name: person.resource_name,
            emails: person
                .email_addresses
                .into_iter()
                .map(|e| e.value)
                .filter(|e| !e.trim().is_empty())
                .collect(),
            memberships: person
                .memberships
                .into_iter()
                .filter_map(|m| m.contact_group_membership?.contact_group_resource_name)
                .collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionList {
    #[serde(default)]
    connections: Vec<Person>,
    next_page_token: Option<String>,
}

/// Maps a non-success People API response onto the directory error taxonomy.
///
/// 429 and quota-flavoured 403s are rate limiting; 409 is a conflict.
fn classify_failure(status: u16, retry_after: Option<&str>, body: String) -> DirectoryError {
    let rate_limited = status == 429
        || (status == 403
            && (body.contains("RATE_LIMIT_EXCEEDED")
                || body.contains("rateLimitExceeded")
                || body.contains("RESOURCE_EXHAUSTED")));
    if rate_limited {
        return DirectoryError::RateLimited {
            retry_after: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        };
    }
    if status == 409 {
        return DirectoryError::Conflict { message: body };
    }
    DirectoryError::Upstream {
        status,
        message: body,
    }
}

fn create_contact_body(contact: &ContactRecord) -> Value {
    let mut body = json!({
        "names": [{
            "givenName": contact.given_name,
            "familyName": contact.family_name,
        }],
        "emailAddresses": [{ "value": contact.email }],
    });
    if let Some(phone) = &contact.phone {
        body["phoneNumbers"] = json!([{ "value": phone }]);
    }
    body
}

/// One account's contacts, reached through the People API.
pub struct PeopleClient {
    client: Client,
    base_url: Url,
    auth: TokenSource,
}

/// Parses the API root, adding the trailing `/` that relative joins need to
/// keep the last segment (`.../v1` would otherwise lose `v1`).
fn api_base(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| GoogleError::InvalidUrl(e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl PeopleClient {
    pub fn new(base_url: &str, auth: TokenSource) -> Result<Self> {
        let base_url = api_base(base_url)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GoogleError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> std::result::Result<Url, DirectoryError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| DirectoryError::Transport(format!("invalid URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, DirectoryError> {
        let token = self
            .auth
            .access_token()
            .map_err(|e| DirectoryError::Transport(format!("authorization failed: {e}")))?;
        let response = request
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_failure(status.as_u16(), retry_after.as_deref(), body));
        }
        let body = response
            .text()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        // members:modify answers with an empty object or an empty body.
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| DirectoryError::Decode(e.to_string()))
    }
}

impl ContactDirectory for PeopleClient {
    fn list_groups(&self) -> std::result::Result<Vec<RemoteGroup>, DirectoryError> {
        let mut groups = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = {
                let mut query = vec![("pageSize", GROUPS_PAGE_SIZE)];
                if let Some(token) = page_token.as_deref() {
                    query.push(("pageToken", token));
                }
                self.url("contactGroups", &query)?
            };
            let page: GroupList = self.send(self.client.get(url))?;
            groups.extend(page.contact_groups.into_iter().map(|g| RemoteGroup {
                resource_name: g.resource_name,
                name: g.name,
            }));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        debug!(groups = groups.len(), "listed contact groups");
        Ok(groups)
    }

    fn create_group(&self, name: &str) -> std::result::Result<RemoteGroup, DirectoryError> {
        let url = self.url("contactGroups", &[])?;
        let body = json!({ "contactGroup": { "name": name } });
        let group: ContactGroup = self.send(self.client.post(url).json(&body))?;
        Ok(RemoteGroup {
            resource_name: group.resource_name,
            name: if group.name.is_empty() {
                name.to_string()
            } else {
                group.name
            },
        })
    }

    fn list_contacts(&self, page_token: Option<&str>) -> std::result::Result<ContactsPage, DirectoryError> {
        let mut query = vec![("personFields", PERSON_FIELDS), ("pageSize", CONTACTS_PAGE_SIZE)];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let url = self.url("people/me/connections", &query)?;
        let page: ConnectionList = self.send(self.client.get(url))?;
        Ok(ContactsPage {
            contacts: page.connections.into_iter().map(RemoteContact::from).collect(),
            next_page_token: page.next_page_token,
        })
    }

    fn create_contact(&self, contact: &ContactRecord) -> std::result::Result<RemoteContact, DirectoryError> {
        // A leading `./` keeps `people:` from parsing as a URL scheme.
        let url = self.url("./people:createContact", &[])?;
        let person: Person = self.send(self.client.post(url).json(&create_contact_body(contact)))?;
        Ok(person.into())
    }

    fn modify_members(
        &self,
        group: &str,
        add: &[String],
        remove: &[String],
    ) -> std::result::Result<(), DirectoryError> {
        let url = self.url(&format!("{group}/members:modify"), &[])?;
        let mut body = json!({});
        if !add.is_empty() {
            body["resourceNamesToAdd"] = json!(add);
        }
        if !remove.is_empty() {
            body["resourceNamesToRemove"] = json!(remove);
        }
        let _: Value = self.send(self.client.post(url).json(&body))?;
        Ok(())
    }
}
