//! OAuth token files and refresh.
//!
//! Token files use the JSON layout written by Google's Python auth library
//! (`token`, `refresh_token`, `token_uri`, `client_id`, ...), so files from
//! an earlier consent flow can be reused as they are.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GoogleError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Refresh when the token expires within this many seconds.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339 expiry; absent means unknown and is treated as expired.
    #[serde(default)]
    pub expiry: Option<String>,
}

/// Creates `path`, writes `bytes` and flushes them to disk.
fn write_synced(path: &Path, bytes: &[u8]) -> std::result::Result<(), (&'static str, io::Error)> {
    let mut file = File::create(path).map_err(|e| ("create", e))?;
    file.write_all(bytes).map_err(|e| ("write", e))?;
    file.sync_all().map_err(|e| ("sync", e))
}

impl GoogleToken {
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GoogleError::TokenNotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(GoogleError::Io {
                    operation: "read",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|e| GoogleError::InvalidToken {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes the token next to `path` and renames it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |operation: &'static str, source: std::io::Error| GoogleError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| GoogleError::InvalidToken {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "token.json".to_string());
        let temp = path.with_file_name(format!(".{file_name}.tmp"));
        let result = write_synced(&temp, json.as_bytes())
            .map_err(|(operation, e)| io_err(operation, e))
            .and_then(|()| fs::rename(&temp, path).map_err(|e| io_err("replace", e)));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self
            .expiry
            .as_deref()
            .and_then(|e| DateTime::parse_from_rfc3339(e).ok())
        {
            Some(expiry) => expiry <= now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }

    /// Form body for the refresh-token grant.
    fn refresh_form(&self, refresh_token: &str) -> String {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("client_id", &self.client_id)
            .append_pair("refresh_token", refresh_token)
            .append_pair("grant_type", "refresh_token");
        if let Some(secret) = self.client_secret.as_deref() {
            form.append_pair("client_secret", secret);
        }
        form.finish()
    }

    /// Applies a successful token endpoint response.
    fn apply_refresh(&mut self, body: &serde_json::Value, now: DateTime<Utc>) -> Result<()> {
        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| GoogleError::RefreshFailed("no access_token in response".into()))?;
        let expires_in = body["expires_in"].as_i64().unwrap_or(3600);
        self.token = access_token.to_string();
        self.expiry = Some((now + chrono::Duration::seconds(expires_in)).to_rfc3339());
        Ok(())
    }
}

fn map_refresh_error(status: u16, body: &str) -> GoogleError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleError::AuthExpired;
    }
    GoogleError::RefreshFailed(format!("HTTP {status}: {body}"))
}

/// A token file plus the in-memory token, refreshed on demand.
pub struct TokenSource {
    path: PathBuf,
    token: RefCell<GoogleToken>,
    client: Client,
}

impl TokenSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let token = GoogleToken::load(&path)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GoogleError::Transport(e.to_string()))?;
        Ok(Self {
            path,
            token: RefCell::new(token),
            client,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A usable access token, refreshing and persisting it when expired.
    pub fn access_token(&self) -> Result<String> {
        if !self.token.borrow().is_expired(Utc::now()) {
            return Ok(self.token.borrow().token.clone());
        }
        self.refresh()
    }

    fn refresh(&self) -> Result<String> {
        let current = self.token.borrow().clone();
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(GoogleError::AuthExpired)?;
        debug!(path = %self.path.display(), "refreshing access token");

        let response = self
            .client
            .post(&current.token_uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(current.refresh_form(refresh_token))
            .send()
            .map_err(|e| GoogleError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(map_refresh_error(status.as_u16(), &body));
        }
        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| GoogleError::RefreshFailed(e.to_string()))?;

        let mut refreshed = current;
        refreshed.apply_refresh(&json, Utc::now())?;
        refreshed.save(&self.path)?;
        info!(path = %self.path.display(), "refreshed access token");
        let access = refreshed.token.clone();
        *self.token.borrow_mut() = refreshed;
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn token(expiry: Option<&str>) -> GoogleToken {
        GoogleToken {
            token: "ya29.access".into(),
            refresh_token: Some("1//refresh".into()),
            token_uri: default_token_uri(),
            client_id: "client.apps.googleusercontent.com".into(),
            client_secret: Some("s3cret".into()),
            scopes: vec!["https://www.googleapis.com/auth/contacts".into()],
            expiry: expiry.map(String::from),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn loads_python_layout_and_access_token_alias() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts_token.json");
        fs::write(
            &path,
            r#"{"access_token":"abc","refresh_token":"r","client_id":"c","expiry":"2025-03-01T13:00:00Z"}"#,
        )
        .unwrap();

        let token = GoogleToken::load(&path).unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.token_uri, "https://oauth2.googleapis.com/token");
        assert!(!token.is_expired(now()));
    }

    #[test]
    fn missing_file_is_token_not_found() {
        let dir = TempDir::new().unwrap();
        let err = GoogleToken::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn expiry_margin_and_unknown_expiry() {
        assert!(token(None).is_expired(now()));
        assert!(token(Some("2025-03-01T12:00:30Z")).is_expired(now()));
        assert!(!token(Some("2025-03-01T12:05:00Z")).is_expired(now()));
        assert!(token(Some("not a date")).is_expired(now()));
    }

    #[test]
    fn refresh_form_and_response() {
        let mut t = token(None);
        let form = t.refresh_form("1//refresh");
        assert!(form.contains("grant_type=refresh_token"));
        assert!(form.contains("refresh_token=1%2F%2Frefresh"));
        assert!(form.contains("client_secret=s3cret"));

        t.apply_refresh(
            &serde_json::json!({"access_token": "new", "expires_in": 3599}),
            now(),
        )
        .unwrap();
        assert_eq!(t.token, "new");
        assert!(!t.is_expired(now()));
    }

    #[test]
    fn invalid_grant_means_reauthorize() {
        assert!(matches!(
            map_refresh_error(400, r#"{"error":"invalid_grant"}"#),
            GoogleError::AuthExpired
        ));
        assert!(matches!(
            map_refresh_error(500, "oops"),
            GoogleError::RefreshFailed(_)
        ));
    }

    #[test]
    fn save_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drive_token.json");
        let original = token(Some("2025-03-01T13:00:00+00:00"));
        original.save(&path).unwrap();
        assert_eq!(GoogleToken::load(&path).unwrap(), original);
        assert!(!dir.path().join(".drive_token.json.tmp").exists());
    }

    #[test]
    fn save_replaces_an_existing_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts_token_account1.json");
        token(Some("2025-03-01T13:00:00+00:00")).save(&path).unwrap();

        let refreshed = token(Some("2025-03-01T14:00:00+00:00"));
        refreshed.save(&path).unwrap();

        assert_eq!(GoogleToken::load(&path).unwrap(), refreshed);
        assert!(!dir.path().join(".contacts_token_account1.json.tmp").exists());
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // A directory at the target makes the rename fail.
        let path = dir.path().join("drive_token.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        let err = token(None).save(&path).unwrap_err();

        assert!(matches!(err, GoogleError::Io { operation: "replace", .. }));
        assert!(!dir.path().join(".drive_token.json.tmp").exists());
    }
}
