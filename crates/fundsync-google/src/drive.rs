//! Drive v3 report upload.

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::{GoogleError, UploadError};
use crate::token::TokenSource;

pub const DEFAULT_DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const BOUNDARY: &str = "fundsync_upload_boundary_7f3a9c";

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// `multipart/related` body: JSON metadata part, then the file content.
fn multipart_body(file_name: &str, folder_id: &str, mime_type: &str, content: &[u8]) -> Vec<u8> {
    let metadata = json!({ "name": file_name, "parents": [folder_id] });
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub struct DriveClient {
    client: Client,
    upload_url: Url,
    auth: TokenSource,
}

impl DriveClient {
    pub fn new(upload_url: &str, auth: TokenSource) -> Result<Self, GoogleError> {
        let mut upload_url =
            Url::parse(upload_url).map_err(|e| GoogleError::InvalidUrl(e.to_string()))?;
        upload_url
            .query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", "id");
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| GoogleError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            upload_url,
            auth,
        })
    }

    /// Uploads `path` into `folder_id` and returns the new file id.
    pub fn upload(&self, path: &Path, folder_id: &str, mime_type: &str) -> Result<String, UploadError> {
        let content = fs::read(path).map_err(|source| UploadError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let token = self.auth.access_token()?;

        let response = self
            .client
            .post(self.upload_url.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(multipart_body(&file_name, folder_id, mime_type, &content))
            .send()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let created: CreatedFile = response
            .json()
            .map_err(|e| UploadError::Decode(e.to_string()))?;
        info!(file = %file_name, folder = folder_id, id = %created.id, "uploaded report to Drive");
        Ok(created.id)
    }
}
