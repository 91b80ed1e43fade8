//! Google API adapters.
//!
//! - [`token`]: OAuth token files written by an earlier interactive consent,
//!   refreshed through the token endpoint when expired
//! - [`people`]: People API v1 as a [`fundsync_sync::ContactDirectory`]
//! - [`drive`]: Drive v3 multipart upload
//!
//! Interactive consent itself is not implemented; a missing token file is an
//! error telling the operator which file to provide.

pub mod drive;
mod error;
pub mod people;
pub mod token;

pub use drive::{DEFAULT_DRIVE_UPLOAD_URL, DriveClient, XLSX_MIME_TYPE};
pub use error::{GoogleError, Result, UploadError};
pub use people::{DEFAULT_PEOPLE_BASE_URL, PeopleClient};
pub use token::{GoogleToken, TokenSource};
