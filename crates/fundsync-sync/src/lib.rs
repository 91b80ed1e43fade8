//! Contact Sync.
//!
//! Reconciles a batch of [`fundsync_model::ContactRecord`]s against a remote
//! contact directory reached through the [`ContactDirectory`] trait:
//!
//! 1. bulk-fetch groups and contacts (failures here abort the run)
//! 2. make sure every referenced group exists
//! 3. create missing contacts and add missing memberships
//! 4. optionally remove memberships from explicitly managed groups
//!
//! Rate-limited calls are retried per [`RetryPolicy`]; any other failure is
//! confined to the record being processed and lands in the [`SyncReport`].

mod directory;
mod engine;
mod error;
mod retry;

pub use directory::{ContactDirectory, ContactsPage, RemoteContact, RemoteGroup};
pub use engine::{ContactSync, SyncFailure, SyncOptions, SyncReport, dedupe_by_email};
pub use error::{DirectoryError, SyncError};
pub use retry::RetryPolicy;
