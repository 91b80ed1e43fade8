//! Report output error types.

use std::path::PathBuf;

use fundsync_ingest::IngestError;
use fundsync_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// File I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be renamed onto the target.
    #[error("failed to move {temp_path} into place at {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spreadsheet serialization failed.
    #[error("failed to build workbook {path}: {message}")]
    Xlsx { path: PathBuf, message: String },

    /// CSV serialization failed.
    #[error("failed to write CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("invalid sheet label: {0}")]
    InvalidSheet(#[from] ModelError),

    /// Two sheets share a label, ignoring case.
    #[error("duplicate sheet label '{label}'")]
    DuplicateSheet { label: String },

    /// `snapshots.json` could not be parsed or written.
    #[error("snapshot registry {path}: {message}")]
    Registry { path: PathBuf, message: String },

    /// A prior snapshot could not be read back.
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
