//! Timestamped dataset snapshots.
//!
//! Each logical dataset (e.g. one transaction cohort) is written as
//! `<dataset>_<unix seconds>.csv` and recorded in `snapshots.json` with a
//! monotonically increasing sequence number. The registry, not file
//! timestamps, decides which snapshot is the latest. A dataset with no
//! registry entry (snapshots written before the registry existed) falls back
//! to modification-time ordering of its files.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use fundsync_model::Table;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::atomic::write_atomic;
use crate::csv_out::table_to_csv_bytes;
use crate::error::{ReportError, Result};

/// Registry file name inside the snapshot directory.
pub const REGISTRY_FILE: &str = "snapshots.json";

const REGISTRY_VERSION: u32 = 1;

/// One persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub dataset: String,
    /// File name relative to the snapshot directory.
    pub file: String,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    /// SHA-256 of the written CSV bytes, hex encoded.
    pub sha256: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    version: u32,
    snapshots: Vec<SnapshotRecord>,
}

#[derive(Debug)]
pub struct SnapshotRegistry {
    dir: PathBuf,
    registry: RegistryFile,
}

/// Filename stem for a dataset: spaces become underscores.
fn dataset_stem(dataset: &str) -> String {
    dataset.trim().replace(' ', "_")
}

impl SnapshotRegistry {
    /// Opens the registry in `dir`, creating the directory when missing.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| ReportError::Io {
            operation: "create directory",
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir.join(REGISTRY_FILE);
        let registry = match std::fs::read(&path) {
            Ok(bytes) => {
                let registry: RegistryFile =
                    serde_json::from_slice(&bytes).map_err(|e| ReportError::Registry {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                registry
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryFile::default(),
            Err(e) => {
                return Err(ReportError::Io {
                    operation: "read",
                    path,
                    source: e,
                });
            }
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            registry,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn records(&self) -> &[SnapshotRecord] {
        &self.registry.snapshots
    }

    /// Path of the most recent snapshot of `dataset`, if any.
    pub fn latest(&self, dataset: &str) -> Result<Option<PathBuf>> {
        let registered = self
            .registry
            .snapshots
            .iter()
            .filter(|r| r.dataset == dataset)
            .filter(|r| self.dir.join(&r.file).is_file())
            .max_by_key(|r| r.sequence)
            .map(|r| self.dir.join(&r.file));
        match registered {
            Some(path) => Ok(Some(path)),
            None => self.latest_by_mtime(dataset),
        }
    }

    fn latest_by_mtime(&self, dataset: &str) -> Result<Option<PathBuf>> {
        let prefix = format!("{}_", dataset_stem(dataset));
        let entries = std::fs::read_dir(&self.dir).map_err(|e| ReportError::Io {
            operation: "read directory",
            path: self.dir.clone(),
            source: e,
        })?;
        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_snapshot = name.starts_with(&prefix)
                && name.ends_with(".csv")
                && name[prefix.len()..name.len() - 4]
                    .split('_')
                    .next()
                    .is_some_and(|ts| !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()));
            if !is_snapshot {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if best.as_ref().is_none_or(|(t, p)| (modified, &path) > (*t, p)) {
                best = Some((modified, path));
            }
        }
        if let Some((_, path)) = &best {
            tracing::debug!(dataset, path = %path.display(), "dataset not in registry; using newest file");
        }
        Ok(best.map(|(_, path)| path))
    }

    fn next_file_name(&self, dataset: &str, at: DateTime<Utc>) -> String {
        let base = format!("{}_{}", dataset_stem(dataset), at.timestamp());
        let taken = |name: &str| {
            self.dir.join(name).exists() || self.registry.snapshots.iter().any(|r| r.file == name)
        };
        let mut name = format!("{base}.csv");
        let mut n = 1;
        while taken(&name) {
            name = format!("{base}_{n}.csv");
            n += 1;
        }
        name
    }

    /// Writes `table` as a new snapshot of `dataset` and records it.
    pub fn record(&mut self, dataset: &str, table: &Table, at: DateTime<Utc>) -> Result<SnapshotRecord> {
        let file = self.next_file_name(dataset, at);
        let path = self.dir.join(&file);
        let bytes = table_to_csv_bytes(table).map_err(|e| ReportError::Csv {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, &bytes)?;

        let sequence = self
            .registry
            .snapshots
            .iter()
            .map(|r| r.sequence)
            .max()
            .unwrap_or(0)
            + 1;
        let record = SnapshotRecord {
            dataset: dataset.to_string(),
            file,
            sequence,
            created_at: at,
            row_count: table.len(),
            sha256: hex::encode(Sha256::digest(&bytes)),
        };
        self.registry.snapshots.push(record.clone());
        self.save()?;

        tracing::info!(
            dataset,
            file = %record.file,
            sequence,
            rows = record.row_count,
            "recorded snapshot"
        );
        Ok(record)
    }

    fn save(&mut self) -> Result<()> {
        let path = self.dir.join(REGISTRY_FILE);
        self.registry.version = REGISTRY_VERSION;
        let bytes = serde_json::to_vec_pretty(&self.registry).map_err(|e| ReportError::Registry {
            path: path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&path, &bytes)?;
        Ok(())
    }
}
