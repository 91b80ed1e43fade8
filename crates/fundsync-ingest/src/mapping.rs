//! Loading correction mapping files.

use std::path::Path;

use csv::ReaderBuilder;
use fundsync_model::MappingEntry;
use serde::Deserialize;

use crate::error::{IngestError, Result};

/// Column layout of a mapping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingLayout {
    /// `incorrect, correct`: exact-match substitution anywhere in the target columns.
    Global,
    /// `identifier, correct`: the keyed row's value is replaced whatever it is.
    Keyed,
    /// `identifier, incorrect, correct`: replaced only when the current value matches.
    KeyedGuarded,
}

impl MappingLayout {
    fn width(self) -> usize {
        match self {
            Self::Global | Self::Keyed => 2,
            Self::KeyedGuarded => 3,
        }
    }

    fn entry(self, fields: &[&str]) -> MappingEntry {
        match self {
            Self::Global => MappingEntry::global(fields[0], fields[1]),
            Self::Keyed => MappingEntry::keyed_any(fields[0], fields[1]),
            Self::KeyedGuarded => MappingEntry::keyed(fields[0], fields[1], fields[2]),
        }
    }
}

/// Reads mapping entries from a delimited file.
///
/// A missing or empty file yields no entries, which turns the reconciler into
/// a no-op. Rows with too few fields or a blank first field are skipped.
pub fn load_mapping_entries(
    path: &Path,
    layout: MappingLayout,
    has_header: bool,
) -> Result<Vec<MappingEntry>> {
    let is_empty = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            return Err(IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if is_empty {
        tracing::info!(path = %path.display(), "mapping file missing or empty; skipping corrections");
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_path(path)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let fields: Vec<&str> = record
            .iter()
            .map(|f| f.trim().trim_start_matches('\u{feff}'))
            .collect();
        if fields.len() < layout.width() || fields[0].is_empty() {
            skipped += 1;
            continue;
        }
        entries.push(layout.entry(&fields));
    }

    tracing::debug!(
        path = %path.display(),
        entries = entries.len(),
        skipped,
        "loaded mapping entries"
    );
    Ok(entries)
}
