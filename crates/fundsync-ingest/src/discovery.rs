//! Locating platform exports dropped into a working directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{IngestError, Result};

/// Lists files in `dir` whose name starts with `prefix` and, when given,
/// ends with `extension` (case-insensitive).
///
/// Returns files sorted by filename.
pub fn list_files_with_prefix(
    dir: &Path,
    prefix: &str,
    extension: Option<&str>,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix));
        let ext_matches = extension.is_none_or(|wanted| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
        });

        if name_matches && ext_matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Finds the most recently modified file in `dir` starting with `prefix`.
///
/// Ties on modification time resolve to the lexically greatest name.
pub fn find_latest_with_prefix(dir: &Path, prefix: &str, extension: Option<&str>) -> Result<PathBuf> {
    let files = list_files_with_prefix(dir, prefix, extension)?;

    let latest = files
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.file_name().cmp(&b.1.file_name())));

    match latest {
        Some((_, path)) => {
            tracing::debug!(path = %path.display(), prefix, "selected latest export");
            Ok(path)
        }
        None => Err(IngestError::NoMatchingFile {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "header\ndata").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn test_latest_by_mtime() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tickets-2025-01.csv", 300);
        let newest = touch(dir.path(), "tickets-2024-12.csv", 10);
        touch(dir.path(), "transactions.csv", 0);

        let found = find_latest_with_prefix(dir.path(), "tickets-", Some("csv")).unwrap();
        assert_eq!(found, newest);
    }

    #[test]
    fn test_no_matching_file() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "transactions.csv", 0);

        let result = find_latest_with_prefix(dir.path(), "tickets-", None);
        assert!(matches!(result, Err(IngestError::NoMatchingFile { .. })));
    }

    #[test]
    fn test_extension_filter() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tickets-a.csv", 0);
        touch(dir.path(), "tickets-b.xlsx", 0);

        let files = list_files_with_prefix(dir.path(), "tickets-", Some("CSV")).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "x.csv", 0);
        assert!(list_files_with_prefix(&file, "x", None).is_err());
    }
}
