//! Spreadsheet-safe sheet names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Maximum sheet name length accepted by spreadsheet applications.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters a sheet name may not contain.
pub const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '\\', '/'];

/// A validated sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SheetName(String);

impl SheetName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason| ModelError::InvalidSheetName {
            name: name.clone(),
            reason,
        };
        if name.trim().is_empty() {
            return Err(invalid("empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(invalid("longer than 31 characters"));
        }
        if name.contains(INVALID_SHEET_CHARS) {
            return Err(invalid("contains one of [ ] : * ? \\ /"));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(invalid("starts or ends with an apostrophe"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive key used for uniqueness checks within a workbook.
    pub fn fold_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SheetName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SheetName> for String {
    fn from(value: SheetName) -> Self {
        value.0
    }
}

impl AsRef<str> for SheetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Removes disallowed characters, trims, strips edge apostrophes and truncates
/// to [`MAX_SHEET_NAME_LEN`] characters. May return an empty string.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !INVALID_SHEET_CHARS.contains(ch))
        .collect();
    let trimmed = cleaned.trim().trim_matches('\'').trim();
    let truncated: String = trimmed.chars().take(MAX_SHEET_NAME_LEN).collect();
    truncated.trim_end().trim_end_matches('\'').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_names() {
        assert!(SheetName::new("").is_err());
        assert!(SheetName::new("a/b").is_err());
        assert!(SheetName::new("x".repeat(32)).is_err());
        assert!(SheetName::new("'quoted'").is_err());
        assert!(SheetName::new("x".repeat(31)).is_ok());
    }

    #[test]
    fn sanitize_strips_and_truncates() {
        assert_eq!(sanitize_sheet_name(" Rider [A]: 1/2 "), "Rider A 12");
        let long = "é".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), 31);
        assert_eq!(sanitize_sheet_name("[]:*?"), "");
    }
}
