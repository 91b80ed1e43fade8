//! Deriving sheet-safe group labels from raw category values.

use fundsync_model::{MAX_SHEET_NAME_LEN, sanitize_sheet_name};
use serde::{Deserialize, Serialize};

/// Label used when a raw value cleans down to nothing.
pub const UNSPECIFIED_LABEL: &str = "Unspecified";

/// Drop everything up to and including a separator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrefixStrip {
    pub separator: String,
    /// Split at the last occurrence instead of the first.
    #[serde(default)]
    pub from_end: bool,
}

/// Turns raw category values into sheet names.
///
/// Steps: optional prefix strip, separator collapses, invalid character
/// removal, trim and truncation to 31 characters, then the fallback label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetLabeler {
    pub strip_prefix: Option<PrefixStrip>,
    /// `(from, to)` replacements applied before invalid characters are removed.
    pub collapse: Vec<(String, String)>,
    pub fallback: String,
}

impl Default for SheetLabeler {
    fn default() -> Self {
        Self {
            strip_prefix: None,
            collapse: Vec::new(),
            fallback: UNSPECIFIED_LABEL.to_string(),
        }
    }
}

impl SheetLabeler {
    /// Ticket-type labels: `2025 Ride - MV New / Returning` → `MV New Returning`.
    pub fn ticket_types() -> Self {
        Self {
            strip_prefix: Some(PrefixStrip {
                separator: " - ".to_string(),
                from_end: false,
            }),
            collapse: vec![(" / ".to_string(), " ".to_string())],
            ..Self::default()
        }
    }

    /// Ticket-title labels: text after the last `-`, `/` becomes `_`.
    pub fn ticket_titles() -> Self {
        Self {
            strip_prefix: Some(PrefixStrip {
                separator: "-".to_string(),
                from_end: true,
            }),
            collapse: vec![("/".to_string(), "_".to_string())],
            ..Self::default()
        }
    }

    pub fn label(&self, raw: &str) -> String {
        let mut value = raw.trim();
        if let Some(strip) = &self.strip_prefix
            && !strip.separator.is_empty()
        {
            let split = if strip.from_end {
                value.rsplit_once(strip.separator.as_str())
            } else {
                value.split_once(strip.separator.as_str())
            };
            if let Some((_, rest)) = split {
                value = rest;
            }
        }

        let mut collapsed = value.to_string();
        for (from, to) in &self.collapse {
            if !from.is_empty() {
                collapsed = collapsed.replace(from.as_str(), to);
            }
        }

        let cleaned = sanitize_sheet_name(&collapsed);
        if cleaned.is_empty() {
            sanitize_sheet_name(&self.fallback)
        } else {
            cleaned
        }
    }
}

/// Appends `~n` to `base`, shortening `base` so the result stays within 31 characters.
pub(crate) fn with_suffix(base: &str, n: usize) -> String {
    let suffix = format!("~{n}");
    let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
    let head: String = base.chars().take(room).collect();
    format!("{}{suffix}", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_type_labels() {
        let labeler = SheetLabeler::ticket_types();
        assert_eq!(labeler.label("2025 - Volunteer"), "Volunteer");
        assert_eq!(labeler.label("2025 - Rider"), "Rider");
        assert_eq!(
            labeler.label("2025 Ride for Missing Children - MV New / Returning Riders"),
            "MV New Returning Riders"
        );
        assert_eq!(labeler.label("T-Shirt: XL?"), "T-Shirt XL");
    }

    #[test]
    fn ticket_title_labels() {
        let labeler = SheetLabeler::ticket_titles();
        assert_eq!(
            labeler.label("2025 Ride for Missing Children - MV Volunteer"),
            "MV Volunteer"
        );
        assert_eq!(labeler.label("2025 Gala - Table/Seat"), "Table_Seat");
    }

    #[test]
    fn fallback_and_truncation() {
        let labeler = SheetLabeler::default();
        assert_eq!(labeler.label("  :: "), UNSPECIFIED_LABEL);
        assert_eq!(labeler.label(&"x".repeat(50)).chars().count(), 31);
    }

    #[test]
    fn suffix_stays_within_limit() {
        let label = with_suffix(&"y".repeat(31), 2);
        assert_eq!(label.chars().count(), 31);
        assert!(label.ends_with("~2"));
    }
}
