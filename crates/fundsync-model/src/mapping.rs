//! Correction entries loaded from mapping files.

use serde::{Deserialize, Serialize};

/// A single "known-incorrect → correct" patch.
///
/// - `key` absent: global substitution of `incorrect` wherever it appears.
/// - `incorrect` absent: the keyed row's target value is replaced whatever it is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingEntry {
    pub key: Option<String>,
    pub incorrect: Option<String>,
    pub correct: String,
}

impl MappingEntry {
    /// Keyed entry that only fires when the current value equals `incorrect`.
    pub fn keyed(
        key: impl Into<String>,
        incorrect: impl Into<String>,
        correct: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            incorrect: Some(incorrect.into()),
            correct: correct.into(),
        }
    }

    /// Keyed entry that replaces any current value.
    pub fn keyed_any(key: impl Into<String>, correct: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            incorrect: None,
            correct: correct.into(),
        }
    }

    /// Global exact-match substitution.
    pub fn global(incorrect: impl Into<String>, correct: impl Into<String>) -> Self {
        Self {
            key: None,
            incorrect: Some(incorrect.into()),
            correct: correct.into(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.key.is_none()
    }
}
