use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A required column is absent from the table header.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    /// A column name appears twice in one header.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// Sheet names must be 1-31 characters without `[ ] : * ? \ /`.
    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// Contact records are keyed by email, so an empty one is unusable.
    #[error("contact '{name}' has no email address")]
    MissingEmail { name: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
