//! Error types for table transforms.

use fundsync_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// A column the transform cannot work without is absent.
    #[error("{stage}: required column '{column}' not found")]
    MissingColumn { stage: &'static str, column: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl TransformError {
    pub(crate) fn missing(stage: &'static str, column: &str) -> Self {
        Self::MissingColumn {
            stage,
            column: column.to_string(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::Model(ModelError::MissingColumn { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
