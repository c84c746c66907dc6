//! Migration errors

use crate::content_repository::ContentRepositoryError;

/// Errors raised while loading or running a node migration
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Unresolvable configuration: unknown or legacy names, missing or invalid settings
    #[error("Migration error: {0}")]
    Migration(String),

    /// A configuration that is well formed but unsafe or ambiguous to run
    #[error("Invalid migration configuration: {0}")]
    InvalidMigrationConfiguration(String),

    /// A transformation could not be applied to the element it was given
    #[error("Transformation failed: {0}")]
    TransformationFailed(String),

    #[error(transparent)]
    ContentRepository(#[from] ContentRepositoryError),

    #[error("Failed to parse migration {file}: {message}")]
    Parse { file: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    pub(crate) fn missing_setting(component: &str, setting: &str) -> Self {
        Self::Migration(format!("{component} requires the setting \"{setting}\""))
    }

    pub(crate) fn invalid_setting(component: &str, setting: &str, reason: impl std::fmt::Display) -> Self {
        Self::Migration(format!("{component} has an invalid setting \"{setting}\": {reason}"))
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;
