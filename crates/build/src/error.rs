use std::path::PathBuf;

use thiserror::Error;

use skillpack_manifest::validate::ValidationError;

/// Build-time failure taxonomy. Every variant is a deterministic function of
/// the build input, so nothing here is ever retried automatically.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A selection rule failed to compile; reported before any file I/O.
    #[error("invalid selection pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Aggregated manifest violations, the full list rather than the first.
    #[error("manifest validation failed with {count} error(s)", count = .0.len())]
    Validation(Vec<ValidationError>),

    /// A template referenced a context variable that does not exist.
    #[error("template references undefined variable '{name}'")]
    MissingVariable { name: String },

    /// The artifact already exists and overwrite was not requested.
    #[error("artifact already exists (pass --force to overwrite): {}", .path.display())]
    BuildAborted { path: PathBuf },

    /// Scaffold target contains files and force was not requested.
    #[error("target directory is not empty (pass --force to scaffold anyway): {}", .path.display())]
    DirectoryNotEmpty { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
