//! Install failures that abort an installation

use std::path::PathBuf;
use thiserror::Error;

/// Fatal install errors.
///
/// Everything else that can go wrong during an install (unreadable
/// subtrees while scanning, single failed copies) is logged and the install
/// carries on with partial results.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Install source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Unknown file type for mod: '{0}'")]
    UnsupportedSourceType(String),

    #[error("Unable to extract {}: {reason}", .archive.display())]
    ExtractionFailure { archive: PathBuf, reason: String },

    #[error("{0}")]
    MissingPrerequisite(String),
}
