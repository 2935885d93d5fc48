//! Error types for the sysfs adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for sysfs adapter operations.
pub type SysfsResult<T> = Result<T, SysfsError>;

/// Errors reading or writing kernel interface files.
#[derive(Debug, Error)]
pub enum SysfsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed value in {path}: {value:?}")]
    Parse { path: PathBuf, value: String },
}
