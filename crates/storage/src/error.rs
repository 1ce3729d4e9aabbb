//! Storage Error Types
//!
//! Errors raised while listing, inspecting or deleting files inside a managed
//! directory. Paths carried by the variants are relative to the directory's
//! root wherever the caller supplied them.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Nothing by that name inside the managed directory
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Path exists but is a directory (or something else that isn't a file)
    #[display("not a file: {}", _0.display())]
    NotAFile(#[error(not(source))] PathBuf),
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// More than a bare file name, or resolves to outside of the root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns `true` if the error was caused by the path the caller asked
    /// for, rather than by the filesystem.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NotAFile(_) | Self::InvalidPath(_))
    }
}
