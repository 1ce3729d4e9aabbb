//! Conversion Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only configuration problems surface as errors. Anything that goes wrong
//! with a single file is recorded in the batch [`Summary`](crate::Summary)
//! instead.

use derive_more::{Display, Error};
use std::path::PathBuf;
use std::time::Duration;

/// A conversion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The conversion engine isn't installed where we expected it.
    #[display("LibreOffice not found: {_0}")]
    EngineNotFound(#[error(not(source))] String),
    /// The engine did not finish within its time limit and was killed.
    #[display("conversion timed out after {}s", _0.as_secs())]
    EngineTimeout(#[error(not(source))] Duration),
    /// The engine process could not be started or communicated with.
    #[display("unable to run LibreOffice")]
    EngineFailed,
    /// The input directory does not exist.
    #[display("input directory does not exist: {}", _0.display())]
    InputNotFound(#[error(not(source))] PathBuf),
    /// The output directory does not exist and could not be created.
    #[display("output directory is unavailable: {}", _0.display())]
    OutputUnavailable(#[error(not(source))] PathBuf),
    /// The input directory contains no supported documents.
    #[display("no files to process (.doc, .docx, .xls, .xlsx)")]
    NothingToConvert,
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineTimeout(_) | Self::Io)
    }

    /// Returns `true` for problems with how docshift has been set up, as
    /// opposed to problems encountered while running.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::EngineNotFound(_) | Self::InputNotFound(_) | Self::OutputUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::EngineNotFound("/usr/bin/libreoffice".to_string()).to_string(),
            "LibreOffice not found: /usr/bin/libreoffice"
        );
        assert_eq!(
            ErrorKind::EngineTimeout(Duration::from_secs(120)).to_string(),
            "conversion timed out after 120s"
        );
        assert_eq!(
            ErrorKind::NothingToConvert.to_string(),
            "no files to process (.doc, .docx, .xls, .xlsx)"
        );
    }

    #[test]
    fn error_kind_classification() {
        assert!(ErrorKind::EngineNotFound(String::new()).is_configuration());
        assert!(ErrorKind::InputNotFound(PathBuf::new()).is_configuration());
        assert!(!ErrorKind::NothingToConvert.is_configuration());
        assert!(ErrorKind::EngineTimeout(Duration::ZERO).is_retryable());
        assert!(!ErrorKind::NothingToConvert.is_retryable());
    }
}
