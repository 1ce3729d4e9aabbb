//! Configuration Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, same as every other crate in the workspace.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source (file or environment) could not be parsed into
    /// a [`Config`](crate::Config). Fix the offending value and restart.
    #[display("invalid configuration")]
    Load,
    /// The configuration file given explicitly does not exist.
    #[display("configuration file not found: {_0}")]
    FileNotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Load.to_string(), "invalid configuration");
        assert_eq!(
            ErrorKind::FileNotFound("docshift.toml".to_string()).to_string(),
            "configuration file not found: docshift.toml"
        );
        assert!(!ErrorKind::Load.is_retryable());
    }
}
