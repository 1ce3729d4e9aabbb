//! Path validation.
//!
//! Every path handed to a [`ManagedDir`](crate::ManagedDir) is relative to
//! its root and has to stay there.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Normalizes a relative path, refusing anything that would leave the root.
///
/// `.` components and repeated separators are dropped and `..` is applied
/// lexically. Null bytes and Windows prefixes are rejected, as is a path
/// that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use docshift_storage::validate_path;
/// assert!(validate_path("reports/2019/q1.xls").is_ok());
/// assert!(validate_path("reports/../q1.xls").is_ok()); // (never leaves the root)
/// assert!(validate_path("../../etc/passwd").is_err());
/// assert!(validate_path("reports/../../q1.xls").is_err());
/// assert_eq!(
///     validate_path("./reports//2019/../q1.xls").unwrap(),
///     Path::new("reports/q1.xls")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Accepts a bare file name only: exactly one normal component, no
/// separators, no `.` or `..`.
///
/// ```
/// use docshift_storage::validate_file_name;
/// assert!(validate_file_name("report.docx").is_ok());
/// assert!(validate_file_name("../../etc/passwd").is_err());
/// assert!(validate_file_name("nested/report.docx").is_err());
/// ```
pub fn validate_file_name(name: &str) -> Result<&OsStr> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if !s.as_encoded_bytes().contains(&0) && !name.contains(['/', '\\']) => {
            Ok(s)
        },
        _ => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}
