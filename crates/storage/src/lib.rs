//! Access to the directories managed by docshift.

mod dir;
pub mod error;
mod models;
mod path;

pub use crate::dir::{FileEntryStream, ManagedDir};
pub use crate::models::{Census, FileEntry};
pub use crate::path::{validate as validate_path, validate_file_name};
