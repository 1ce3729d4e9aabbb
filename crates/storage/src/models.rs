//! Storage models returned by [`ManagedDir`](crate::ManagedDir).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const HUMAN_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Metadata of a single file inside a managed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name only (last path component)
    pub name: String,
    /// Path relative to the managed directory's root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: OffsetDateTime,
}
impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        let path = path.into();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        Self { name, path, size, modified }
    }

    /// Seconds (with fractional part) since the Unix epoch.
    pub fn modified_timestamp(&self) -> f64 {
        self.modified.unix_timestamp() as f64 + f64::from(self.modified.nanosecond()) / 1_000_000_000.0
    }

    /// `YYYY-MM-DD HH:MM:SS`, in UTC.
    pub fn modified_human(&self) -> Option<String> {
        self.modified.to_offset(time::UtcOffset::UTC).format(HUMAN_FORMAT).ok()
    }

    /// Lower-cased extension including its leading dot, or an empty string
    /// when the file has none.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Basic statistics of everything stored in a managed directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    pub total: u64,
    pub extensions: BTreeSet<String>,
}
impl Census {
    pub(crate) fn record(&mut self, entry: &FileEntry) {
        self.total = self.total.saturating_add(1);
        self.extensions.insert(entry.extension());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    #[test]
    fn test_new_takes_name_from_path() {
        let entry = FileEntry::new("reports/2019/q1.xls", 42, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(entry.name, "q1.xls");
        assert_eq!(entry.path, Path::new("reports/2019/q1.xls"));
    }

    #[test]
    fn test_modified_formats() {
        let entry = FileEntry::new("a.doc", 0, datetime!(2024-03-05 07:08:09.5 UTC));
        assert_eq!(entry.modified_human().as_deref(), Some("2024-03-05 07:08:09"));
        assert_eq!(entry.modified_timestamp(), 1_709_622_489.5);
    }

    #[rstest]
    #[case("a.DOC", ".doc")]
    #[case("dir/b.Xlsx", ".xlsx")]
    #[case("archive.tar.gz", ".gz")]
    #[case("Makefile", "")]
    #[case(".hidden", "")]
    fn test_extension(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(FileEntry::new(path, 0, OffsetDateTime::UNIX_EPOCH).extension(), expected);
    }

    #[test]
    fn test_census_record() {
        let mut census = Census::default();
        for path in ["a.doc", "b.DOC", "c.xlsx", "README"] {
            census.record(&FileEntry::new(path, 1, OffsetDateTime::UNIX_EPOCH));
        }
        assert_eq!(census.total, 4);
        assert_eq!(census.extensions.into_iter().collect::<Vec<_>>(), vec!["", ".doc", ".xlsx"]);
    }
}
