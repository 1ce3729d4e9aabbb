use crate::format::{Format, Legacy, Rule, classify};
use derive_more::Display;
use docshift_storage::validate_path;
use std::path::{Path, PathBuf};

/// A supported document discovered underneath the input root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTask {
    /// Absolute path of the document.
    pub source: PathBuf,
    /// Path of the document relative to the input root.
    pub relative: PathBuf,
    pub rule: Rule,
}

impl FileTask {
    /// Returns `None` if the file's extension is unsupported, or if `source`
    /// isn't actually underneath `root`.
    pub fn new(root: &Path, source: impl Into<PathBuf>) -> Option<Self> {
        let source = source.into();
        let rule = classify(source.extension()?.to_str()?)?;
        let relative = validate_path(source.strip_prefix(root).ok()?).ok()?;
        Some(Self { source, relative, rule })
    }

    /// Where the processed document goes, relative to the output root: the
    /// same relative path, with the extension swapped for the target
    /// format's.
    pub fn relative_destination(&self) -> PathBuf {
        self.relative.with_extension(self.rule.target.extension())
    }

    pub fn destination(&self, output_root: &Path) -> PathBuf {
        output_root.join(self.relative_destination())
    }
}

/// What happened to a single [`FileTask`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Outcome {
    /// Already in a modern format; copied byte for byte.
    #[display("copied")]
    Copied,
    #[display("converted_{_0}")]
    Converted(Legacy),
    /// Nothing usable was produced for a document of this format.
    #[display("failed_{_0}")]
    Failed(Format),
}
impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/in/a.doc", "a.doc", "a.docx")]
    #[case("/in/reports/2019/Q1.XLS", "reports/2019/Q1.XLS", "reports/2019/Q1.xlsx")]
    #[case("/in/b.xlsx", "b.xlsx", "b.xlsx")]
    #[case("/in/c.DocX", "c.DocX", "c.docx")]
    #[case("/in/archive.2019.doc", "archive.2019.doc", "archive.2019.docx")]
    fn test_task_paths(#[case] source: &str, #[case] relative: &str, #[case] destination: &str) {
        let task = FileTask::new(Path::new("/in"), source).unwrap();
        assert_eq!(task.relative, Path::new(relative));
        assert_eq!(task.destination(Path::new("/out")), Path::new("/out").join(destination));
    }

    #[rstest]
    #[case("/in/c.tmp")]
    #[case("/in/Makefile")]
    #[case("/in/doc")]
    #[case("/elsewhere/a.doc")]
    fn test_task_rejected(#[case] source: &str) {
        assert_eq!(FileTask::new(Path::new("/in"), source), None);
    }

    #[rstest]
    #[case(Outcome::Copied, "copied", true)]
    #[case(Outcome::Converted(Legacy::Doc), "converted_doc", true)]
    #[case(Outcome::Converted(Legacy::Xls), "converted_xls", true)]
    #[case(Outcome::Failed(Format::Doc), "failed_doc", false)]
    #[case(Outcome::Failed(Format::Xlsx), "failed_xlsx", false)]
    fn test_outcome(#[case] outcome: Outcome, #[case] display: &str, #[case] success: bool) {
        assert_eq!(outcome.to_string(), display);
        assert_eq!(outcome.is_success(), success);
    }
}
