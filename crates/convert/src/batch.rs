use crate::dispatch::dispatch;
use crate::engine::EngineHandle;
use crate::error::{ErrorKind, Result};
use crate::summary::{Summary, Tally};
use crate::format::Legacy;
use crate::task::FileTask;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;
use walkdir::WalkDir;

/// How many failed files are listed individually in the final report.
const REPORTED_FAILURES: usize = 10;

/// Converts every supported document underneath the input root into the
/// output root, one file at a time.
///
/// Files are processed strictly sequentially: concurrent headless
/// LibreOffice instances fight over the same profile lock.
pub struct Converter {
    input: PathBuf,
    output: PathBuf,
    engine: EngineHandle,
    skip_empty: bool,
}

impl Converter {
    /// Validates the setup before anything is processed.
    ///
    /// # Errors
    /// - [`ErrorKind::EngineNotFound`] if the engine isn't available,
    /// - [`ErrorKind::InputNotFound`] if the input root doesn't exist,
    /// - [`ErrorKind::OutputUnavailable`] if the output root can't be created.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>, engine: EngineHandle) -> Result<Self> {
        let (input, output) = (input.as_ref(), output.as_ref());
        if !engine.is_available() {
            exn::bail!(ErrorKind::EngineNotFound(engine.describe()));
        }
        if !input.is_dir() {
            exn::bail!(ErrorKind::InputNotFound(input.to_path_buf()));
        }
        let input = input.canonicalize().or_raise(|| ErrorKind::InputNotFound(input.to_path_buf()))?;
        std::fs::create_dir_all(output).or_raise(|| ErrorKind::OutputUnavailable(output.to_path_buf()))?;
        let output = output.canonicalize().or_raise(|| ErrorKind::OutputUnavailable(output.to_path_buf()))?;

        tracing::info!(path = %input.display(), "Input directory");
        tracing::info!(path = %output.display(), "Output directory");
        tracing::info!(engine = %engine.describe(), "Conversion engine");
        if let Some(home) = engine.home() {
            tracing::info!(home = %home.display(), "Engine home directory");
        }
        Ok(Self { input, output, engine, skip_empty: false })
    }

    /// Return an empty summary instead of failing when there is nothing to
    /// convert.
    pub fn skip_empty(mut self, skip_empty: bool) -> Self {
        self.skip_empty = skip_empty;
        self
    }

    /// Every supported document underneath the input root, sorted by path.
    pub fn discover(&self) -> Result<Vec<FileTask>> {
        let mut tasks = Vec::new();
        for entry in WalkDir::new(&self.input) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e).or_raise(|| ErrorKind::Io),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    continue;
                },
            };
            // Follows symlinks, unlike `entry.file_type()`.
            if !entry.path().is_file() {
                continue;
            }
            match FileTask::new(&self.input, entry.path()) {
                Some(task) => tasks.push(task),
                None => tracing::debug!(path = %entry.path().display(), "Skipping unsupported file"),
            }
        }
        tasks.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(tasks)
    }

    /// Runs the whole batch.
    ///
    /// # Errors
    /// Only fails when discovery fails, or when there is nothing to convert
    /// and empty batches aren't tolerated. Individual files never fail the
    /// batch; they are counted in the returned [`Summary`] instead.
    #[instrument(skip_all, fields(input = %self.input.display()))]
    pub fn process(&self) -> Result<Summary> {
        tracing::info!("Searching for files");
        let tasks = self.discover()?;
        if tasks.is_empty() {
            if self.skip_empty {
                tracing::warn!("No files to process (.doc, .docx, .xls, .xlsx); skipping (SKIP_EMPTY=true)");
                return Ok(Summary::default());
            }
            tracing::error!("No files to process (.doc, .docx, .xls, .xlsx); stopping (set SKIP_EMPTY=true to skip)");
            exn::bail!(ErrorKind::NothingToConvert);
        }

        let total = tasks.len();
        tracing::info!(total, "Found files");
        let mut tally = Tally::new(total as u64);
        for (index, task) in tasks.iter().enumerate() {
            let destination = task.destination(&self.output);
            tracing::info!(
                "[{}/{}] {} → {}",
                index + 1,
                total,
                task.relative.display(),
                task.relative_destination().display()
            );
            let outcome = dispatch(self.engine.as_ref(), task, &destination);
            if outcome.is_success() {
                tracing::info!("✓ {outcome}");
            } else {
                tracing::warn!("✗ {outcome}");
            }
            tally.record(task.relative.display().to_string(), outcome);
        }
        let summary = tally.finish();
        report(&summary);
        Ok(summary)
    }
}

fn report(summary: &Summary) {
    tracing::info!(
        total = summary.total(),
        copied = summary.copied(),
        converted_doc = summary.converted(Legacy::Doc),
        converted_xls = summary.converted(Legacy::Xls),
        failed = summary.failed(),
        "Batch complete"
    );
    let failed = summary.failed_files();
    if !failed.is_empty() {
        tracing::warn!("Files with errors:");
        for path in failed.iter().take(REPORTED_FAILURES) {
            tracing::warn!(" - {path}");
        }
        if failed.len() > REPORTED_FAILURES {
            tracing::warn!("   ... and {} more", failed.len() - REPORTED_FAILURES);
        }
    }
    if summary.is_clean() {
        tracing::info!("All files processed successfully");
    } else {
        tracing::warn!("Completed with errors: {} of {} files", summary.failed(), summary.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use std::fs;
    use std::sync::Arc;

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("raw");
        let output = temp_dir.path().join("prepared");
        fs::create_dir_all(&input).unwrap();
        for name in files {
            let path = input.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, name.as_bytes()).unwrap();
        }
        Fixture { _temp_dir: temp_dir, input, output }
    }

    fn converter(f: &Fixture, engine: MockEngine) -> (Converter, Arc<MockEngine>) {
        let engine = Arc::new(engine);
        let converter = Converter::new(&f.input, &f.output, engine.clone()).unwrap();
        (converter, engine)
    }

    fn assert_balanced(summary: &Summary) {
        assert_eq!(
            summary.copied() + summary.converted(Legacy::Doc) + summary.converted(Legacy::Xls) + summary.failed(),
            summary.total()
        );
    }

    #[test]
    fn test_new_validates_setup() {
        let f = fixture(&[]);
        let err = Converter::new(&f.input, &f.output, Arc::new(MockEngine::new().unavailable())).err().unwrap();
        assert_eq!(*err, ErrorKind::EngineNotFound("mock".to_string()));

        let missing = f.input.join("missing");
        let err = Converter::new(&missing, &f.output, Arc::new(MockEngine::new())).err().unwrap();
        assert_eq!(*err, ErrorKind::InputNotFound(missing));

        assert!(!f.output.exists());
        Converter::new(&f.input, &f.output, Arc::new(MockEngine::new())).unwrap();
        assert!(f.output.is_dir());
    }

    #[test]
    fn test_mixed_batch() {
        let f = fixture(&["a.doc", "b.xlsx", "c.tmp"]);
        let (converter, engine) = converter(&f, MockEngine::new());
        let summary = converter.process().unwrap();
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({
                "total": 2,
                "copied": 1,
                "converted_doc": 1,
                "converted_xls": 0,
                "failed": 0,
                "failed_files": [],
            })
        );
        assert!(f.output.join("a.docx").is_file());
        assert_eq!(fs::read(f.output.join("b.xlsx")).unwrap(), b"b.xlsx");
        assert!(!f.output.join("c.tmp").exists());
        assert_eq!(engine.invocations().len(), 1);
    }

    #[test]
    fn test_failures_are_recorded_in_order() {
        let f = fixture(&["z/broken.xls", "a/broken.doc", "a/fine.doc", "m.XLS"]);
        let (converter, _engine) = converter(&f, MockEngine::new().failing("broken"));
        let summary = converter.process().unwrap();
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.converted(Legacy::Doc), 1);
        assert_eq!(summary.converted(Legacy::Xls), 1);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.failed_files(), ["a/broken.doc", "z/broken.xls"]);
        assert_balanced(&summary);
        assert!(f.output.join("m.xlsx").is_file());
    }

    #[test]
    fn test_discover_is_sorted_and_filtered() {
        let f = fixture(&["b/x.doc", "a.xlsx", "b.docx", "notes.txt", "a/z.XLS", "a/y.docx"]);
        let (converter, _engine) = converter(&f, MockEngine::new());
        let relative: Vec<_> = converter.discover().unwrap().into_iter().map(|t| t.relative).collect();
        assert_eq!(
            relative,
            ["a/y.docx", "a/z.XLS", "a.xlsx", "b/x.doc", "b.docx"].map(PathBuf::from).to_vec()
        );
    }

    #[test]
    fn test_engine_invoked_in_path_order() {
        let f = fixture(&["c.doc", "a.doc", "b.xls"]);
        let (converter, engine) = converter(&f, MockEngine::new());
        converter.process().unwrap();
        let names: Vec<_> = engine.invocations().iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, ["a.doc", "b.xls", "c.doc"].map(std::ffi::OsString::from).to_vec());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let f = fixture(&["readme.txt"]);
        let (converter, _engine) = converter(&f, MockEngine::new());
        let err = converter.process().unwrap_err();
        assert_eq!(*err, ErrorKind::NothingToConvert);
    }

    #[test]
    fn test_empty_input_tolerated() {
        let f = fixture(&["readme.txt"]);
        let (converter, _engine) = converter(&f, MockEngine::new());
        let summary = converter.skip_empty(true).process().unwrap();
        assert_eq!(summary, Summary::default());
        assert_balanced(&summary);
    }

    #[test]
    fn test_rerun_overwrites() {
        let f = fixture(&["a.doc", "b.docx"]);
        let (converter, _engine) = converter(&f, MockEngine::new());
        let first = converter.process().unwrap();
        let second = converter.process().unwrap();
        assert_eq!(first, second);
        assert!(second.is_clean());
    }
}
