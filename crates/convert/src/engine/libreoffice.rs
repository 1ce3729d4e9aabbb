use crate::engine::{Engine, probe_output};
use crate::error::{ErrorKind, Result};
use crate::format::Format;
use crate::text::preview;
use exn::ResultExt;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::instrument;
use wait_timeout::ChildExt;

/// Upper bound for a single conversion. The engine is killed afterwards.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const STDERR_PREVIEW_CHARS: usize = 500;
const ERROR_PREVIEW_CHARS: usize = 150;

/// LibreOffice (or `soffice`) running headless as a subprocess.
///
/// LibreOffice picks the import filter from the file itself; only the target
/// extension is passed on the command line.
#[derive(Clone, Debug)]
pub struct LibreOffice {
    path: PathBuf,
    /// Writable directory used as `HOME` for the engine's user profile.
    home: PathBuf,
    timeout: Duration,
}

struct Finished {
    status: ExitStatus,
    stderr: String,
}

impl LibreOffice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            home: std::env::temp_dir(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The service account usually has no (writable) home directory, and
    /// LibreOffice refuses to start without somewhere to put its profile.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, source: &Path, out_dir: &Path, target: Format) -> Command {
        let mut command = Command::new(&self.path);
        command
            .args(["--headless", "--invisible", "--convert-to", target.extension(), "--outdir"])
            .arg(out_dir)
            .arg(source)
            .env("HOME", &self.home)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }

    fn execute(&self, source: &Path, out_dir: &Path, target: Format) -> Result<Finished> {
        // Not a pipe: nothing drains it until the engine has exited.
        let mut stderr = tempfile::tempfile().or_raise(|| ErrorKind::Io)?;
        let mut child = self
            .command(source, out_dir, target)
            .stderr(Stdio::from(stderr.try_clone().or_raise(|| ErrorKind::Io)?))
            .spawn()
            .or_raise(|| ErrorKind::EngineFailed)?;
        let Some(status) = child.wait_timeout(self.timeout).or_raise(|| ErrorKind::EngineFailed)? else {
            // Reap it as well, otherwise we're left with a zombie.
            _ = child.kill();
            _ = child.wait();
            exn::bail!(ErrorKind::EngineTimeout(self.timeout));
        };
        let mut output = Vec::new();
        stderr.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        stderr.read_to_end(&mut output).or_raise(|| ErrorKind::Io)?;
        Ok(Finished { status, stderr: String::from_utf8_lossy(&output).into_owned() })
    }
}

impl Engine for LibreOffice {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }

    fn home(&self) -> Option<&Path> {
        Some(&self.home)
    }

    #[instrument(skip_all, fields(source = %source.display(), format = %target))]
    fn invoke(&self, source: &Path, out_dir: &Path, target: Format) -> Option<PathBuf> {
        let name = source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let finished = match self.execute(source, out_dir, target) {
            Ok(finished) => finished,
            Err(e) if matches!(&*e, ErrorKind::EngineTimeout(_)) => {
                tracing::error!(file = %name, timeout_secs = self.timeout.as_secs(), "Conversion timed out");
                return None;
            },
            Err(e) => {
                let error = preview(&format!("{e:?}"), ERROR_PREVIEW_CHARS);
                tracing::error!(file = %name, error = %error, "Conversion failed");
                return None;
            },
        };

        // The exit code can't be trusted either way: LibreOffice has been
        // seen exiting non-zero after writing the file, and zero without.
        let stem = source.file_stem()?.to_string_lossy();
        if let Some(produced) = probe_output(out_dir, &stem, target) {
            tracing::debug!(produced = %produced.display(), "Found converted file");
            return Some(produced);
        }
        let actual: Vec<String> = std::fs::read_dir(out_dir)
            .map(|entries| {
                entries
                    .filter_map(std::result::Result::ok)
                    .filter(|entry| entry.path().is_file())
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        tracing::debug!(dir = %out_dir.display(), files = ?actual, "Files in output directory");
        tracing::error!(
            file = %name,
            code = ?finished.status.code(),
            stderr = %preview(&finished.stderr, STDERR_PREVIEW_CHARS),
            "Converted file not found"
        );
        None
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;

    /// Stand-in for LibreOffice. Positional arguments are the same as for
    /// the real thing: `$4` is the extension, `$6` the output directory and
    /// `$7` the source file.
    fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("soffice");
        let script = format!("#!/bin/sh\nstem=$(basename \"$7\")\nstem=\"${{stem%.*}}\"\n{body}\n");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    struct Fixture {
        _temp_dir: tempfile::TempDir,
        source: PathBuf,
        out_dir: PathBuf,
        bin_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("input/report.doc");
        let out_dir = temp_dir.path().join("output");
        let bin_dir = temp_dir.path().join("bin");
        for dir in [source.parent().unwrap(), &out_dir, &bin_dir] {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&source, b"\xD0\xCF\x11\xE0legacy").unwrap();
        Fixture { _temp_dir: temp_dir, source, out_dir, bin_dir }
    }

    #[test]
    fn test_lowercase_output() {
        let f = fixture();
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, "printf '%s' \"$*\" > \"$6/$stem.$4\""));
        let produced = engine.invoke(&f.source, &f.out_dir, Format::Docx).unwrap();
        assert_eq!(produced, f.out_dir.join("report.docx"));
        let args = std::fs::read_to_string(&produced).unwrap();
        let expected = format!("--headless --invisible --convert-to docx --outdir {}", f.out_dir.display());
        assert!(args.starts_with(&expected), "unexpected arguments: {args}");
        assert!(args.ends_with("report.doc"));
    }

    #[test]
    fn test_uppercase_output() {
        let f = fixture();
        let body = "ext=$(echo \"$4\" | tr 'a-z' 'A-Z')\ntouch \"$6/$stem.$ext\"";
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, body));
        let produced = engine.invoke(&f.source, &f.out_dir, Format::Xlsx).unwrap();
        assert!(produced.is_file());
        assert!(produced.to_string_lossy().to_lowercase().ends_with("report.xlsx"));
    }

    #[test]
    fn test_non_zero_exit_with_output_is_success() {
        let f = fixture();
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, "touch \"$6/$stem.$4\"\nexit 81"));
        assert!(engine.invoke(&f.source, &f.out_dir, Format::Docx).is_some());
    }

    #[test]
    fn test_zero_exit_without_output_is_failure() {
        let f = fixture();
        let body = "touch \"$6/unrelated.$4\"\necho 'Error: source file could not be loaded' >&2\nexit 0";
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, body));
        assert_eq!(engine.invoke(&f.source, &f.out_dir, Format::Docx), None);
    }

    #[test]
    fn test_previous_output_is_picked_up() {
        let f = fixture();
        std::fs::write(f.out_dir.join("report.docx"), b"from an earlier run").unwrap();
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, "exit 1"));
        assert_eq!(engine.invoke(&f.source, &f.out_dir, Format::Docx), Some(f.out_dir.join("report.docx")));
    }

    #[test]
    fn test_timeout_kills_engine() {
        let f = fixture();
        let engine = LibreOffice::new(fake_engine(&f.bin_dir, "sleep 30\ntouch \"$6/$stem.$4\""))
            .with_timeout(Duration::from_millis(500));
        let started = Instant::now();
        assert_eq!(engine.invoke(&f.source, &f.out_dir, Format::Docx), None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_home_is_overridden() {
        let f = fixture();
        let home = f.out_dir.join("profile");
        let engine =
            LibreOffice::new(fake_engine(&f.bin_dir, "printf '%s' \"$HOME\" > \"$6/$stem.$4\"")).with_home(&home);
        assert_eq!(engine.home(), Some(home.as_path()));
        let produced = engine.invoke(&f.source, &f.out_dir, Format::Docx).unwrap();
        assert_eq!(std::fs::read_to_string(produced).unwrap(), home.display().to_string());
    }

    #[test]
    fn test_missing_engine() {
        let f = fixture();
        let engine = LibreOffice::new(f.bin_dir.join("does-not-exist"));
        assert!(!engine.is_available());
        assert_eq!(engine.invoke(&f.source, &f.out_dir, Format::Docx), None);
    }

    #[test]
    fn test_defaults() {
        let engine = LibreOffice::new("/usr/bin/libreoffice");
        assert_eq!(engine.timeout(), Duration::from_secs(120));
        assert_eq!(engine.path(), Path::new("/usr/bin/libreoffice"));
        assert_eq!(engine.describe(), "/usr/bin/libreoffice");
        assert_eq!(engine.home(), Some(std::env::temp_dir().as_path()));
    }
}
