//! Working directory and engine executable resolution.
//!
//! Explicit overrides always win. Without one, data directories fall back to
//! a default that depends on whether the process runs inside a container,
//! and the engine falls back to the first well-known install location that
//! exists on this machine.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

/// Presence of this file means we are running inside a Docker container.
pub const CONTAINER_MARKER: &str = "/.dockerenv";
/// Used when no LibreOffice installation could be found. Existence is NOT
/// verified; callers must check before invoking it.
pub const FALLBACK_ENGINE: &str = "/usr/bin/libreoffice";

/// Absolute install locations checked before falling back to `PATH`.
const ENGINE_INSTALLS: [&str; 3] = [
    "/usr/bin/libreoffice",
    "/usr/bin/soffice",
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
];
/// Executable names searched for on `PATH`.
const ENGINE_EXECUTABLES: [&str; 2] = ["libreoffice", "soffice"];

/// The kind of environment the process has been started in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Runtime {
    Container,
    Host,
}
impl Runtime {
    pub fn detect() -> Self {
        Self::detect_with_marker(CONTAINER_MARKER)
    }

    pub fn detect_with_marker(marker: impl AsRef<Path>) -> Self {
        match marker.as_ref().exists() {
            true => Self::Container,
            false => Self::Host,
        }
    }
}

/// Default locations for one of the two managed data directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataDir {
    pub container: &'static str,
    pub local: &'static str,
}

/// Inbox: legacy documents waiting to be converted.
pub const RAW_DATA_DIR: DataDir = DataDir { container: "/app/raw_data", local: "./raw_data" };
/// Outbox: converted (or copied) modern documents.
pub const PREPARED_DATA_DIR: DataDir = DataDir {
    container: "/app/prepared_data",
    local: "./prepared_data",
};

impl DataDir {
    /// Returns the absolute path of this data directory, creating it (and
    /// any parents) if it does not exist yet.
    ///
    /// Failing to create the directory is logged but not fatal; whoever uses
    /// the path has to validate it before relying on it.
    pub fn resolve(&self, overridden: Option<&Path>, runtime: Runtime) -> PathBuf {
        let chosen = self.choose(overridden, runtime);
        let absolute = std::path::absolute(&chosen).unwrap_or(chosen);
        match create_dir_all(&absolute) {
            Ok(()) => tracing::info!(path = %absolute.display(), "Data directory ready"),
            Err(e) => tracing::error!(path = %absolute.display(), error = %e, "Unable to create data directory"),
        }
        // Canonicalize only succeeds once the directory exists; keep the
        // absolute (but unresolved) path otherwise.
        absolute.canonicalize().unwrap_or(absolute)
    }

    /// Picks the path to use without touching the filesystem.
    pub fn choose(&self, overridden: Option<&Path>, runtime: Runtime) -> PathBuf {
        match non_empty(overridden) {
            Some(path) => path.to_path_buf(),
            None => match runtime {
                Runtime::Container => PathBuf::from(self.container),
                Runtime::Host => PathBuf::from(self.local),
            },
        }
    }
}

/// Locates the LibreOffice executable.
///
/// Order: explicit override, well-known install locations, `libreoffice` and
/// `soffice` on `PATH`, and finally [`FALLBACK_ENGINE`].
pub fn resolve_engine(overridden: Option<&Path>) -> PathBuf {
    if let Some(path) = non_empty(overridden) {
        return path.to_path_buf();
    }
    if let Some(path) = first_existing(ENGINE_INSTALLS.iter().map(Path::new)) {
        return path;
    }
    for exe in ENGINE_EXECUTABLES {
        if let Ok(path) = which::which(exe) {
            tracing::trace!(path = %path.display(), "Discovered LibreOffice on PATH");
            return path;
        }
    }
    tracing::info!(fallback = FALLBACK_ENGINE, "LibreOffice not detected on your system");
    PathBuf::from(FALLBACK_ENGINE)
}

fn first_existing<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.exists()).map(Path::to_path_buf)
}

// An empty environment variable counts as "not set".
fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_detection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let marker = temp_dir.path().join(".dockerenv");
        assert_eq!(Runtime::detect_with_marker(&marker), Runtime::Host);
        std::fs::write(&marker, b"").unwrap();
        assert_eq!(Runtime::detect_with_marker(&marker), Runtime::Container);
    }

    #[test]
    fn test_override_is_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("nested/inbox");
        let resolved = RAW_DATA_DIR.resolve(Some(&target), Runtime::Container);
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
        assert_eq!(resolved, target.canonicalize().unwrap());
    }

    #[test]
    fn test_choose() {
        let overridden = Path::new("/srv/inbox");
        assert_eq!(RAW_DATA_DIR.choose(Some(overridden), Runtime::Host), overridden);
        assert_eq!(RAW_DATA_DIR.choose(None, Runtime::Container), Path::new("/app/raw_data"));
        assert_eq!(PREPARED_DATA_DIR.choose(None, Runtime::Host), Path::new("./prepared_data"));
        // An empty environment variable counts as unset.
        assert_eq!(PREPARED_DATA_DIR.choose(Some(Path::new("")), Runtime::Container), Path::new("/app/prepared_data"));
    }

    #[test]
    fn test_engine_override_wins() {
        let overridden = Path::new("/opt/custom/soffice");
        assert_eq!(resolve_engine(Some(overridden)), overridden);
    }

    #[test]
    fn test_first_existing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let present = temp_dir.path().join("soffice");
        std::fs::write(&present, b"").unwrap();
        let missing = temp_dir.path().join("libreoffice");
        assert_eq!(first_existing([missing.as_path(), present.as_path()]), Some(present.clone()));
        assert_eq!(first_existing([missing.as_path()]), None);
    }
}
