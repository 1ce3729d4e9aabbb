//! In-memory stand-in for LibreOffice, for testing.

use crate::engine::{Casing, Engine};
use crate::format::Format;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Engine that "converts" by writing a small marker file, without spawning
/// anything.
pub struct MockEngine {
    available: bool,
    casing: Casing,
    /// File stems for which nothing is produced.
    failing: HashSet<String>,
    invocations: Mutex<Vec<PathBuf>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            available: true,
            casing: Casing::Lower,
            failing: HashSet::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Pretend the executable is missing.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Extension casing used for produced files.
    pub fn with_casing(mut self, casing: Casing) -> Self {
        self.casing = casing;
        self
    }

    /// Produce nothing for sources with this file stem.
    pub fn failing(mut self, stem: impl Into<String>) -> Self {
        self.failing.insert(stem.into());
        self
    }

    /// Every source file the engine has been asked to convert, in order.
    pub fn invocations(&self) -> Vec<PathBuf> {
        self.invocations.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Content written into every produced file.
    pub fn content_for(source: &Path, target: Format) -> String {
        format!("{} converted to {target}", source.file_name().unwrap_or_default().to_string_lossy())
    }
}

impl Engine for MockEngine {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn invoke(&self, source: &Path, out_dir: &Path, target: Format) -> Option<PathBuf> {
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(source.to_path_buf());
        }
        let stem = source.file_stem()?.to_string_lossy().into_owned();
        if self.failing.contains(&stem) {
            return None;
        }
        let produced = out_dir.join(format!("{stem}.{}", self.casing.apply(target.extension())));
        std::fs::write(&produced, Self::content_for(source, target)).ok()?;
        Some(produced)
    }
}
