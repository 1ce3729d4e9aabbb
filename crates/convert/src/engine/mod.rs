//! Conversion engines.
//!
//! The batch processor only ever talks to an [`Engine`], so the real
//! [`LibreOffice`] subprocess can be swapped for a [`MockEngine`] in tests.

mod libreoffice;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::libreoffice::{DEFAULT_TIMEOUT, LibreOffice};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockEngine;
use crate::format::Format;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type EngineHandle = Arc<dyn Engine>;

/// Something that can turn a legacy document into a modern one.
pub trait Engine: Send + Sync {
    /// Short description for logs and error messages (usually a path).
    fn describe(&self) -> String;

    /// Whether the engine can be invoked at all.
    fn is_available(&self) -> bool;

    /// Directory the engine runs with as its `HOME`, if it overrides it.
    fn home(&self) -> Option<&Path> {
        None
    }

    /// Converts `source` into `target` format, writing the result into
    /// `out_dir` under the source's file stem.
    ///
    /// Returns the path of the produced file, or `None` if nothing usable
    /// was produced. Implementations never fail in any other way; the
    /// reason is logged instead.
    fn invoke(&self, source: &Path, out_dir: &Path, target: Format) -> Option<PathBuf>;
}

/// Spellings of an extension that engines have been seen to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Casing {
    /// `docx`
    Lower,
    /// `DOCX`
    Upper,
    /// `Docx`
    Title,
}
impl Casing {
    /// Probe order.
    pub const ALL: [Casing; 3] = [Casing::Lower, Casing::Upper, Casing::Title];

    pub fn apply(&self, extension: &str) -> String {
        match self {
            Self::Lower => extension.to_lowercase(),
            Self::Upper => extension.to_uppercase(),
            Self::Title => {
                let lower = extension.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => lower,
                }
            },
        }
    }
}

/// Looks for `<stem>.<extension>` in `dir` under every [`Casing`], in order,
/// returning the first that exists.
pub fn probe_output(dir: &Path, stem: &str, target: Format) -> Option<PathBuf> {
    Casing::ALL
        .iter()
        .map(|casing| dir.join(format!("{stem}.{}", casing.apply(target.extension()))))
        .find(|candidate| candidate.is_file())
}
