use crate::engine::Engine;
use crate::task::{FileTask, Outcome};
use std::fs;
use std::io;
use std::path::Path;

/// Processes a single file: copies modern documents, converts legacy ones.
///
/// Never fails; problems are logged and reported as [`Outcome::Failed`].
pub fn dispatch(engine: &dyn Engine, task: &FileTask, destination: &Path) -> Outcome {
    let failed = Outcome::Failed(task.rule.source);
    let Some(out_dir) = destination.parent() else {
        tracing::error!(destination = %destination.display(), "Destination has no parent directory");
        return failed;
    };
    if let Err(e) = fs::create_dir_all(out_dir) {
        tracing::error!(dir = %out_dir.display(), error = %e, "Unable to create output directory");
        return failed;
    }

    let Some(legacy) = task.rule.legacy() else {
        return match copy_preserving(&task.source, destination) {
            Ok(bytes) => {
                tracing::debug!(bytes, destination = %destination.display(), "Copied");
                Outcome::Copied
            },
            Err(e) => {
                tracing::error!(source = %task.source.display(), error = %e, "Unable to copy file");
                failed
            },
        };
    };

    match engine.invoke(&task.source, out_dir, task.rule.target) {
        Some(produced) => {
            reconcile(&produced, destination);
            Outcome::Converted(legacy)
        },
        None => failed,
    }
}

/// Byte-for-byte copy that keeps the source's modification time.
fn copy_preserving(source: &Path, destination: &Path) -> io::Result<u64> {
    let bytes = fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    filetime::set_file_mtime(destination, filetime::FileTime::from_system_time(modified))?;
    Ok(bytes)
}

/// The engine chooses the extension's casing. Move the file to the
/// canonical destination when it picked something else.
///
/// A failed rename is only logged: the converted file still exists (under
/// its produced name), which counts as a successful conversion.
fn reconcile(produced: &Path, destination: &Path) {
    if produced == destination {
        return;
    }
    // `rename` replaces an existing destination; removing it first would
    // delete `produced` on case-insensitive filesystems.
    match fs::rename(produced, destination) {
        Ok(()) => tracing::debug!(
            from = %produced.display(),
            to = %destination.display(),
            "Renamed converted file"
        ),
        Err(e) => tracing::warn!(
            from = %produced.display(),
            to = %destination.display(),
            error = %e,
            "Unable to rename converted file; keeping it under its produced name"
        ),
    }
}
