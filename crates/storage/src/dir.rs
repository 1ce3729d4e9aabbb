//! Managed directory handles.
//!
//! A [`ManagedDir`] wraps one of the two roots docshift owns (the inbox and
//! the outbox). Files are accessed using standard filesystem operations via
//! `tokio::fs`, and every path handed in from the outside is checked to stay
//! underneath the root.

use crate::error::{ErrorKind, Result};
use crate::models::{Census, FileEntry};
use crate::path::{validate as validate_path, validate_file_name};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::{self, DirEntry};

pub type FileEntryStream<'a> = Pin<Box<dyn Stream<Item = Result<FileEntry>> + Send + 'a>>;

enum WalkEntry {
    File(FileEntry),
    Descend(PathBuf),
    Skip,
}

/// One of the directories managed by docshift.
///
/// # Examples
///
/// ```no_run
/// use docshift_storage::ManagedDir;
///
/// # async fn example() -> docshift_storage::error::Result<()> {
/// let inbox = ManagedDir::new("raw", "/app/raw_data")?;
/// for file in inbox.list(true).await? {
///     println!("{} ({} bytes)", file.path.display(), file.size);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ManagedDir {
    /// Public name of the directory (used in API paths and logs).
    name: String,
    root: PathBuf,
}
impl ManagedDir {
    /// Create a new handle. The root does not have to exist (yet), but it
    /// must be absolute and must not be something other than a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() && !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Convert an absolute path back to a path relative to the root.
    pub fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute
            .strip_prefix(&self.root)
            .or_raise(|| ErrorKind::InvalidPath(absolute.to_path_buf()))?;
        validate_path(relative)
    }

    fn entry(relative: &Path, metadata: Metadata) -> Result<FileEntry> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileEntry::new(relative, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    // Keeps `?` usable; the stream loop below can only yield errors.
    //
    // Symlinks are never descended into. A symlink to a file is listed only
    // when its target resolves to somewhere inside the canonical root.
    async fn process_entry(&self, entry: DirEntry, canonical_root: &Path, recursive: bool) -> Result<WalkEntry> {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?;
        if file_type.is_dir() {
            return Ok(match recursive {
                true => WalkEntry::Descend(path),
                false => WalkEntry::Skip,
            });
        }
        let metadata = if file_type.is_symlink() {
            let resolved = fs::canonicalize(&path).await.map_err(|e| Self::map_io_error(e, &path))?;
            if !resolved.starts_with(canonical_root) {
                tracing::debug!(dir = %self.name, path = %path.display(), "Skipping symlink to outside of managed directory");
                return Ok(WalkEntry::Skip);
            }
            fs::metadata(&resolved).await.map_err(|e| Self::map_io_error(e, &path))?
        } else {
            entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?
        };
        if metadata.is_file() {
            let relative = self.relative_path(&path)?;
            return Ok(WalkEntry::File(Self::entry(&relative, metadata)?));
        }
        Ok(WalkEntry::Skip)
    }

    /// Stream metadata of every file in the directory, descending into
    /// subdirectories only when `recursive` is set. Order is unspecified.
    /// Symlinked directories are never followed.
    ///
    /// A root that doesn't exist yields nothing rather than an error.
    pub fn list_stream(&self, recursive: bool) -> FileEntryStream<'_> {
        Box::pin(stream! {
            let (mut stack, canonical_root) = match fs::canonicalize(&self.root).await {
                Ok(canonical) => (vec![self.root.clone()], canonical),
                Err(err) => {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &self.root)));
                    }
                    (Vec::new(), PathBuf::new())
                },
            };
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, &canonical_root, recursive).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => stack.push(d),
                        Ok(WalkEntry::Skip) => {},
                        // Most likely a broken symlink; don't fail the whole listing.
                        Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    /// List files sorted by file name (ties broken by relative path).
    pub async fn list(&self, recursive: bool) -> Result<Vec<FileEntry>> {
        let mut files: Vec<FileEntry> = self.list_stream(recursive).try_collect().await?;
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        Ok(files)
    }

    /// Count every file (recursively) and collect their extensions.
    pub async fn census(&self) -> Result<Census> {
        self.list_stream(true)
            .try_fold(Census::default(), |mut census, entry| async move {
                census.record(&entry);
                Ok(census)
            })
            .await
    }

    /// Delete a single file directly inside the root.
    ///
    /// Only a bare file name is accepted; anything with directory components
    /// is rejected with [`ErrorKind::InvalidPath`], as is a name that
    /// resolves (through symlinks) to somewhere outside of the root.
    pub async fn delete(&self, name: &str) -> Result<PathBuf> {
        let name = PathBuf::from(validate_file_name(name)?);
        let target = self.root.join(&name);
        if !fs::try_exists(&target).await.map_err(|e| Self::map_io_error(e, &name))? {
            exn::bail!(ErrorKind::NotFound(name));
        }
        let root = fs::canonicalize(&self.root).await.map_err(|e| Self::map_io_error(e, &self.root))?;
        let resolved = fs::canonicalize(&target).await.map_err(|e| Self::map_io_error(e, &name))?;
        if !resolved.starts_with(&root) {
            tracing::warn!(dir = %self.name, name = %name.display(), "Refusing to delete file outside of managed directory");
            exn::bail!(ErrorKind::InvalidPath(name));
        }
        if !fs::metadata(&resolved).await.map_err(|e| Self::map_io_error(e, &name))?.is_file() {
            exn::bail!(ErrorKind::NotAFile(name));
        }
        fs::remove_file(&target).await.map_err(|e| Self::map_io_error(e, &name))?;
        tracing::info!(dir = %self.name, path = %target.display(), "Deleted file");
        Ok(name)
    }
}
