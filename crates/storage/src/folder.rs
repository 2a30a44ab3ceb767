//! Local folder access.
//!
//! Files are accessed using `tokio::fs` for async I/O. Listing is
//! deliberately shallow: only the immediate entries of a folder are
//! considered, and only those with a recognized image extension.

use crate::error::{ErrorKind, Result};
use crate::models::FileInfo;
use crate::path::validate_file_name;
use async_stream::stream;
use futures::{Stream, TryStreamExt};
use std::fs::create_dir_all as sync_create_dir;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, OpenOptions};

/// Extensions (compared case-insensitively) of files that are picked up.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Whether a path has one of the [`IMAGE_EXTENSIONS`].
pub fn is_image(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Reads the metadata of a single file, wherever it lives.
pub async fn stat(path: &Path) -> Result<FileInfo> {
    let metadata = fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    Ok(FileInfo::from_metadata(path, &metadata).map_err(|e| ErrorKind::from_io(e, path))?)
}

/// A directory on the local filesystem.
///
/// # Examples
///
/// ```no_run
/// use picname_storage::LocalFolder;
///
/// # async fn example() -> picname_storage::error::Result<()> {
/// let source = LocalFolder::open("/path/to/screenshots")?;
/// for file in source.list().await? {
///     println!("{}", file.path.display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalFolder {
    root: PathBuf,
}
impl LocalFolder {
    /// Opens an existing folder.
    ///
    /// # Errors
    ///
    /// [`NotFound`](ErrorKind::NotFound) if nothing exists at `root`, or
    /// [`NotADirectory`](ErrorKind::NotADirectory) if it isn't a folder.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            exn::bail!(ErrorKind::NotFound(root));
        }
        if !root.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(root));
        }
        Ok(Self { root })
    }

    /// Opens a folder, creating it (and any missing parents) first if needed.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if root.exists() {
            return Self::open(root);
        }
        // Use non-async here; it only happens once per run and it's not worth
        // making the constructor async.
        sync_create_dir(&root).map_err(|e| ErrorKind::from_io(e, &root))?;
        tracing::debug!(path = %root.display(), "Created folder");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Streams the images directly inside this folder, in directory order.
    ///
    /// Subfolders, non-image files and broken symlinks are skipped. Errors on
    /// individual entries are yielded without ending the stream.
    pub fn list_stream(&self) -> impl Stream<Item = Result<FileInfo>> + Send + '_ {
        Box::pin(stream! {
            let mut entries = match fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(exn::Exn::from(ErrorKind::from_io(e, &self.root)));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => { yield Err(exn::Exn::from(ErrorKind::from_io(e, &self.root))); continue; },
                };
                match Self::process_entry(entry).await {
                    Ok(Some(file)) => yield Ok(file),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    /// Collects [`list_stream`](Self::list_stream), sorted by path so that
    /// runs over the same folder are repeatable.
    pub async fn list(&self) -> Result<Vec<FileInfo>> {
        let mut files: Vec<FileInfo> = self.list_stream().try_collect().await?;
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn process_entry(entry: DirEntry) -> Result<Option<FileInfo>> {
        let path = entry.path();
        if !is_image(&path) {
            return Ok(None);
        }
        // Follows symlinks, unlike `DirEntry::metadata`.
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            // Note: silently drop what is most likely a broken symlink.
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(None),
            Err(e) => exn::bail!(ErrorKind::from_io(e, path)),
        };
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(FileInfo::from_metadata(&path, &metadata).map_err(|e| ErrorKind::from_io(e, &path))?))
    }

    /// Moves `source` into this folder as `file_name`, never overwriting.
    ///
    /// Falls back to copy-then-delete when `source` lives on another
    /// filesystem. Returns the new path.
    ///
    /// # Errors
    ///
    /// [`AlreadyExists`](ErrorKind::AlreadyExists) if the target is taken;
    /// [`InvalidFileName`](ErrorKind::InvalidFileName) if `file_name` isn't a
    /// bare file name. The source is left untouched in both cases.
    pub async fn move_into(&self, source: &Path, file_name: &str) -> Result<PathBuf> {
        let target = self.root.join(validate_file_name(file_name)?);
        if fs::try_exists(&target).await.map_err(|e| ErrorKind::from_io(e, &target))? {
            exn::bail!(ErrorKind::AlreadyExists(target));
        }
        match fs::rename(source, &target).await {
            Ok(()) => {},
            Err(e) if e.kind() == IoErrorKind::CrossesDevices => {
                tracing::debug!(from = %source.display(), to = %target.display(), "Moving across filesystems");
                Self::copy_then_delete(source, &target).await?;
            },
            Err(e) => exn::bail!(ErrorKind::from_io(e, source)),
        }
        Ok(target)
    }

    async fn copy_then_delete(source: &Path, target: &Path) -> Result<()> {
        let mut reader = fs::File::open(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
        // `create_new` keeps the no-overwrite guarantee even if the target
        // appeared since it was checked.
        let mut writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .await
            .map_err(|e| ErrorKind::from_io(e, target))?;
        // Covers errors below as well as the future being dropped mid-copy.
        let mut partial = PartialCopy::new(target);
        tokio::io::copy(&mut reader, &mut writer).await.map_err(|e| ErrorKind::from_io(e, target))?;
        writer.sync_all().await.map_err(|e| ErrorKind::from_io(e, target))?;
        drop(writer);
        partial.keep();
        fs::remove_file(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
        Ok(())
    }
}

/// Removes an incomplete copy on drop unless it was kept.
struct PartialCopy<'a>(Option<&'a Path>);
impl<'a> PartialCopy<'a> {
    fn new(path: &'a Path) -> Self {
        Self(Some(path))
    }

    fn keep(&mut self) {
        self.0 = None;
    }
}
impl Drop for PartialCopy<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            tracing::debug!(path = %path.display(), "Removing incomplete copy");
            _ = std::fs::remove_file(path);
        }
    }
}
