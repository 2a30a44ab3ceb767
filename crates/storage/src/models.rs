//! Storage models.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use time::{OffsetDateTime, UtcOffset};

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// The local UTC offset, determined once and then cached.
///
/// On some platforms the offset can only be read while the process is still
/// single-threaded, so binaries should call this before starting an async
/// runtime. If it can't be determined, UTC is used.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Metadata for a file inside a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Full path, including the folder it lives in
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp, in local time
    pub modified: OffsetDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: OffsetDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    pub(crate) fn from_metadata(path: &Path, metadata: &Metadata) -> std::io::Result<Self> {
        let modified = OffsetDateTime::from(metadata.modified()?).to_offset(local_offset());
        Ok(Self::new(path, metadata.len(), modified))
    }

    /// File extension as written (without the leading dot), if any.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(OsStr::to_str)
    }

    /// Final path component.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(OsStr::to_str)
    }
}
