use crate::batch::error::{ErrorKind as BatchErrorKind, Result as BatchResult};
use exn::ResultExt;
use picname_storage::error::ErrorKind as StorageErrorKind;
use picname_storage::{FileInfo, LocalFolder};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Appended to the name when the first choice is already taken.
pub const COLLISION_SUFFIX: &str = "_";

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Moved under the generated name.
    Moved(PathBuf),
    /// The generated name was taken; moved under the suffixed name instead.
    Collided(PathBuf),
}
impl Placement {
    pub fn path(&self) -> &Path {
        match self {
            Self::Moved(path) | Self::Collided(path) => path,
        }
    }
}

fn file_name(name: &str, extension: Option<&str>) -> String {
    match extension {
        Some(extension) => format!("{name}.{extension}"),
        None => name.to_string(),
    }
}

/// Moves `file` into `target` as `name`, keeping its extension.
///
/// If that name is taken, one more attempt is made with
/// [`COLLISION_SUFFIX`] appended to the name. If that is taken as well (or
/// anything else goes wrong) the file stays where it is.
pub(crate) async fn place(target: &LocalFolder, file: &FileInfo, name: &str) -> BatchResult<Placement> {
    let extension = file.extension();
    match target.move_into(&file.path, &file_name(name, extension)).await {
        Ok(path) => return Ok(Placement::Moved(path)),
        Err(e) if matches!(e.deref(), StorageErrorKind::AlreadyExists(_)) => {
            tracing::debug!(name, "Name already taken; trying with a suffix");
        },
        Err(e) => {
            let kind = move_failed(&e);
            return Err(e).or_raise(|| kind);
        },
    }
    let alternative = format!("{name}{COLLISION_SUFFIX}");
    match target.move_into(&file.path, &file_name(&alternative, extension)).await {
        Ok(path) => Ok(Placement::Collided(path)),
        Err(e) => {
            let kind = move_failed(&e);
            Err(e).or_raise(|| kind)
        },
    }
}

fn move_failed(e: &picname_storage::error::Error) -> BatchErrorKind {
    BatchErrorKind::Move(e.deref().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn image(dir: &Path, name: &str) -> FileInfo {
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        picname_storage::stat(&path).await.unwrap()
    }

    #[tokio::test]
    async fn test_keeps_extension_as_written() {
        let source = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let target = LocalFolder::open(target_dir.path()).unwrap();
        let file = image(source.path(), "IMG_0001.JPG").await;
        let placement = place(&target, &file, "sunset beach").await.unwrap();
        assert_eq!(placement, Placement::Moved(target.root().join("sunset beach.JPG")));
        assert!(!file.path.exists());
    }

    #[tokio::test]
    async fn test_collision_then_failure() {
        let source = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let target = LocalFolder::open(target_dir.path()).unwrap();

        let first = image(source.path(), "a.jpg").await;
        let second = image(source.path(), "b.jpg").await;
        let third = image(source.path(), "c.jpg").await;

        assert!(matches!(place(&target, &first, "sunset beach").await.unwrap(), Placement::Moved(_)));
        let collided = place(&target, &second, "sunset beach").await.unwrap();
        assert_eq!(collided, Placement::Collided(target_dir.path().join("sunset beach_.jpg")));

        let err = place(&target, &third, "sunset beach").await.unwrap_err();
        assert!(matches!(&*err, BatchErrorKind::Move(_)));
        assert!(third.path.exists());
        assert_eq!(std::fs::read(target_dir.path().join("sunset beach.jpg")).unwrap(), b"a.jpg");
        assert_eq!(std::fs::read(target_dir.path().join("sunset beach_.jpg")).unwrap(), b"b.jpg");
    }

    #[test]
    fn test_name_budget_fits_file_name_limit() {
        let longest = picname_storage::IMAGE_EXTENSIONS.iter().map(|ext| ext.len()).max().unwrap_or_default();
        let worst = picname_naming::MAX_NAME_BYTES + COLLISION_SUFFIX.len() + 1 + longest;
        assert!(worst <= picname_storage::MAX_FILE_NAME_BYTES);
    }

    #[tokio::test]
    async fn test_invalid_name_is_not_retried() {
        let source = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let target = LocalFolder::open(target_dir.path()).unwrap();
        let file = image(source.path(), "a.png").await;
        let err = place(&target, &file, "../escape").await.unwrap_err();
        assert!(matches!(&*err, BatchErrorKind::Move(_)));
        assert!(file.path.exists());
        assert_eq!(std::fs::read_dir(target_dir.path()).unwrap().count(), 0);
    }
}
