//! Path validation utilities.
//!
//! Generated names are untrusted text; this keeps them from ever being
//! interpreted as anything other than a single entry inside a folder.

use std::path::{Component, Path};

use crate::error::{ErrorKind, Result};

/// Longest file name, in bytes, accepted by common filesystems.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Validates a bare file name (no directories).
///
/// Rejects empty names, `.` and `..`, anything containing a path separator or
/// a null byte, and names longer than [`MAX_FILE_NAME_BYTES`].
///
/// # Examples
///
/// ```
/// use picname_storage::validate_file_name;
/// // Valid names
/// assert!(validate_file_name("20230422 sunset beach.jpg").is_ok());
/// assert!(validate_file_name("unnamed42_.png").is_ok());
/// // Invalid names
/// assert!(validate_file_name("").is_err());
/// assert!(validate_file_name("..").is_err());
/// assert!(validate_file_name("a/b.jpg").is_err());
/// assert!(validate_file_name("a\0b.jpg").is_err());
/// ```
pub fn validate_file_name(name: &str) -> Result<&str> {
    if name.len() > MAX_FILE_NAME_BYTES || name.contains('\0') {
        exn::bail!(ErrorKind::InvalidFileName(name.to_string()));
    }
    // Use Rust's own component parser, so platform separators are handled
    // without listing them here.
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(single)), None) if single == name => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidFileName(name.to_string())),
    }
}
