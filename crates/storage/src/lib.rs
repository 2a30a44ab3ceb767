pub mod error;
mod folder;
mod models;
mod path;

pub use crate::folder::{IMAGE_EXTENSIONS, LocalFolder, is_image, stat};
pub use crate::models::{FileInfo, local_offset};
pub use crate::path::{MAX_FILE_NAME_BYTES, validate_file_name};
