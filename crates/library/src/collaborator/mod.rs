//! Content-analysis collaborators.
//!
//! Each collaborator is an opaque black box producing free text: one reads
//! the text visible in an image, one describes the image in keywords, and one
//! picks notable terms (people, places, organizations) out of a piece of text.
//! Whatever they print is treated as untrusted and cleaned up downstream.

mod command;
pub mod error;

pub use self::command::{CommandCollaborator, check_setup};
use self::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Reads the text visible in an image.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &Path) -> Result<String>;
}

/// Describes an image as a line of keywords.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, image: &Path) -> Result<String>;
}

/// Picks notable terms out of text.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn entities(&self, text: &str) -> Result<Vec<String>>;
}

/// Stands in for a collaborator that isn't configured: always succeeds and
/// never has anything to say.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfigured;

#[async_trait]
impl TextExtractor for Unconfigured {
    async fn extract_text(&self, _image: &Path) -> Result<String> {
        Ok(String::new())
    }
}

#[async_trait]
impl Describer for Unconfigured {
    async fn describe(&self, _image: &Path) -> Result<String> {
        Ok(String::new())
    }
}

#[async_trait]
impl EntityExtractor for Unconfigured {
    async fn entities(&self, _text: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
