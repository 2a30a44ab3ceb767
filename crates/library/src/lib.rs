pub mod batch;
pub mod collaborator;
pub mod error;
mod namer;

pub use crate::batch::{BatchEvent, RunSummary};
pub use crate::namer::{ContentNamer, NameGenerator};
