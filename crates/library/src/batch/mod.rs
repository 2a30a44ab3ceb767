//! Batch renaming.
//!
//! Works through every image directly inside a source folder, one at a time:
//! a [`NameGenerator`](crate::NameGenerator) names it, then it is moved into
//! the target folder under that name. Names are never overwritten; a taken
//! name gets one retry with a suffix before the file is skipped.
//!
//! Throughput is capped by a [`RateWindow`], a rolling count of completions
//! over the last 61 seconds. The collaborators behind the name generator are
//! typically metered per minute.
//!
//! [`batch`] streams progress as [`BatchEvent`]s; [`run`] just returns the
//! final [`RunSummary`].

pub mod error;
mod file;
mod stream;
mod window;

pub use self::file::{COLLISION_SUFFIX, Placement};
pub use self::stream::{BatchEvent, Failure, Processed, RunSummary, batch, run};
pub use self::window::{RateWindow, WINDOW};
