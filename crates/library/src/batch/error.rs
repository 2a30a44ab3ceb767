//! Error types for the [`batch`](super) module.

use derive_more::{Display, Error};

/// A batch error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for batch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a batch run (or a single file within it) failed.
///
/// ### Fatal
/// - [`ErrorKind::Source`] and [`ErrorKind::Target`] stop the run before any
///   file is touched.
/// - [`ErrorKind::QuotaExhausted`] stops the run between files.
///
/// ### Per file
/// - [`ErrorKind::Generate`] and [`ErrorKind::Move`] skip the file; the run
///   carries on.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("source folder unavailable")]
    Source,
    #[display("target folder unavailable")]
    Target,
    #[display("collaborator quota exhausted")]
    QuotaExhausted,
    #[display("could not generate a name: {_0}")]
    Generate(#[error(not(source))] String),
    #[display("could not move file into the target folder: {_0}")]
    Move(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Generate(_) | Self::Move(_))
    }

    /// Whether the whole run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Source | Self::Target | Self::QuotaExhausted)
    }
}
