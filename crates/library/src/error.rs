//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load wordlists")]
    Wordlists,
    #[display("collaborator setup failed")]
    Setup,
    /// A collaborator's usage quota is gone for the day. Every further request
    /// would fail the same way, so the whole run should stop.
    #[display("collaborator quota exhausted")]
    QuotaExhausted,
    #[display("could not generate a name")]
    Generate,
    #[display("batch run failed")]
    Batch,
}
