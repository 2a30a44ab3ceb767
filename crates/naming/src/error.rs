//! Naming Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Almost everything in this crate is infallible by contract (bad dates fall
//! through to the next tier, missing wordlists are empty), so the only thing
//! that can actually go wrong is reading a wordlist that exists but can't be
//! read.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A wordlist file exists but could not be read (permissions, invalid UTF-8).
    #[display("unreadable wordlist: {}", _0.display())]
    Wordlist(#[error(not(source))] PathBuf),
    /// The exclusion wordlist could not be compiled into a matcher.
    #[display("invalid exclusion pattern")]
    Pattern,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Wordlist(_))
    }
}
