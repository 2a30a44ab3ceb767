//! Error types for the [`collaborator`](super) module.
//!
//! Collaborators are external programs, so the only structured information
//! we get back is the text they print when they fail. [`ErrorKind::classify`]
//! turns that text into something the caller can act on.

use derive_more::{Display, Error};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// A collaborator error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for collaborator operations.
pub type Result<T> = std::result::Result<T, Error>;

static RETRY_SECONDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"after (\d+) second").unwrap());
static RETRY_DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"after (\d+) day").unwrap());
static UNSUPPORTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)outside the supported|unsupported image").unwrap());

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Throttled; the same request may succeed after waiting.
    #[display("throttled, try again after {}s", _0.as_secs())]
    RetryAfter(#[error(not(source))] Duration),
    /// Usage quota is used up for at least a day. Retrying is pointless.
    #[display("quota exhausted")]
    QuotaExhausted,
    /// The image can't be processed by this collaborator.
    #[display("unsupported image")]
    Unsupported,
    /// Anything else the collaborator complained about.
    #[display("collaborator failed: {_0}")]
    Failed(#[error(not(source))] String),
    /// The configured program can't be found.
    #[display("program not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The program could not be started or talked to.
    #[display("could not run {_0}")]
    Spawn(#[error(not(source))] String),
}

impl ErrorKind {
    /// Classifies a collaborator's error message.
    ///
    /// ```
    /// use picname_library::collaborator::error::ErrorKind;
    /// use std::time::Duration;
    ///
    /// assert_eq!(ErrorKind::classify("Rate limit. Try again after 12 seconds."), ErrorKind::RetryAfter(Duration::from_secs(12)));
    /// assert_eq!(ErrorKind::classify("Quota exceeded. Try again after 3 days."), ErrorKind::QuotaExhausted);
    /// ```
    pub fn classify(message: &str) -> Self {
        if let Some(captures) = RETRY_SECONDS.captures(message)
            && let Ok(seconds) = captures[1].parse::<u64>()
        {
            return Self::RetryAfter(Duration::from_secs(seconds));
        }
        if RETRY_DAYS.is_match(message) {
            return Self::QuotaExhausted;
        }
        if UNSUPPORTED.is_match(message) {
            return Self::Unsupported;
        }
        Self::Failed(message.trim().to_string())
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Operation returned an invalid status code 'Too Many Requests': retry after 27 seconds", ErrorKind::RetryAfter(Duration::from_secs(27)))]
    #[case("try again after 1 second", ErrorKind::RetryAfter(Duration::from_secs(1)))]
    #[case("Out of call volume quota. Quota will be replenished after 2 days.", ErrorKind::QuotaExhausted)]
    #[case("Input image is outside the supported dimensions", ErrorKind::Unsupported)]
    #[case("Unsupported image format: HEIC", ErrorKind::Unsupported)]
    #[case("  segfault\n", ErrorKind::Failed("segfault".into()))]
    fn test_classify(#[case] message: &str, #[case] expected: ErrorKind) {
        assert_eq!(ErrorKind::classify(message), expected);
    }

    #[test]
    fn test_only_throttling_is_retryable() {
        assert!(ErrorKind::RetryAfter(Duration::from_secs(1)).is_retryable());
        assert!(!ErrorKind::QuotaExhausted.is_retryable());
        assert!(!ErrorKind::Unsupported.is_retryable());
    }
}
