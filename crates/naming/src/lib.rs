//! Filename derivation for images.
//!
//! Everything here is pure and synchronous: text goes in, a filename comes
//! out. The content analysis that produces the text lives elsewhere.

mod builder;
mod consts;
mod date;
pub mod error;
mod normalize;
mod sanitize;
mod wordlist;

pub use crate::builder::{DEFAULT_MAX_LENGTH, FALLBACK_MAX, FilenameBuilder, MAX_NAME_BYTES, NumberSource, ThreadRandom};
pub use crate::date::{DateSource, DateToken, Tiebreak, date_from_text, find_dates, resolve_date};
pub use crate::normalize::{canonicalize, clean, dedupe_words};
pub use crate::sanitize::{fix_ocr_mistakes, remove_gibberish, sanitize, strip_illegal};
pub use crate::wordlist::{Wordlist, WordlistPaths, Wordlists};
