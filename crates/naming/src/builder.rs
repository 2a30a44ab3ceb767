//! Filename assembly.
//!
//! Packing is greedy and never backtracks: candidates are considered strictly
//! in order, and a word that doesn't fit (or isn't wanted) is skipped without
//! revisiting anything already accepted. Later, shorter words may still fit.

use crate::date::DateToken;
use crate::error::Result;
use crate::normalize::{clean, fold};
use crate::sanitize::{sanitize, strip_illegal};
use crate::{Wordlists, dedupe_words};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// Default upper bound on the length of a generated name, in characters,
/// excluding the file extension.
pub const DEFAULT_MAX_LENGTH: usize = 135;
/// Fallback names are `unnamed0` up to and including this number.
pub const FALLBACK_MAX: u32 = 1000;
/// Upper bound on the size of a generated name, in bytes. File names are
/// limited to 255 bytes, which has to fit the name, a collision suffix (`_`)
/// and the longest image extension (`.jpeg`).
pub const MAX_NAME_BYTES: usize = 255 - "_".len() - ".jpeg".len();

/// Source of the number appended to fallback names.
pub trait NumberSource: Send + Sync {
    /// Returns a number in `0..=max`.
    fn up_to(&self, max: u32) -> u32;
}

/// Uniformly random numbers from the thread-local generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;
impl NumberSource for ThreadRandom {
    fn up_to(&self, max: u32) -> u32 {
        use rand::Rng;
        rand::rng().random_range(0..=max)
    }
}

/// Turns candidate text into a filename (without extension).
#[derive(Clone)]
pub struct FilenameBuilder {
    wordlists: Arc<Wordlists>,
    exclusion: Option<Regex>,
    max_length: usize,
    numbers: Arc<dyn NumberSource>,
}
impl FilenameBuilder {
    pub fn new(wordlists: Arc<Wordlists>) -> Result<Self> {
        let exclusion = wordlists.exclusion_pattern()?;
        Ok(Self {
            wordlists,
            exclusion,
            max_length: DEFAULT_MAX_LENGTH,
            numbers: Arc::new(ThreadRandom),
        })
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Replaces the random source used for fallback names.
    pub fn with_numbers(mut self, numbers: impl NumberSource + 'static) -> Self {
        self.numbers = Arc::new(numbers);
        self
    }

    pub fn wordlists(&self) -> &Wordlists {
        &self.wordlists
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Cleans raw text into a pool of candidate words: sanitizes it, drops
    /// repeated words, removes excluded words (whole words, ignoring case) and
    /// collapses whitespace.
    pub fn prepare(&self, text: &str) -> String {
        let text = dedupe_words(&strip_illegal(&sanitize(text)));
        let text = match &self.exclusion {
            Some(pattern) => pattern.replace_all(&text, " ").into_owned(),
            None => text,
        };
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Greedily packs `candidates` after the optional date prefix, never
    /// exceeding `max_length` characters or [`MAX_NAME_BYTES`] bytes in
    /// total.
    ///
    /// A candidate is skipped when it would overflow the budget, when it
    /// normalizes to nothing, when it is excluded, when allow-lists exist but
    /// it is neither on one nor longer than three characters, or when a word
    /// with the same normal form was already accepted.
    ///
    /// ```
    /// use picname_naming::{DateToken, FilenameBuilder, Wordlists};
    /// use std::sync::Arc;
    ///
    /// let builder = FilenameBuilder::new(Arc::new(Wordlists::default())).unwrap();
    /// let date = DateToken::normalize("2023-04-22");
    /// let name = builder.build(["Vaccines", "center", "vaccine", "queue"], date.as_ref(), 30);
    /// assert_eq!(name, "20230422 Vaccines center queue");
    /// ```
    pub fn build<I, S>(&self, candidates: I, date: Option<&DateToken>, max_length: usize) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut draft: Vec<String> = Vec::new();
        let mut length = 0;
        let mut bytes = 0;
        let mut seen = HashSet::new();
        if let Some(date) = date {
            draft.push(date.to_string());
            length = date.as_str().len();
            bytes = length;
            seen.insert(date.to_string());
        }
        let allow_lists = self.wordlists.has_allow_lists();

        for candidate in candidates {
            let word = candidate.as_ref();
            let separator = usize::from(!draft.is_empty());
            let too_long = length + separator + word.chars().count() > max_length;
            if too_long || bytes + separator + word.len() > MAX_NAME_BYTES {
                continue;
            }
            let cleaned = clean(word);
            let normal = fold(&cleaned);
            if normal.is_empty() {
                continue;
            }
            if self.wordlists.exclude.contains(&normal) || self.wordlists.exclude.contains(&cleaned) {
                continue;
            }
            if allow_lists
                && !(self.wordlists.allows(&normal) || self.wordlists.allows(&cleaned) || cleaned.chars().count() > 3)
            {
                continue;
            }
            if !seen.insert(normal) {
                continue;
            }
            length += separator + word.chars().count();
            bytes += separator + word.len();
            draft.push(word.to_string());
        }
        draft.join(" ")
    }

    /// A placeholder name, `unnamed<N>`, date-prefixed when a date is known.
    pub fn fallback(&self, date: Option<&DateToken>) -> String {
        let number = self.numbers.up_to(FALLBACK_MAX);
        match date {
            Some(date) => format!("{date} unnamed{number}"),
            None => format!("unnamed{number}"),
        }
    }

    /// Substitutes the [fallback](Self::fallback) when `built` carries no
    /// words of its own.
    pub fn finalize(&self, built: String, date: Option<&DateToken>) -> String {
        let bare = built.is_empty() || date.is_some_and(|date| built == date.as_str());
        match bare {
            true => self.fallback(date),
            false => built,
        }
    }

    /// Prepares each source of candidate text in turn, then builds and
    /// finalizes a name from the combined pool using the configured length.
    pub fn name<I, S>(&self, sources: I, date: Option<&DateToken>) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pool: Vec<String> = sources.into_iter().map(|source| self.prepare(source.as_ref())).collect();
        let words = pool.iter().flat_map(|text| text.split_whitespace());
        let built = self.build(words, date, self.max_length);
        self.finalize(built, date)
    }
}
