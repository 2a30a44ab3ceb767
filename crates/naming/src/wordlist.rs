//! Word allow- and deny-lists.
//!
//! Each list is a plain UTF-8 file with one entry per line. Entries are
//! trimmed, blank lines are skipped, and comparisons are case-insensitive. A
//! missing file is a perfectly normal configuration and yields an empty list.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// An immutable set of words, loaded once.
///
/// Keeps the entries as written on disk (for re-inserting matched names into
/// candidate text) alongside a lowercased lookup set.
#[derive(Clone, Debug, Default)]
pub struct Wordlist {
    entries: Vec<String>,
    lookup: HashSet<String>,
    /// One whole-word matcher per entry, compiled on first use.
    matchers: OnceLock<Vec<Option<Regex>>>,
}
impl Wordlist {
    /// Reads a wordlist from disk. A missing file is an empty list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let list: Self = contents.lines().collect();
                tracing::debug!(path = %path.display(), words = list.len(), "Loaded wordlist");
                Ok(list)
            },
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Wordlist not found; using an empty list");
                Ok(Self::default())
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Wordlist(path.to_path_buf())),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(&word.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in file order, with their original casing.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Entries occurring in `text` as whole words, ignoring case.
    pub fn whole_words_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> {
        let matchers = self.matchers.get_or_init(|| self.entries.iter().map(|entry| whole_word(entry)).collect());
        self.entries
            .iter()
            .zip(matchers)
            .filter(move |(_, matcher)| matcher.as_ref().is_some_and(|re| re.is_match(text)))
            .map(|(entry, _)| entry.as_str())
    }
}
impl<'a> FromIterator<&'a str> for Wordlist {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut list = Self::default();
        for word in iter.into_iter().map(str::trim).filter(|w| !w.is_empty()) {
            if list.lookup.insert(word.to_lowercase()) {
                list.entries.push(word.to_string());
            }
        }
        list
    }
}

/// File locations of the four wordlists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordlistPaths {
    pub exclude: PathBuf,
    pub include: PathBuf,
    pub names: PathBuf,
    pub non_personal_names: PathBuf,
}

/// The full set of wordlists used when naming files.
#[derive(Clone, Debug, Default)]
pub struct Wordlists {
    /// Words that are always dropped.
    pub exclude: Wordlist,
    /// Words that are always worth keeping.
    pub include: Wordlist,
    /// Names of people to keep even if they aren't content words.
    pub names: Wordlist,
    /// Names of organizations, places and things to keep.
    pub non_personal_names: Wordlist,
}
impl Wordlists {
    pub fn load(paths: &WordlistPaths) -> Result<Self> {
        Ok(Self {
            exclude: Wordlist::load(&paths.exclude)?,
            include: Wordlist::load(&paths.include)?,
            names: Wordlist::load(&paths.names)?,
            non_personal_names: Wordlist::load(&paths.non_personal_names)?,
        })
    }

    /// Whether any of the allow-type lists has entries. When none do, every
    /// word that isn't excluded is acceptable.
    pub fn has_allow_lists(&self) -> bool {
        !(self.include.is_empty() && self.names.is_empty() && self.non_personal_names.is_empty())
    }

    /// Whether a word appears in any of the allow-type lists.
    pub fn allows(&self, word: &str) -> bool {
        self.include.contains(word) || self.names.contains(word) || self.non_personal_names.contains(word)
    }

    /// Finds allow-listed terms mentioned in `text`.
    ///
    /// Names (personal and otherwise) must appear as whole words; plain
    /// include-list words only need to appear somewhere in the text. Both
    /// comparisons ignore case. Terms are returned as written in the wordlist.
    ///
    /// ```
    /// use picname_naming::Wordlists;
    ///
    /// let lists = Wordlists {
    ///     names: ["Greta Thunberg", "Al"].into_iter().collect(),
    ///     include: ["climate"].into_iter().collect(),
    ///     ..Default::default()
    /// };
    /// let found = lists.mentioned_in("GRETA THUNBERG at the Climatestrike, also Alan");
    /// assert_eq!(found, vec!["Greta Thunberg", "climate"]);
    /// ```
    pub fn mentioned_in(&self, text: &str) -> Vec<String> {
        let lowercase = text.to_lowercase();
        let names = self.names.whole_words_in(text).chain(self.non_personal_names.whole_words_in(text));
        let mut found: Vec<String> = names.map(str::to_string).collect();
        found.extend(
            self.include.iter().filter(|word| lowercase.contains(&word.to_lowercase())).map(str::to_string),
        );
        found
    }

    /// Compiles the exclusion list into a single case-insensitive, whole-word
    /// pattern. Returns `None` when there is nothing to exclude.
    pub fn exclusion_pattern(&self) -> Result<Option<Regex>> {
        if self.exclude.is_empty() {
            return Ok(None);
        }
        // Longest first, so multi-word entries win over their own prefixes.
        let mut words: Vec<&str> = self.exclude.iter().collect();
        words.sort_by_key(|w| std::cmp::Reverse(w.len()));
        let alternation = words.into_iter().map(regex::escape).collect::<Vec<_>>().join("|");
        let pattern = RegexBuilder::new(&format!(r"\s*\b(?:{alternation})\b\s*"))
            .case_insensitive(true)
            .build()
            .or_raise(|| ErrorKind::Pattern)?;
        Ok(Some(pattern))
    }
}

fn whole_word(term: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term))).case_insensitive(true).build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = Wordlist::load(dir.path().join("nope.txt")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Sunset  \n\n beach\n\t\nSUNSET").unwrap();
        let list = Wordlist::load(file.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["Sunset", "beach"]);
        assert!(list.contains("sunset"));
        assert!(list.contains("BEACH"));
        assert!(!list.contains("sea"));
    }

    #[test]
    fn test_allow_lists() {
        let mut lists = Wordlists::default();
        assert!(!lists.has_allow_lists());
        lists.non_personal_names = ["NASA"].into_iter().collect();
        assert!(lists.has_allow_lists());
        assert!(lists.allows("nasa"));
        assert!(!lists.allows("esa"));
    }

    #[test]
    fn test_mentioned_names_need_word_boundaries() {
        let lists = Wordlists { names: ["Al"].into_iter().collect(), ..Default::default() };
        assert!(lists.mentioned_in("Alan and Alice").is_empty());
        assert_eq!(lists.mentioned_in("Al, and Alice"), vec!["Al"]);
    }

    #[test]
    fn test_whole_word_matchers_compiled_once() {
        let list: Wordlist = ["Greta Thunberg", "NASA"].into_iter().collect();
        assert!(list.matchers.get().is_none());
        assert_eq!(list.whole_words_in("nasa launch").collect::<Vec<_>>(), vec!["NASA"]);
        let compiled = list.matchers.get().unwrap().as_ptr();
        assert_eq!(list.whole_words_in("greta thunberg speaks").collect::<Vec<_>>(), vec!["Greta Thunberg"]);
        assert_eq!(list.matchers.get().unwrap().as_ptr(), compiled);
    }

    #[test]
    fn test_exclusion_pattern() {
        let lists = Wordlists { exclude: ["image", "photo of"].into_iter().collect(), ..Default::default() };
        let pattern = lists.exclusion_pattern().unwrap().unwrap();
        assert_eq!(pattern.replace_all("A Photo Of sunset IMAGE beach images", " ").trim(), "A sunset beach images");
        assert!(Wordlists::default().exclusion_pattern().unwrap().is_none());
    }
}
