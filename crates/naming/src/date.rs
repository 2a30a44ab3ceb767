//! Capture date resolution.
//!
//! A date is looked for in three places, strictly in this order, and the first
//! hit wins:
//!
//! 1. Text recognized inside the image. Of all matches, the **last** one is
//!    used: on-screen text tends to put the relevant date (a post or message
//!    timestamp) after any dates mentioned in passing.
//! 2. The image's path. Here the **first** match is used, since filenames
//!    usually lead with the date.
//! 3. The file's modification time.
//!
//! The asymmetry between tiers 1 and 2 is intentional and load-bearing.

use crate::consts::DATE_PATTERNS;
use derive_more::Display;
use std::path::Path;
use time::OffsetDateTime;

/// An eight digit `YYYYMMDD` date.
///
/// Can only be constructed from exactly eight ASCII digits, so a token is
/// either fully normalized or doesn't exist at all.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
pub struct DateToken(String);
impl DateToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats the calendar date of a timestamp, in the timestamp's own offset.
    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        Self(format!("{:04}{:02}{:02}", datetime.year(), u8::from(datetime.month()), datetime.day()))
    }

    /// Normalizes a date as matched by one of the date patterns.
    ///
    /// Separators (`-`, `/`, `.`) are stripped. Eight remaining digits from a
    /// year-first match are taken as-is; six digits on an unseparated match
    /// are treated as `YYMMDD`. Anything else is rebuilt from the separated
    /// parts: `Y-M-D`, `M/D/Y` or `D.M.Y`, zero-padding month and day. Returns
    /// `None` if the result still isn't eight digits.
    pub fn normalize(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(|c| !matches!(c, '-' | '/' | '.')).collect();
        let separated = digits.len() != raw.len();
        let year_first = !separated || raw.contains('-');
        let candidate = match digits.len() {
            8 if year_first => digits,
            6 if !separated => format!("20{digits}"),
            _ => reorder(raw)?,
        };
        Self::try_from(candidate).ok()
    }
}
impl AsRef<str> for DateToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl TryFrom<String> for DateToken {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
            true => Ok(Self(value)),
            false => Err(value),
        }
    }
}

/// Which match to keep when a text contains more than one date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tiebreak {
    First,
    Last,
}

/// Where a resolved date came from.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum DateSource {
    #[display("recognized text")]
    Text,
    #[display("file name")]
    FileName,
    #[display("modification time")]
    Modified,
}

/// Resolves the capture date for an image, trying recognized text, then the
/// path, then the modification time.
///
/// Never fails: a tier that yields nothing usable simply defers to the next.
///
/// ```
/// use picname_naming::{DateSource, resolve_date};
/// use std::path::Path;
///
/// let (date, source) = resolve_date("Posted 2023-04-22", Path::new("20200101_photo.jpg"), None).unwrap();
/// assert_eq!(date.as_str(), "20230422");
/// assert_eq!(source, DateSource::Text);
/// ```
pub fn resolve_date(
    text: &str,
    path: &Path,
    modified: Option<OffsetDateTime>,
) -> Option<(DateToken, DateSource)> {
    date_from_text(text, Tiebreak::Last)
        .map(|date| (date, DateSource::Text))
        .or_else(|| date_from_text(&path.to_string_lossy(), Tiebreak::First).map(|date| (date, DateSource::FileName)))
        .or_else(|| modified.map(|m| (DateToken::from_datetime(m), DateSource::Modified)))
}

/// Scans `text` for dates and normalizes the one picked by `tiebreak`.
pub fn date_from_text(text: &str, tiebreak: Tiebreak) -> Option<DateToken> {
    let found = find_dates(text);
    let picked = match tiebreak {
        Tiebreak::First => found.first(),
        Tiebreak::Last => found.last(),
    }?;
    DateToken::normalize(picked)
}

/// Returns every date-shaped substring of `text`, grouped by pattern in
/// pattern order (not in order of position). A match directly preceded or
/// followed by another digit is part of a longer number and is ignored.
pub fn find_dates(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    for pattern in DATE_PATTERNS {
        let mut search_from = 0;
        while let Some(m) = pattern.find_at(text, search_from) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit()) {
                // All patterns start with an ASCII digit, so this stays on a char boundary.
                search_from = m.start() + 1;
                continue;
            }
            found.push(m.as_str());
            search_from = m.end();
        }
    }
    found
}

fn reorder(raw: &str) -> Option<String> {
    let (separator, order): (char, [usize; 3]) = if raw.contains('/') {
        ('/', [2, 0, 1])
    } else if raw.contains('.') {
        ('.', [2, 1, 0])
    } else if raw.contains('-') {
        ('-', [0, 1, 2])
    } else {
        return None;
    };
    let parts: Vec<&str> = raw.split(separator).collect();
    let [year, month, day] = order.map(|i| parts.get(i).copied());
    let (year, month, day) = (year?, month?, day?);
    if parts.len() != 3 || year.len() != 4 || month.len() > 2 || day.len() > 2 {
        return None;
    }
    Some(format!("{year}{month:0>2}{day:0>2}"))
}
