use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Date shapes, in the order they are scanned. None of these are anchored
// against neighbouring digits; see `date::find_dates` for that.
regex!(DATE_ISO, r"20[0-9]{2}-[0-9]{2}-[0-9]{2}");
regex!(DATE_COMPACT, r"20[0-9]{6}");
regex!(DATE_ISO_SHORT, r"20[0-9]{2}-[0-9]{1,2}-[0-9]{1,2}");
regex!(DATE_US, r"[0-9]{1,2}/[0-9]{1,2}/20[0-9]{2}");
regex!(DATE_EU, r"[0-9]{1,2}\.[0-9]{1,2}\.20[0-9]{2}");

pub(crate) static DATE_PATTERNS: [&LazyLock<Regex>; 5] = [&DATE_ISO, &DATE_COMPACT, &DATE_ISO_SHORT, &DATE_US, &DATE_EU];

// View/like counts and "hours ago" markers: 3K, 12M, 2h.
regex!(COUNT_NOISE, r"\b\d+[KMh]\b");
regex!(SINGLE_CHAR, r"\b\w\b");
regex!(WHITESPACE_RUN, r"\s{2,}");
regex!(SPACE_RUN, r" +");
regex!(URL, r"https?://\S+");
regex!(
    GIBBERISH,
    r"\b(?:[qxzj]{2,}|[bcdfghjklmnpqrstvwxyz]*[aeiouy]{3,}[bcdfghjklmnpqrstvwxyz]*|[aeiouy]*[bcdfghjklmnpqrstvwxyz]{5,}[aeiouy]*)\b"
);
regex!(CONTRACTION, r"^\w*'[a-z]");
regex!(NON_WORD, r"\W");

/// Frequent OCR misreadings, applied as plain substring replacements.
pub(crate) const OCR_CORRECTIONS: &[(&str, &str)] = &[
    ("OAnon", "QAnon"),
    ("Trurnp", "Trump"),
    ("exarnple", "example"),
    ("ernptied", "emptied"),
    ("darnage", "damage"),
    ("Jirn", "Jim"),
    ("YouTuhe", "YouTube"),
];

/// Characters that are deleted outright from candidate filenames. Covers
/// filesystem-unsafe punctuation as well as decorative and typographic marks.
pub(crate) const ILLEGAL_CHARS: &[char] = &[
    '<', '>', ':', ',', '.', '•', '=', '-', '"', '/', '\\', '|', '?', '*', 'β', 'ß', '%', '&', '{', '}', '[', ']', '(',
    ')', '$', '!', '#', '@', ';', '^', '`', '~', '\'', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}',
    '\u{201A}', '´', '¨', '»', '«', '€', '£', '¥', '—', '_', '§', '±',
];

/// Surface spellings that collapse onto a single canonical word when checking
/// for duplicates. Never used for display.
pub(crate) const WORD_VARIANTS: &[(&str, &str)] = &[
    ("vaccin", "vaccine"),
    ("vaccination", "vaccine"),
    ("vaccinera", "vaccine"),
    ("vaccinerad", "vaccine"),
    ("ovaccinerade", "vaccine"),
    ("covid", "covid"),
    ("covid19", "covid"),
    ("coronavirus", "covid"),
    ("corona", "covid"),
    ("pandemic", "pandemic"),
    ("pandemi", "pandemic"),
];
