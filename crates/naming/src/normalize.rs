//! Word canonicalization for duplicate detection.
//!
//! The canonical ("normal") form of a word is only ever used as a set key to
//! decide whether two words mean the same thing. The surface form is what ends
//! up in a filename.

use crate::consts::{NON_WORD, WORD_VARIANTS};

/// Lowercases a token and strips every non-word character.
///
/// ```
/// assert_eq!(picname_naming::clean("Hello,"), "hello");
/// assert_eq!(picname_naming::clean("#COVID-19"), "covid19");
/// ```
pub fn clean(token: &str) -> String {
    NON_WORD.replace_all(&token.to_lowercase(), "").into_owned()
}

/// Returns the normal form of a token: [cleaned](clean), collapsed through the
/// variant table, and with a single trailing `s` removed as a naive plural fold.
///
/// ```
/// use picname_naming::canonicalize;
/// assert_eq!(canonicalize("Vaccines"), canonicalize("VACCIN"));
/// assert_eq!(canonicalize("Coronavirus"), "covid");
/// ```
pub fn canonicalize(token: &str) -> String {
    fold(&clean(token))
}

/// Variant lookup plus plural folding on an already-cleaned token.
pub(crate) fn fold(cleaned: &str) -> String {
    let base = WORD_VARIANTS
        .iter()
        .find_map(|(variant, canonical)| (*variant == cleaned).then_some(*canonical))
        .unwrap_or(cleaned);
    match base.strip_suffix('s') {
        Some(singular) if base.len() > 1 => singular.to_string(),
        _ => base.to_string(),
    }
}

/// Removes every word whose normal form has already been seen, keeping the
/// first occurrence. Words that clean down to nothing (pure punctuation) are
/// dropped as well.
pub fn dedupe_words(text: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    text.split_whitespace()
        .filter(|word| {
            let normal = canonicalize(word);
            !normal.is_empty() && seen.insert(normal)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Vaccines", "vaccine")]
    #[case("vaccine", "vaccine")]
    #[case("VACCIN", "vaccine")]
    #[case("vaccination", "vaccine")]
    #[case("COVID-19", "covid")]
    #[case("corona", "covid")]
    #[case("Pandemi", "pandemic")]
    #[case("cats", "cat")]
    #[case("s", "s")]
    #[case("glass", "glas")]
    #[case("!!!", "")]
    fn test_canonicalize(#[case] token: &str, #[case] expected: &str) {
        assert_eq!(canonicalize(token), expected);
    }

    #[test]
    fn test_plural_and_variant_folding_agree() {
        assert_eq!(canonicalize("Vaccines"), canonicalize("vaccine"));
        assert_eq!(canonicalize("vaccine"), canonicalize("VACCIN"));
    }

    #[test]
    fn test_dedupe_keeps_first_surface_form() {
        assert_eq!(dedupe_words("Covid vaccine COVID19 Vaccines cats cat"), "Covid vaccine cats");
    }

    #[test]
    fn test_dedupe_drops_punctuation_only_words() {
        assert_eq!(dedupe_words("sunset -- beach ..."), "sunset beach");
    }

    #[test]
    fn test_dedupe_empty() {
        assert_eq!(dedupe_words("   "), "");
    }
}
