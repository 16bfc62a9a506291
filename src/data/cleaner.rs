// ============================================================
// Layer 4 — Text Cleaner
// ============================================================
// Normalises raw review / tweet text before tokenisation.
//
// Cleaning steps (applied in order — order matters):
//   1. Strip HTML-like tags       "<br />"          → " "
//   2. Lowercase
//   3. Strip URLs                 "https://x.co/a"  → " "
//   4. Strip @mentions            "@bob"            → " "
//   5. Keep hashtag words         "#great"          → "great"
//   6. Drop everything outside [a-z0-9 ] (whitespace separates words)
//   7. Drop English stopwords
//   8. Re-join with single spaces
//
// The output only contains [a-z0-9 ] and cleaning it a second
// time returns it unchanged: none of the patterns in steps 1-5
// can match text without '<', ':', '.', '@' or '#'.
//
// Reference: Rust Book §8 (Strings in Rust)
//            regex crate documentation

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::{ClfError, Result};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url regex"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention regex"));

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag regex"));

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("charset regex"));

/// NLTK English stopwords. Contracted forms ("don't", "you're", ...)
/// are omitted: the apostrophe is gone before this filter runs.
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
    "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of",
    "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then",
    "once", "here", "there", "when", "where", "why", "how", "all", "any", "both",
    "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma",
    "mightn", "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won",
    "wouldn",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Stateless text normaliser. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCleaner;

impl TextCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw text string for downstream tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let text = TAG_RE.replace_all(text, " ");
        let text = text.to_lowercase();
        let text = URL_RE.replace_all(&text, " ");
        let text = MENTION_RE.replace_all(&text, " ");
        let text = HASHTAG_RE.replace_all(&text, "$1");
        let text = NON_ALNUM_RE.replace_all(&text, "");

        text.split_whitespace()
            .filter(|w| !Self::is_stopword(w))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Clean raw bytes, rejecting anything that is not UTF-8 text.
    pub fn clean_bytes(&self, raw: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(raw).map_err(|e| {
            ClfError::InputType(format!("expected UTF-8 text: {e}"))
        })?;
        Ok(self.clean(text))
    }

    pub fn is_stopword(word: &str) -> bool {
        STOPWORD_SET.contains(word)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mixed_tweet() {
        let c   = TextCleaner::new();
        let out = c.clean("Check THIS out! http://x.co #Great @bob");
        let tokens: Vec<&str> = out.split(' ').collect();

        assert!(tokens.contains(&"great"));
        assert!(tokens.contains(&"check"));
        for gone in ["this", "out", "bob", "http", "x", "co", "xco"] {
            assert!(!tokens.contains(&gone), "'{gone}' should be removed");
        }
        assert_eq!(out, "check great");
    }

    #[test]
    fn test_html_tags_split_words() {
        let c = TextCleaner::new();
        assert_eq!(c.clean("Loved it.<br /><br />Brilliant acting"), "loved brilliant acting");
    }

    #[test]
    fn test_www_urls_and_punctuation() {
        let c = TextCleaner::new();
        assert_eq!(c.clean("See www.imdb.com/title NOW!!!"), "see");
        assert_eq!(c.clean("10/10, would watch again"), "1010 would watch");
    }

    #[test]
    fn test_empty_and_all_stopwords() {
        let c = TextCleaner::new();
        assert_eq!(c.clean(""), "");
        assert_eq!(c.clean("  The and OR   of  "), "");
    }

    #[test]
    fn test_non_ascii_letters_are_dropped() {
        let c = TextCleaner::new();
        assert_eq!(c.clean("İstanbul café Ünïcode"), "istanbul caf ncode");
    }

    #[test]
    fn test_non_utf8_is_input_type_error() {
        let c = TextCleaner::new();
        assert!(matches!(
            c.clean_bytes(&[0x66, 0xff, 0xfe]),
            Err(ClfError::InputType(_))
        ));
        assert_eq!(c.clean_bytes(b"Great #Movie").unwrap(), "great movie");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_output_charset_and_no_stopwords(s in "\\PC{0,120}") {
            let out = TextCleaner::new().clean(&s);
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
            prop_assert!(out.split(' ').filter(|w| !w.is_empty()).all(|w| !TextCleaner::is_stopword(w)));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        #[test]
        fn prop_cleaning_is_idempotent(s in "\\PC{0,120}") {
            let c    = TextCleaner::new();
            let once = c.clean(&s);
            prop_assert_eq!(c.clean(&once), once);
        }
    }
}
