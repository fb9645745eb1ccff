//! Keyword fallback for founder mentions.
//!
//! Used only for pages where the semantic extractor produced no founders.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static FOUNDER_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:CEO|CTO|founder|founded)\b").expect("valid regex")
});

/// Return every sentence of `text` that mentions CEO, CTO, founder or founded
/// as a whole word (case-insensitive), trimmed and deduplicated.
pub fn extract_founder_sentences(text: &str) -> BTreeSet<String> {
    split_sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && FOUNDER_KEYWORDS.is_match(s))
        .map(String::from)
        .collect()
}

/// Split after `.`, `!` or `?` when followed by whitespace.
/// The punctuation stays with the sentence it ends.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            sentences.push(&text[start..i]);
            start = i;
        }
        prev = Some(c);
    }
    sentences.push(&text[start..]);

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_founder_sentence() {
        let text = "Jane Doe is the founder of Acme. Acme sells widgets. Contact us today.";
        let found = extract_founder_sentences(text);
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["Jane Doe is the founder of Acme."]
        );
    }

    #[test]
    fn matches_all_keywords_case_insensitively() {
        let text = "Our ceo is Max Mustermann! Who is the CTO? Founded in 2019 by two friends. \
                    We like music.";
        let found = extract_founder_sentences(text);
        assert_eq!(found.len(), 3);
        assert!(found.contains("Our ceo is Max Mustermann!"));
        assert!(found.contains("Who is the CTO?"));
        assert!(found.contains("Founded in 2019 by two friends."));
    }

    #[test]
    fn keywords_must_be_whole_words() {
        let text = "The founders met in Vienna. Our CEOs rotate yearly. Cofounder stories.";
        assert!(extract_founder_sentences(text).is_empty());
    }

    #[test]
    fn splits_on_any_whitespace_and_trims() {
        let text = "Welcome.\n\n   Anna Berg, founder and CEO.\tThanks!";
        let found = extract_founder_sentences(text);
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["Anna Berg, founder and CEO."]
        );
    }

    #[test]
    fn duplicates_collapse() {
        let text = "Meet our founder. Meet our founder. Meet our founder.";
        assert_eq!(extract_founder_sentences(text).len(), 1);
    }

    #[test]
    fn punctuation_without_whitespace_does_not_split() {
        let text = "Acme.io was founded by Jane Doe.";
        let found = extract_founder_sentences(text);
        assert!(found.contains("Acme.io was founded by Jane Doe."));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_founder_sentences("").is_empty());
        assert!(extract_founder_sentences("   \n ").is_empty());
    }
}
