//! Keyword-driven emoji augmentation for caption text.
//!
//! The emoji is appended directly to the matched word (no space) so the
//! whitespace word count of a cue, which word timings are matched against,
//! is unchanged.

use std::sync::LazyLock;

use regex::Regex;

/// Keyword patterns (case-insensitive, whole word) and the emoji they earn.
const KEYWORDS: &[(&str, &str)] = &[
    (r"pools?|swimming", "\u{1F3CA}"),
    (r"kitchens?", "\u{1F373}"),
    (r"bedrooms?|beds?", "\u{1F6CF}\u{FE0F}"),
    (r"bathrooms?|baths?", "\u{1F6C1}"),
    (r"views?|panoramic", "\u{1F304}"),
    (r"gardens?|garden's|backyard", "\u{1F333}"),
    (r"beach|seaside|ocean", "\u{1F3D6}\u{FE0F}"),
    (r"sunny|sunlight|sunset", "\u{2600}\u{FE0F}"),
    (r"garage|parking", "\u{1F697}"),
    (r"terrace|balcony|patio", "\u{1FA74}"),
    (r"fireplace", "\u{1F525}"),
    (r"gym|fitness", "\u{1F4AA}"),
    (r"home|house|apartment|flat|loft", "\u{1F3E1}"),
    (r"luxury|luxurious|stunning", "\u{2728}"),
    (r"price|priced|offer", "\u{1F4B0}"),
    (r"visit|viewing|tour", "\u{1F4C5}"),
];

static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    KEYWORDS
        .iter()
        .map(|(pattern, emoji)| {
            let re = Regex::new(&format!(r"(?i)\b(?:{pattern})\b")).expect("valid keyword regex");
            (re, *emoji)
        })
        .collect()
});

/// Append the mapped emoji after every keyword occurrence.
///
/// At most one emoji is added per word: once a word has matched a rule,
/// later rules do not match it again.
pub fn augment(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for (i, token) in text.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&augment_token(token));
    }
    out
}

fn augment_token(token: &str) -> String {
    for (re, emoji) in RULES.iter() {
        if let Some(m) = re.find(token) {
            let mut augmented = String::with_capacity(token.len() + emoji.len());
            augmented.push_str(&token[..m.end()]);
            augmented.push_str(emoji);
            augmented.push_str(&token[m.end()..]);
            return augmented;
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_after_keyword() {
        assert_eq!(augment("a private pool"), "a private pool\u{1F3CA}");
    }

    #[test]
    fn case_insensitive_and_keeps_punctuation() {
        assert_eq!(augment("Huge KITCHEN, really"), "Huge KITCHEN\u{1F373}, really");
    }

    #[test]
    fn whole_words_only() {
        assert_eq!(augment("spooling"), "spooling");
    }

    #[test]
    fn preserves_word_count() {
        let text = "three bedrooms with a sea view and a garden";
        let augmented = augment(text);
        assert_eq!(
            augmented.split_whitespace().count(),
            text.split_whitespace().count()
        );
        assert!(augmented.contains("view\u{1F304}"));
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(augment("call us now"), "call us now");
    }
}
