//! Text transforms applied to cue text before layout.

use super::emoji;
use super::style::CaptionStyle;

/// Apply emoji augmentation, then uppercase, as configured.
pub fn prepare(text: &str, style: &CaptionStyle) -> String {
    let mut out = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if style.emoji_augmentation {
        out = emoji::augment(&out);
    }
    if style.uppercase {
        out = out.to_uppercase();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_newlines() {
        let style = CaptionStyle::default();
        assert_eq!(prepare("two\nlines  here", &style), "two lines here");
    }

    #[test]
    fn uppercase_and_emoji() {
        let style = CaptionStyle {
            uppercase: true,
            emoji_augmentation: true,
            ..Default::default()
        };
        assert_eq!(prepare("the pool", &style), "THE POOL\u{1F3CA}");
    }
}
