//! Word-level timing for single-word mode and karaoke highlighting.

use super::{CaptionCue, WordTiming};

/// Tolerance when checking that word timings sit inside their cue.
const EPSILON: f64 = 1e-3;

/// Time window of each whitespace-separated word of `cue`, as
/// `(start, end)` pairs that tile the cue exactly: the first starts at the
/// cue start, each ends where the next begins, the last ends at the cue end.
///
/// Provider word timings are used when they are consistent with the cue;
/// otherwise the cue is divided evenly.
pub fn word_windows(cue: &CaptionCue) -> Vec<(f64, f64)> {
    let count = cue.text.split_whitespace().count();
    if count == 0 {
        return Vec::new();
    }

    let starts: Vec<f64> = match cue.words.as_deref() {
        Some(words) if timings_consistent(cue, words, count) => {
            let mut starts: Vec<f64> = words.iter().map(|w| w.start).collect();
            starts[0] = cue.start_time;
            starts
        }
        _ => {
            let step = cue.duration() / count as f64;
            (0..count).map(|i| cue.start_time + step * i as f64).collect()
        }
    };

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(cue.end_time);
            (start, end)
        })
        .collect()
}

/// Timings are usable when there is one per word, they are ordered with
/// strictly increasing starts, and they stay within the cue.
fn timings_consistent(cue: &CaptionCue, words: &[WordTiming], count: usize) -> bool {
    if words.len() != count {
        return false;
    }
    let within = words.iter().all(|w| {
        w.start >= cue.start_time - EPSILON && w.end <= cue.end_time + EPSILON && w.start <= w.end
    });
    let ordered = words.windows(2).all(|pair| pair[0].start < pair[1].start);
    // Every word after the first must start strictly inside the cue so no
    // window collapses once the first start is pinned to the cue start.
    let interior = words
        .iter()
        .skip(1)
        .all(|w| w.start > cue.start_time && w.start < cue.end_time);
    within && ordered && interior
}

/// Break a cue into one sub-cue per word. Sub-cue durations sum to the
/// original cue's duration.
pub fn split_words(cue: &CaptionCue) -> Vec<CaptionCue> {
    cue.text
        .split_whitespace()
        .zip(word_windows(cue))
        .filter(|(_, (start, end))| end > start)
        .map(|(word, (start, end))| CaptionCue {
            index: cue.index,
            start_time: start,
            end_time: end,
            text: word.to_string(),
            words: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(text: &str, start: f64, end: f64) -> CaptionCue {
        CaptionCue {
            index: 1,
            start_time: start,
            end_time: end,
            text: text.into(),
            words: None,
        }
    }

    fn word(text: &str, start: f64, end: f64) -> WordTiming {
        WordTiming {
            text: text.into(),
            start,
            end,
        }
    }

    #[test]
    fn even_split_sums_to_cue_duration() {
        let c = cue("one two three", 1.0, 2.0);
        let parts = split_words(&c);
        assert_eq!(parts.len(), 3);
        let total: f64 = parts.iter().map(CaptionCue::duration).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(parts[0].start_time, 1.0);
        assert_eq!(parts[2].end_time, 2.0);
    }

    #[test]
    fn uses_consistent_word_timings() {
        let mut c = cue("big bright loft", 0.0, 3.0);
        c.words = Some(vec![
            word("big", 0.2, 0.5),
            word("bright", 0.5, 1.8),
            word("loft", 1.8, 2.7),
        ]);
        let parts = split_words(&c);
        assert_eq!(parts[0].start_time, 0.0);
        assert_eq!(parts[0].end_time, 0.5);
        assert_eq!(parts[1].end_time, 1.8);
        assert_eq!(parts[2].end_time, 3.0);
        let total: f64 = parts.iter().map(CaptionCue::duration).sum();
        assert!((total - 3.0).abs() < 1e-9);
    }

    #[test]
    fn inconsistent_timings_fall_back_to_even_split() {
        let mut c = cue("a b", 0.0, 2.0);
        c.words = Some(vec![word("a", 1.5, 1.8), word("b", 0.1, 0.4)]);
        let windows = word_windows(&c);
        assert_eq!(windows, vec![(0.0, 1.0), (1.0, 2.0)]);
    }

    #[test]
    fn mismatched_count_falls_back() {
        let mut c = cue("a b c d", 0.0, 4.0);
        c.words = Some(vec![word("a", 0.0, 1.0)]);
        assert_eq!(word_windows(&c)[1], (1.0, 2.0));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(split_words(&cue("   ", 0.0, 1.0)).is_empty());
    }
}
