//! SRT parsing and formatting.
//!
//! Parsing is lenient about the things speech-to-text providers and text
//! models get wrong (CRLF line endings, byte-order marks, missing index
//! lines, `.` as the millisecond separator) and strict about the things
//! rendering depends on: every returned cue has `start < end`, cues are
//! sorted, and no two cues overlap. Overlaps are resolved by ending the
//! earlier cue where the later one begins.
//!
//! `parse(format(parse(x))) == parse(x)` for any input.

use crate::capabilities::{Transcript, TranscriptSegment};

use super::{CaptionCue, WordTiming};

/// Parse SRT text into normalised cues, re-indexed from 1.
pub fn parse(input: &str) -> Vec<CaptionCue> {
    let normalized = input
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in normalized.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if let Some(cue) = parse_block(&block) {
                cues.push(cue);
            }
            block.clear();
        } else {
            block.push(line);
        }
    }

    normalize(cues)
}

fn parse_block(lines: &[&str]) -> Option<CaptionCue> {
    let timing_at = lines.iter().take(2).position(|l| l.contains("-->"))?;
    let (start, end) = parse_timing_line(lines[timing_at])?;
    let text = lines[timing_at + 1..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return None;
    }
    Some(CaptionCue {
        index: 0,
        start_time: start,
        end_time: end,
        text,
        words: None,
    })
}

fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once("-->")?;
    let start = parse_timestamp(left.trim())?;
    // Anything after the end timestamp (position settings) is ignored.
    let end = parse_timestamp(right.split_whitespace().next()?)?;
    Some((start, end))
}

/// Parse `HH:MM:SS,mmm` (also `MM:SS,mmm` and `.` separators) to seconds.
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let (clock, fraction) = match value.find([',', '.']) {
        Some(at) => (&value[..at], &value[at + 1..]),
        None => (value, ""),
    };

    let parts = clock
        .split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let whole_seconds = match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        _ => return None,
    };

    let millis = if fraction.is_empty() {
        0
    } else {
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // Interpret as a decimal fraction, rounded to milliseconds.
        let digits: String = fraction.chars().chain("000".chars()).take(4).collect();
        let tenths_of_ms: u64 = digits.parse().ok()?;
        (tenths_of_ms + 5) / 10
    };

    Some((whole_seconds * 1000 + millis) as f64 / 1000.0)
}

/// Format seconds as an SRT timestamp, rounded to the millisecond.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// Render cues as SRT text.
pub fn format(cues: &[CaptionCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start_time),
            format_timestamp(cue.end_time),
            cue.text
        ));
    }
    out
}

/// Sort, drop empty or inverted cues, clamp overlaps, and re-index.
fn normalize(mut cues: Vec<CaptionCue>) -> Vec<CaptionCue> {
    cues.retain(|c| c.start_time < c.end_time);
    cues.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut out: Vec<CaptionCue> = Vec::with_capacity(cues.len());
    for cue in cues {
        if let Some(prev) = out.last_mut() {
            if prev.end_time > cue.start_time {
                prev.end_time = cue.start_time;
                if prev.end_time <= prev.start_time {
                    out.pop();
                }
            }
        }
        out.push(cue);
    }

    for (i, cue) in out.iter_mut().enumerate() {
        cue.index = i as u32 + 1;
    }
    out
}

/// Build cues directly from timed segments, keeping their word timings.
pub fn cues_from_segments(segments: &[TranscriptSegment]) -> Vec<CaptionCue> {
    let cues = segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| CaptionCue {
            index: 0,
            start_time: s.start,
            end_time: s.end,
            text: s.text.trim().to_string(),
            words: (!s.words.is_empty()).then(|| s.words.clone()),
        })
        .collect();
    normalize(cues)
}

impl Transcript {
    /// SRT text for the correction step.
    pub fn to_srt(&self) -> String {
        match self {
            Self::Srt(text) => text.clone(),
            Self::Segments(segments) => format(&cues_from_segments(segments)),
        }
    }

    /// All word timings the transcript carries, in order.
    pub fn words(&self) -> Vec<WordTiming> {
        match self {
            Self::Srt(_) => Vec::new(),
            Self::Segments(segments) => segments.iter().flat_map(|s| s.words.clone()).collect(),
        }
    }
}

/// Attach word timings to each cue whose word count matches the words
/// falling inside its window. Cues that don't match keep `words = None`.
pub fn attach_word_timings(cues: &mut [CaptionCue], words: &[WordTiming]) {
    if words.is_empty() {
        return;
    }
    for cue in cues.iter_mut() {
        let inside: Vec<WordTiming> = words
            .iter()
            .filter(|w| {
                let mid = (w.start + w.end) / 2.0;
                mid >= cue.start_time && mid < cue.end_time
            })
            .cloned()
            .collect();
        if !inside.is_empty() && inside.len() == cue.text.split_whitespace().count() {
            cue.words = Some(inside);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:01,500\nWelcome home\n\n2\n00:00:01,500 --> 00:00:03,250\nto this sunny loft\n";

    #[test]
    fn parses_basic_srt() {
        let cues = parse(SAMPLE);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Welcome home");
        assert_eq!(cues[1].start_time, 1.5);
        assert_eq!(cues[1].end_time, 3.25);
        assert_eq!(cues[1].index, 2);
    }

    #[test]
    fn tolerates_crlf_bom_and_dot_separator() {
        let input = "\u{feff}1\r\n00:00:00.000 --> 00:00:01.200\r\nHello\r\n\r\n";
        let cues = parse(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].end_time, 1.2);
        assert_eq!(cues[0].text, "Hello");
    }

    #[test]
    fn tolerates_missing_index() {
        let cues = parse("00:00:02,000 --> 00:00:03,000\nNo index here\n");
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].index, 1);
    }

    #[test]
    fn keeps_multiline_text() {
        let cues = parse("1\n00:00:00,000 --> 00:00:02,000\nline one\nline two\n");
        assert_eq!(cues[0].text, "line one\nline two");
    }

    #[test]
    fn drops_inverted_and_empty_cues() {
        let input = "1\n00:00:03,000 --> 00:00:02,000\nbackwards\n\n2\n00:00:04,000 --> 00:00:05,000\n\n3\n00:00:05,000 --> 00:00:06,000\nok\n";
        let cues = parse(input);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "ok");
    }

    #[test]
    fn clamps_overlaps() {
        let input = "1\n00:00:00,000 --> 00:00:02,000\nfirst\n\n2\n00:00:01,000 --> 00:00:03,000\nsecond\n";
        let cues = parse(input);
        assert_eq!(cues[0].end_time, 1.0);
        assert_eq!(cues[1].start_time, 1.0);
        for pair in cues.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
    }

    #[test]
    fn sorts_out_of_order_cues() {
        let input = "2\n00:00:05,000 --> 00:00:06,000\nlater\n\n1\n00:00:01,000 --> 00:00:02,000\nearlier\n";
        let cues = parse(input);
        assert_eq!(cues[0].text, "earlier");
        assert_eq!(cues[0].index, 1);
    }

    #[test]
    fn parse_is_idempotent() {
        let messy = "\u{feff}3\r\n00:00:00.1 --> 00:00:02,345\r\nA\r\n\r\n00:00:02,000 --> 00:00:04,000\r\nB\r\n\r\n1\r\n00:00:09,000 --> 00:00:08,000\r\nC\r\n";
        let once = parse(messy);
        let twice = parse(&format(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn timestamp_round_trip() {
        assert_eq!(parse_timestamp("01:02:03,004"), Some(3723.004));
        assert_eq!(parse_timestamp("02:03.5"), Some(123.5));
        assert_eq!(format_timestamp(3723.004), "01:02:03,004");
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn segments_become_cues() {
        let transcript = Transcript::Segments(vec![TranscriptSegment {
            start: 0.0,
            end: 1.0,
            text: " Hi there ".into(),
            words: vec![],
        }]);
        assert_eq!(transcript.to_srt(), "1\n00:00:00,000 --> 00:00:01,000\nHi there\n\n");
    }

    #[test]
    fn word_timings_attach_only_on_count_match() {
        let mut cues = parse(SAMPLE);
        let words = vec![
            WordTiming { text: "Welcome".into(), start: 0.0, end: 0.6 },
            WordTiming { text: "home".into(), start: 0.6, end: 1.4 },
            WordTiming { text: "to".into(), start: 1.5, end: 1.7 },
        ];
        attach_word_timings(&mut cues, &words);
        assert_eq!(cues[0].words.as_ref().map(Vec::len), Some(2));
        assert!(cues[1].words.is_none());
    }
}
