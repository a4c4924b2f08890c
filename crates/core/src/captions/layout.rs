//! Line wrapping and glyph placement.
//!
//! Wrapping happens once per cue at full size; animated frames reuse the
//! same line breaks at a smaller scale so text never reflows mid-animation.

use super::font::GlyphSource;

/// Fraction of frame width available to a caption line.
pub const WRAP_WIDTH_FRACTION: f32 = 0.85;

/// Frame width at which `font_size` is specified.
pub const REFERENCE_WIDTH: f32 = 540.0;

/// Line height as a multiple of the pixel size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Pixel size for a style font size on a frame of `frame_width`.
pub fn font_px(font_size: f32, frame_width: u32, scale: f32) -> f32 {
    font_size * (frame_width as f32 / REFERENCE_WIDTH) * scale
}

/// Words of a cue grouped into lines. Line entries are indices into `words`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    pub words: Vec<String>,
    pub lines: Vec<Vec<usize>>,
}

impl TextLayout {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Greedy word wrap to `max_width` pixels at size `px`, keeping at most
/// `max_lines` lines. A word wider than `max_width` gets a line of its own.
pub fn layout_text(
    text: &str,
    glyphs: &dyn GlyphSource,
    px: f32,
    max_width: f32,
    max_lines: u32,
) -> TextLayout {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    let space = glyphs.advance(' ', px);

    let mut lines: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_width = 0.0;

    for (i, word) in words.iter().enumerate() {
        let width = glyphs.measure(word, px);
        if !current.is_empty() && current_width + space + width > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if !current.is_empty() {
            current_width += space;
        }
        current_width += width;
        current.push(i);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(max_lines.max(1) as usize);
    TextLayout { words, lines }
}

/// One character positioned on the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedChar {
    pub ch: char,
    /// Pen x position.
    pub x: f32,
    /// Baseline y position.
    pub baseline: f32,
    /// Index of the word this character belongs to.
    pub word: usize,
}

/// Axis-aligned rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Bounds {
    pub fn pad(self, by: f32) -> Self {
        Self {
            x0: self.x0 - by,
            y0: self.y0 - by,
            x1: self.x1 + by,
            y1: self.y1 + by,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A layout positioned on a frame at a given pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub chars: Vec<PlacedChar>,
    /// Union of the line boxes.
    pub bounds: Bounds,
    pub px: f32,
}

/// Place `layout` centred horizontally, with the block's vertical centre at
/// `anchor` (fraction of frame height), clamped inside the frame.
pub fn place(
    layout: &TextLayout,
    glyphs: &dyn GlyphSource,
    px: f32,
    frame_width: u32,
    frame_height: u32,
    anchor: f32,
) -> PlacedText {
    let line_height = px * LINE_HEIGHT_FACTOR;
    let metrics = glyphs.line_metrics(px);
    let glyph_height = metrics.ascent - metrics.descent;
    let block_height = line_height * layout.lines.len() as f32;

    let max_top = (frame_height as f32 - block_height).max(0.0);
    let top = (frame_height as f32 * anchor - block_height / 2.0).clamp(0.0, max_top);

    let space = glyphs.advance(' ', px);
    let mut chars = Vec::new();
    let mut bounds = Bounds {
        x0: f32::MAX,
        y0: top,
        x1: f32::MIN,
        y1: top + block_height,
    };

    for (row, line) in layout.lines.iter().enumerate() {
        let widths: Vec<f32> = line
            .iter()
            .map(|&w| glyphs.measure(&layout.words[w], px))
            .collect();
        let line_width = widths.iter().sum::<f32>() + space * line.len().saturating_sub(1) as f32;
        let left = (frame_width as f32 - line_width) / 2.0;
        let baseline =
            top + row as f32 * line_height + (line_height - glyph_height) / 2.0 + metrics.ascent;

        bounds.x0 = bounds.x0.min(left);
        bounds.x1 = bounds.x1.max(left + line_width);

        let mut pen = left;
        for (k, &w) in line.iter().enumerate() {
            if k > 0 {
                pen += space;
            }
            for ch in layout.words[w].chars() {
                chars.push(PlacedChar {
                    ch,
                    x: pen,
                    baseline,
                    word: w,
                });
                pen += glyphs.advance(ch, px);
            }
        }
    }

    if layout.lines.is_empty() {
        bounds.x0 = frame_width as f32 / 2.0;
        bounds.x1 = bounds.x0;
    }

    PlacedText { chars, bounds, px }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::font::BlockGlyphs;

    #[test]
    fn px_scales_with_frame_width() {
        assert_eq!(font_px(34.0, 1080, 1.0), 68.0);
        assert_eq!(font_px(34.0, 540, 0.5), 17.0);
    }

    #[test]
    fn wraps_greedily() {
        // BlockGlyphs: every char advances px / 2 = 5 at px 10.
        let layout = layout_text("aa bb cc dd", &BlockGlyphs, 10.0, 40.0, 5);
        // "aa bb" = 10 + 5 + 10 = 25; adding " cc" = 40 fits; " dd" would be 55.
        assert_eq!(layout.lines, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn drops_lines_beyond_max() {
        let layout = layout_text("aaaa bbbb cccc", &BlockGlyphs, 10.0, 20.0, 2);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.words.len(), 3);
    }

    #[test]
    fn long_word_gets_own_line() {
        let layout = layout_text("a verylongword b", &BlockGlyphs, 10.0, 20.0, 5);
        assert_eq!(layout.lines, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn placement_centres_and_anchors() {
        let layout = layout_text("abcd", &BlockGlyphs, 10.0, 100.0, 2);
        let placed = place(&layout, &BlockGlyphs, 10.0, 100, 200, 0.5);
        // Width 20, centred on 100 px frame.
        assert_eq!(placed.bounds.x0, 40.0);
        assert_eq!(placed.bounds.x1, 60.0);
        // One 12 px line centred on y = 100.
        assert_eq!(placed.bounds.y0, 94.0);
        assert_eq!(placed.bounds.y1, 106.0);
        assert_eq!(placed.chars.len(), 4);
        assert_eq!(placed.chars[1].x, 45.0);
    }

    #[test]
    fn placement_clamped_inside_frame() {
        let layout = layout_text("a b c d", &BlockGlyphs, 10.0, 5.0, 4);
        let placed = place(&layout, &BlockGlyphs, 10.0, 100, 60, 0.95);
        assert!(placed.bounds.y1 <= 60.0);
    }
}
