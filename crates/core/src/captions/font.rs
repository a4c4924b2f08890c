//! Glyph sources: font loading, fallback stacks, and on-disk lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdue::{Font, FontSettings};

use super::CaptionError;

/// Vertical metrics of a font at a given pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from baseline to the top of tall glyphs (positive).
    pub ascent: f32,
    /// Distance from baseline to the bottom of descenders (negative).
    pub descent: f32,
}

/// A rasterized glyph. `coverage` is `width * height` bytes, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    /// Horizontal offset from the pen position to the bitmap's left edge.
    pub xmin: i32,
    /// Offset from the baseline to the bitmap's bottom edge (up is positive).
    pub ymin: i32,
    pub coverage: Vec<u8>,
}

/// Anything that can measure and rasterize characters.
pub trait GlyphSource: Send + Sync {
    fn has_glyph(&self, ch: char) -> bool;
    fn advance(&self, ch: char, px: f32) -> f32;
    fn line_metrics(&self, px: f32) -> LineMetrics;
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap;

    /// Width of `text` laid out on one line.
    fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, px)).sum()
    }
}

// ---------------------------------------------------------------------------
// fontdue
// ---------------------------------------------------------------------------

/// A TrueType/OpenType font rasterized with fontdue.
pub struct FontdueGlyphs {
    font: Font,
}

impl FontdueGlyphs {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CaptionError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| CaptionError::Font(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> Result<Self, CaptionError> {
        let bytes = std::fs::read(path)?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| CaptionError::Font(format!("{}: {e}", path.display())))?;
        Ok(Self { font })
    }
}

impl GlyphSource for FontdueGlyphs {
    fn has_glyph(&self, ch: char) -> bool {
        ch.is_whitespace() || self.font.lookup_glyph_index(ch) != 0
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.font.metrics(ch, px).advance_width
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        match self.font.horizontal_line_metrics(px) {
            Some(m) => LineMetrics {
                ascent: m.ascent,
                descent: m.descent,
            },
            None => LineMetrics {
                ascent: px * 0.8,
                descent: -px * 0.2,
            },
        }
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            coverage,
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback stack
// ---------------------------------------------------------------------------

/// Ordered list of glyph sources. Each character is served by the first
/// source that has it; characters no source has are skipped.
#[derive(Clone)]
pub struct FontStack {
    sources: Vec<Arc<dyn GlyphSource>>,
}

impl FontStack {
    pub fn new(primary: Arc<dyn GlyphSource>) -> Self {
        Self {
            sources: vec![primary],
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn GlyphSource>) -> Self {
        self.sources.push(fallback);
        self
    }

    fn source_for(&self, ch: char) -> Option<&Arc<dyn GlyphSource>> {
        self.sources.iter().find(|s| s.has_glyph(ch))
    }
}

impl GlyphSource for FontStack {
    fn has_glyph(&self, ch: char) -> bool {
        self.source_for(ch).is_some()
    }

    fn advance(&self, ch: char, px: f32) -> f32 {
        self.source_for(ch).map_or(0.0, |s| s.advance(ch, px))
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        self.sources[0].line_metrics(px)
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        match self.source_for(ch) {
            Some(s) => s.rasterize(ch, px),
            None => GlyphBitmap {
                width: 0,
                height: 0,
                xmin: 0,
                ymin: 0,
                coverage: Vec::new(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Font directory
// ---------------------------------------------------------------------------

/// Emoji font file looked up as the last fallback, if present.
pub const EMOJI_FONT_FILE: &str = "NotoEmoji-Regular.ttf";

/// Weight at and above which the bold face is preferred.
const BOLD_WEIGHT: u16 = 600;

/// Directory of `{Family}-{Face}.ttf` font files.
#[derive(Debug, Clone)]
pub struct FontDirectory {
    root: PathBuf,
}

impl FontDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Candidate files for a family and weight, most specific first. Empty
    /// when the family name contains anything but ASCII letters, digits,
    /// `_`, `-` and spaces.
    fn candidates(&self, family: &str, weight: u16) -> Vec<PathBuf> {
        let stem: String = family.chars().filter(|c| !c.is_whitespace()).collect();
        if stem.is_empty() || !stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            tracing::warn!(family, "Rejected caption font family name");
            return Vec::new();
        }
        let faces: &[&str] = if weight >= BOLD_WEIGHT {
            &["Bold", "SemiBold", "Regular"]
        } else {
            &["Regular", "Medium"]
        };
        let mut paths = Vec::new();
        for face in faces {
            for ext in ["ttf", "otf"] {
                paths.push(self.root.join(format!("{stem}-{face}.{ext}")));
            }
        }
        paths
    }

    /// Locate the font file for `family` at `weight`.
    pub fn resolve(&self, family: &str, weight: u16) -> Result<PathBuf, CaptionError> {
        self.candidates(family, weight)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                CaptionError::Font(format!(
                    "no font file for family '{family}' (weight {weight}) in {}",
                    self.root.display()
                ))
            })
    }

    /// Load the family as the primary font, with the emoji font as fallback
    /// when it exists.
    pub fn load_stack(&self, family: &str, weight: u16) -> Result<FontStack, CaptionError> {
        let path = self.resolve(family, weight)?;
        tracing::debug!(family, weight, path = %path.display(), "Loading caption font");
        let mut stack = FontStack::new(Arc::new(FontdueGlyphs::from_path(&path)?));

        let emoji = self.root.join(EMOJI_FONT_FILE);
        if emoji.is_file() {
            stack = stack.with_fallback(Arc::new(FontdueGlyphs::from_path(&emoji)?));
        }
        Ok(stack)
    }
}

// ---------------------------------------------------------------------------
// Test glyphs
// ---------------------------------------------------------------------------

/// Deterministic glyph source that draws every non-space character as a
/// solid block. Used where real font files are unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockGlyphs;

impl GlyphSource for BlockGlyphs {
    fn has_glyph(&self, ch: char) -> bool {
        ch.is_ascii() || ch.is_alphanumeric()
    }

    fn advance(&self, _ch: char, px: f32) -> f32 {
        px / 2.0
    }

    fn line_metrics(&self, px: f32) -> LineMetrics {
        LineMetrics {
            ascent: px * 0.8,
            descent: -px * 0.2,
        }
    }

    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        if ch.is_whitespace() {
            return GlyphBitmap {
                width: 0,
                height: 0,
                xmin: 0,
                ymin: 0,
                coverage: Vec::new(),
            };
        }
        let width = (px * 0.4).round().max(1.0) as usize;
        let height = (px * 0.7).round().max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: (px * 0.05).round() as i32,
            ymin: 0,
            coverage: vec![255; width * height],
        }
    }
}
