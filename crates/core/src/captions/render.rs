//! Caption rasterization to transparent PNG frames.
//!
//! Each frame is drawn in four passes over a full-frame RGBA canvas, in
//! this order: rounded background box, stroke, shadow, fill. Stroke and
//! shadow are derived from a coverage mask of the glyphs; fill uses a second
//! mask whose coverage is weighted per word (karaoke dimming).

use std::sync::Arc;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::animation::{plan_frames, FrameSpec, UPCOMING_WORD_OPACITY};
use super::font::{GlyphBitmap, GlyphSource};
use super::layout::{font_px, layout_text, place, Bounds, PlacedText, TextLayout, REFERENCE_WIDTH, WRAP_WIDTH_FRACTION};
use super::style::{CaptionStyle, Palette, Rgba};
use super::{text, timing, CaptionCue, CaptionError, CaptionFrame};

/// Background box padding as a multiple of the pixel size.
const BACKGROUND_PADDING: f32 = 0.35;

/// Renders cues into overlay frames of a fixed size.
#[derive(Clone)]
pub struct CaptionRenderer {
    glyphs: Arc<dyn GlyphSource>,
    width: u32,
    height: u32,
}

impl CaptionRenderer {
    pub fn new(glyphs: Arc<dyn GlyphSource>, width: u32, height: u32) -> Self {
        Self {
            glyphs,
            width,
            height,
        }
    }

    /// Render every frame of one cue. Frames come back in timeline order and
    /// their durations sum to the cue duration.
    pub fn render_cue(
        &self,
        cue: &CaptionCue,
        style: &CaptionStyle,
    ) -> Result<Vec<CaptionFrame>, CaptionError> {
        let style = &style.clamped();
        let prepared = CaptionCue {
            text: text::prepare(&cue.text, style),
            ..cue.clone()
        };
        let units = if style.single_word_mode {
            timing::split_words(&prepared)
        } else {
            vec![prepared]
        };

        let palette = Palette::from_style(style);
        let base_px = font_px(style.font_size, self.width, 1.0);
        let max_width = self.width as f32 * WRAP_WIDTH_FRACTION;

        let mut frames = Vec::new();
        for unit in &units {
            let layout = layout_text(&unit.text, self.glyphs.as_ref(), base_px, max_width, style.max_lines);
            if layout.is_empty() {
                continue;
            }
            for spec in plan_frames(unit, style.animation) {
                let pixels = self.draw(&layout, style, &palette, &spec);
                frames.push(CaptionFrame {
                    image_bytes: encode_png(&pixels, self.width, self.height)?,
                    timestamp: spec.timestamp,
                    duration: spec.duration,
                });
            }
        }

        tracing::trace!(cue = cue.index, frames = frames.len(), "Rendered caption cue");
        Ok(frames)
    }

    /// Draw one frame into a straight-alpha RGBA buffer.
    fn draw(&self, layout: &TextLayout, style: &CaptionStyle, palette: &Palette, spec: &FrameSpec) -> Vec<u8> {
        let px = font_px(style.font_size, self.width, spec.scale);
        let placed = place(
            layout,
            self.glyphs.as_ref(),
            px,
            self.width,
            self.height,
            style.position.anchor(),
        );

        // Style lengths are specified at the reference width, like font size.
        let unit = self.width as f32 / REFERENCE_WIDTH * spec.scale;
        let padding = px * BACKGROUND_PADDING;
        let stroke_radius = style.stroke_width.max(0.0) * unit;
        let blur_radius = style.shadow_blur.max(0.0) * unit;
        let shadow_dx = (style.shadow_offset_x * unit).round() as i32;
        let shadow_dy = (style.shadow_offset_y * unit).round() as i32;

        let margin = padding
            + stroke_radius
            + blur_radius
            + shadow_dx.unsigned_abs().max(shadow_dy.unsigned_abs()) as f32
            + 2.0;
        let region = Region::clip(placed.bounds.pad(margin), self.width, self.height);

        let (shape, fill) = self.glyph_masks(&placed, region, spec);
        let mut canvas = Canvas::new(self.width, self.height);

        if palette.background.is_visible() {
            canvas.fill_rounded_rect(
                placed.bounds.pad(padding),
                padding,
                palette.background.with_alpha(spec.opacity),
            );
        }
        if stroke_radius > 0.0 && palette.stroke.is_visible() {
            canvas.paint(&shape.dilate(stroke_radius), palette.stroke.with_alpha(spec.opacity));
        }
        if palette.shadow.is_visible() && (blur_radius > 0.0 || shadow_dx != 0 || shadow_dy != 0) {
            let shadow = shape.blur(blur_radius).shifted(shadow_dx, shadow_dy);
            canvas.paint(&shadow, palette.shadow.with_alpha(spec.opacity));
        }
        canvas.paint(&fill, palette.fill.with_alpha(spec.opacity));

        canvas.pixels
    }

    fn glyph_masks(&self, placed: &PlacedText, region: Region, spec: &FrameSpec) -> (Mask, Mask) {
        let mut shape = Mask::new(region);
        let mut fill = Mask::new(region);
        for c in &placed.chars {
            if c.ch.is_whitespace() {
                continue;
            }
            let bitmap = self.glyphs.rasterize(c.ch, placed.px);
            if bitmap.width == 0 || bitmap.height == 0 {
                continue;
            }
            let left = (c.x + bitmap.xmin as f32).round() as i32;
            let top = (c.baseline - bitmap.ymin as f32 - bitmap.height as f32).round() as i32;
            let weight = match spec.spoken_words {
                Some(spoken) if c.word >= spoken => UPCOMING_WORD_OPACITY,
                _ => 1.0,
            };
            shape.stamp(&bitmap, left, top, 1.0);
            fill.stamp(&bitmap, left, top, weight);
        }
        (shape, fill)
    }
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptionError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| CaptionError::Encode(e.to_string()))?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Masks
// ---------------------------------------------------------------------------

/// Integer pixel rectangle inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x0: i32,
    y0: i32,
    w: usize,
    h: usize,
}

impl Region {
    fn clip(bounds: Bounds, width: u32, height: u32) -> Self {
        let x0 = bounds.x0.floor().max(0.0) as i32;
        let y0 = bounds.y0.floor().max(0.0) as i32;
        let x1 = (bounds.x1.ceil() as i32).min(width as i32);
        let y1 = (bounds.y1.ceil() as i32).min(height as i32);
        Self {
            x0,
            y0,
            w: (x1 - x0).max(0) as usize,
            h: (y1 - y0).max(0) as usize,
        }
    }
}

/// Per-pixel coverage in 0.0..=1.0 over a region of the frame.
#[derive(Debug, Clone)]
struct Mask {
    region: Region,
    data: Vec<f32>,
}

impl Mask {
    fn new(region: Region) -> Self {
        Self {
            region,
            data: vec![0.0; region.w * region.h],
        }
    }

    fn with_data(&self, data: Vec<f32>) -> Self {
        Self {
            region: self.region,
            data,
        }
    }

    /// Coverage at region-local coordinates; zero outside.
    fn at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.region.w || y as usize >= self.region.h {
            return 0.0;
        }
        self.data[y as usize * self.region.w + x as usize]
    }

    /// Max-combine a glyph bitmap at frame position (`left`, `top`).
    fn stamp(&mut self, bitmap: &GlyphBitmap, left: i32, top: i32, weight: f32) {
        let Region { x0, y0, w, h } = self.region;
        for row in 0..bitmap.height {
            let y = top + row as i32 - y0;
            if y < 0 || y as usize >= h {
                continue;
            }
            for col in 0..bitmap.width {
                let x = left + col as i32 - x0;
                if x < 0 || x as usize >= w {
                    continue;
                }
                let coverage = bitmap.coverage[row * bitmap.width + col] as f32 / 255.0 * weight;
                let cell = &mut self.data[y as usize * w + x as usize];
                *cell = cell.max(coverage);
            }
        }
    }

    /// Morphological dilation with a disc of `radius` pixels.
    fn dilate(&self, radius: f32) -> Self {
        let r = radius.ceil() as i32;
        let offsets: Vec<(i32, i32)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f32) <= radius * radius)
            .collect();

        let Region { w, h, .. } = self.region;
        let mut data = vec![0.0; w * h];
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let mut best: f32 = 0.0;
                for &(dx, dy) in &offsets {
                    best = best.max(self.at(x + dx, y + dy));
                    if best >= 1.0 {
                        break;
                    }
                }
                data[y as usize * w + x as usize] = best;
            }
        }
        self.with_data(data)
    }

    /// Separable box blur, two passes per axis.
    fn blur(&self, radius: f32) -> Self {
        let r = radius.round() as usize;
        if r == 0 {
            return self.clone();
        }
        let Region { w, h, .. } = self.region;
        let mut data = self.data.clone();
        for _ in 0..2 {
            data = blur_rows(&data, w, h, r);
            data = transpose(&blur_rows(&transpose(&data, w, h), h, w, r), h, w);
        }
        self.with_data(data)
    }

    /// Translate coverage by (`dx`, `dy`) pixels within the region.
    fn shifted(&self, dx: i32, dy: i32) -> Self {
        if dx == 0 && dy == 0 {
            return self.clone();
        }
        let Region { w, h, .. } = self.region;
        let mut data = vec![0.0; w * h];
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                data[y as usize * w + x as usize] = self.at(x - dx, y - dy);
            }
        }
        self.with_data(data)
    }
}

fn blur_rows(src: &[f32], w: usize, h: usize, r: usize) -> Vec<f32> {
    let mut out = vec![0.0; w * h];
    let norm = 1.0 / (2 * r + 1) as f32;
    let mut prefix = vec![0.0f32; w + 1];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for (x, v) in row.iter().enumerate() {
            prefix[x + 1] = prefix[x] + v;
        }
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r + 1).min(w);
            out[y * w + x] = (prefix[hi] - prefix[lo]) * norm;
        }
    }
    out
}

/// Transpose a `w` x `h` row-major buffer into `h` x `w`.
fn transpose(src: &[f32], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            out[x * h + y] = src[y * w + x];
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let sa = (color.a * coverage).clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let dst = &mut self.pixels[idx..idx + 4];
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        for (channel, src) in [color.r, color.g, color.b].into_iter().enumerate() {
            let d = dst[channel] as f32 / 255.0;
            let value = (src * sa + d * da * (1.0 - sa)) / out_a;
            dst[channel] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    fn paint(&mut self, mask: &Mask, color: Rgba) {
        let Region { x0, y0, w, h } = mask.region;
        for ly in 0..h {
            for lx in 0..w {
                let coverage = mask.data[ly * w + lx];
                if coverage > 0.0 {
                    self.blend(x0 as u32 + lx as u32, y0 as u32 + ly as u32, color, coverage);
                }
            }
        }
    }

    /// Antialiased rounded rectangle.
    fn fill_rounded_rect(&mut self, rect: Bounds, radius: f32, color: Rgba) {
        let region = Region::clip(rect, self.width, self.height);
        let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0).max(0.0);
        let cx = (rect.x0 + rect.x1) / 2.0;
        let cy = (rect.y0 + rect.y1) / 2.0;
        let half_w = rect.width() / 2.0 - radius;
        let half_h = rect.height() / 2.0 - radius;

        for ly in 0..region.h {
            for lx in 0..region.w {
                let x = region.x0 as u32 + lx as u32;
                let y = region.y0 as u32 + ly as u32;
                let qx = (x as f32 + 0.5 - cx).abs() - half_w;
                let qy = (y as f32 + 0.5 - cy).abs() - half_h;
                let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
                let distance = outside + qx.max(qy).min(0.0) - radius;
                let coverage = (0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::font::BlockGlyphs;
    use crate::captions::style::{
        CaptionAnimation, CaptionPosition, MAX_FONT_SIZE, MAX_SHADOW_BLUR, MAX_SHADOW_OFFSET, MAX_STROKE_WIDTH,
    };

    const W: u32 = 108;
    const H: u32 = 192;

    fn renderer() -> CaptionRenderer {
        CaptionRenderer::new(Arc::new(BlockGlyphs), W, H)
    }

    fn cue(text: &str, start: f64, end: f64) -> CaptionCue {
        CaptionCue {
            index: 1,
            start_time: start,
            end_time: end,
            text: text.into(),
            words: None,
        }
    }

    fn transparent_background() -> CaptionStyle {
        CaptionStyle {
            background_opacity: 0.0,
            ..Default::default()
        }
    }

    fn pixel(buf: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = ((y * W + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn none_animation_gives_one_decodable_frame() {
        let frames = renderer()
            .render_cue(&cue("HELLO", 1.0, 3.0), &CaptionStyle::default())
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp, 1.0);
        assert_eq!(frames[0].duration, 2.0);

        let decoded = image::load_from_memory(&frames[0].image_bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (W, H));
        // Corners stay transparent.
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(W - 1, H - 1).0[3], 0);
    }

    #[test]
    fn pop_frames_sum_to_cue_duration() {
        let style = CaptionStyle {
            animation: CaptionAnimation::Pop,
            ..Default::default()
        };
        let frames = renderer().render_cue(&cue("HI", 0.0, 1.5), &style).unwrap();
        assert_eq!(frames.len(), 6);
        let total: f64 = frames.iter().map(|f| f.duration).sum();
        assert!((total - 1.5).abs() < 1e-9);
    }

    #[test]
    fn single_word_mode_splits_frames() {
        let style = CaptionStyle {
            single_word_mode: true,
            ..Default::default()
        };
        let frames = renderer().render_cue(&cue("ONE TWO THREE", 0.0, 3.0), &style).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].timestamp, 1.0);
    }

    #[test]
    fn text_is_white_over_black_box() {
        let r = renderer();
        let style = CaptionStyle::default();
        let layout = layout_text("AB", &BlockGlyphs, font_px(34.0, W, 1.0), W as f32 * 0.85, 2);
        let spec = plan_frames(&cue("AB", 0.0, 1.0), CaptionAnimation::None)[0];
        let buf = r.draw(&layout, &style, &Palette::from_style(&style), &spec);

        let placed = place(&layout, &BlockGlyphs, spec.scale * font_px(34.0, W, 1.0), W, H, 0.85);
        let glyph = BlockGlyphs.rasterize('A', placed.px);
        let first = placed.chars[0];
        let gx = (first.x + glyph.xmin as f32).round() as u32 + 1;
        let gy = (first.baseline - glyph.height as f32).round() as u32 + 1;
        assert_eq!(pixel(&buf, gx, gy), [255, 255, 255, 255]);

        // Just inside the padded box but left of the text: opaque black.
        let bx = placed.bounds.x0.floor() as u32 - 1;
        let by = ((placed.bounds.y0 + placed.bounds.y1) / 2.0) as u32;
        assert_eq!(pixel(&buf, bx, by), [0, 0, 0, 255]);
    }

    #[test]
    fn karaoke_dims_upcoming_words() {
        let r = renderer();
        let style = CaptionStyle {
            animation: CaptionAnimation::Karaoke,
            position: CaptionPosition::Middle,
            ..transparent_background()
        };
        let px = font_px(style.font_size, W, 1.0);
        let layout = layout_text("A B", &BlockGlyphs, px, W as f32 * 0.85, 2);
        let specs = plan_frames(&cue("A B", 0.0, 2.0), CaptionAnimation::Karaoke);
        assert_eq!(specs.len(), 2);
        let buf = r.draw(&layout, &style, &Palette::from_style(&style), &specs[0]);

        let placed = place(&layout, &BlockGlyphs, px, W, H, 0.5);
        let glyph = BlockGlyphs.rasterize('A', px);
        let centre = |i: usize| {
            let c = placed.chars[i];
            let x = (c.x + glyph.xmin as f32).round() as u32 + glyph.width as u32 / 2;
            let y = (c.baseline - glyph.height as f32).round() as u32 + glyph.height as u32 / 2;
            (x, y)
        };
        let (ax, ay) = centre(0);
        let (bx, by) = centre(1);
        assert_eq!(pixel(&buf, ax, ay)[3], 255);
        let dimmed = pixel(&buf, bx, by)[3];
        assert_eq!(dimmed, (UPCOMING_WORD_OPACITY * 255.0).round() as u8);
    }

    #[test]
    fn fade_first_frame_is_fully_transparent() {
        let style = CaptionStyle {
            animation: CaptionAnimation::Fade,
            ..Default::default()
        };
        let frames = renderer().render_cue(&cue("HI", 0.0, 1.0), &style).unwrap();
        let first = image::load_from_memory(&frames[0].image_bytes).unwrap().to_rgba8();
        assert!(first.pixels().all(|p| p.0[3] == 0));
        let last = image::load_from_memory(&frames[5].image_bytes).unwrap().to_rgba8();
        assert!(last.pixels().any(|p| p.0[3] == 255));
    }

    #[test]
    fn stroke_extends_beyond_glyphs() {
        let r = renderer();
        let plain = transparent_background();
        let stroked = CaptionStyle {
            stroke_width: 10.0,
            ..transparent_background()
        };
        let px = font_px(plain.font_size, W, 1.0);
        let layout = layout_text("A", &BlockGlyphs, px, W as f32, 2);
        let spec = plan_frames(&cue("A", 0.0, 1.0), CaptionAnimation::None)[0];
        let count = |style: &CaptionStyle| {
            r.draw(&layout, style, &Palette::from_style(style), &spec)
                .chunks(4)
                .filter(|p| p[3] > 0)
                .count()
        };
        assert!(count(&stroked) > count(&plain));
    }

    #[test]
    fn oversized_style_renders_at_clamped_sizes() {
        let extreme = CaptionStyle {
            font_size: 10_000.0,
            stroke_width: 400.0,
            stroke_color: "#FF0000".into(),
            shadow_color: "#000000".into(),
            shadow_blur: 900.0,
            shadow_offset_x: 5_000.0,
            shadow_offset_y: -5_000.0,
            ..transparent_background()
        };
        let bounded = CaptionStyle {
            font_size: MAX_FONT_SIZE,
            stroke_width: MAX_STROKE_WIDTH,
            shadow_blur: MAX_SHADOW_BLUR,
            shadow_offset_x: MAX_SHADOW_OFFSET,
            shadow_offset_y: -MAX_SHADOW_OFFSET,
            ..extreme.clone()
        };
        let r = renderer();
        let frames = r.render_cue(&cue("HI", 0.0, 1.0), &extreme).unwrap();
        let expected = r.render_cue(&cue("HI", 0.0, 1.0), &bounded).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].image_bytes, expected[0].image_bytes);
    }

    #[test]
    fn blur_preserves_mass_roughly() {
        let region = Region { x0: 0, y0: 0, w: 21, h: 21 };
        let mut mask = Mask::new(region);
        mask.data[10 * 21 + 10] = 1.0;
        let blurred = mask.blur(2.0);
        let total: f32 = blurred.data.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!(blurred.data[10 * 21 + 10] < 1.0);
    }

    #[test]
    fn shift_moves_coverage() {
        let region = Region { x0: 0, y0: 0, w: 5, h: 5 };
        let mut mask = Mask::new(region);
        mask.data[0] = 1.0;
        let moved = mask.shifted(2, 1);
        assert_eq!(moved.at(2, 1), 1.0);
        assert_eq!(moved.at(0, 0), 0.0);
    }
}
