//! Caption style: the flat, user-editable settings object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::merge_field;

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 120.0;
pub const MAX_STROKE_WIDTH: f32 = 12.0;
pub const MAX_SHADOW_BLUR: f32 = 20.0;
pub const MAX_SHADOW_OFFSET: f32 = 40.0;

/// Vertical anchor of the caption block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl CaptionPosition {
    /// Anchor as a fraction of frame height.
    pub fn anchor(self) -> f32 {
        match self {
            Self::Top => 0.15,
            Self::Middle => 0.50,
            Self::Bottom => 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionAnimation {
    #[default]
    None,
    Pop,
    Fade,
    Karaoke,
}

/// Caption appearance. Deserializes from a flat camelCase object; unknown
/// keys are ignored, and missing or malformed keys take the defaults below.
/// Sizes are clamped to the `MIN_*`/`MAX_*` bounds on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct CaptionStyle {
    pub font_family: String,
    /// Font size in points at a 540 px wide reference frame.
    pub font_size: f32,
    pub font_weight: u16,
    pub font_color: String,
    pub background_color: String,
    /// 0.0 to 1.0. Values above 1 are read as percentages.
    pub background_opacity: f32,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub shadow_color: String,
    pub shadow_blur: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub position: CaptionPosition,
    pub animation: CaptionAnimation,
    pub max_lines: u32,
    pub uppercase: bool,
    pub emoji_augmentation: bool,
    pub single_word_mode: bool,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".into(),
            font_size: 34.0,
            font_weight: 700,
            font_color: "#FFFFFF".into(),
            background_color: "#000000".into(),
            background_opacity: 1.0,
            stroke_color: "#000000".into(),
            stroke_width: 0.0,
            shadow_color: "transparent".into(),
            shadow_blur: 0.0,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            position: CaptionPosition::Bottom,
            animation: CaptionAnimation::None,
            max_lines: 2,
            uppercase: false,
            emoji_augmentation: false,
            single_word_mode: false,
        }
    }
}

impl From<Map<String, Value>> for CaptionStyle {
    fn from(mut raw: Map<String, Value>) -> Self {
        let mut style = Self::default();
        merge_field(&mut raw, "fontFamily", &mut style.font_family);
        merge_field(&mut raw, "fontSize", &mut style.font_size);
        merge_field(&mut raw, "fontWeight", &mut style.font_weight);
        merge_field(&mut raw, "fontColor", &mut style.font_color);
        merge_field(&mut raw, "backgroundColor", &mut style.background_color);
        merge_field(&mut raw, "backgroundOpacity", &mut style.background_opacity);
        merge_field(&mut raw, "strokeColor", &mut style.stroke_color);
        merge_field(&mut raw, "strokeWidth", &mut style.stroke_width);
        merge_field(&mut raw, "shadowColor", &mut style.shadow_color);
        merge_field(&mut raw, "shadowBlur", &mut style.shadow_blur);
        merge_field(&mut raw, "shadowOffsetX", &mut style.shadow_offset_x);
        merge_field(&mut raw, "shadowOffsetY", &mut style.shadow_offset_y);
        merge_field(&mut raw, "position", &mut style.position);
        merge_field(&mut raw, "animation", &mut style.animation);
        merge_field(&mut raw, "maxLines", &mut style.max_lines);
        merge_field(&mut raw, "uppercase", &mut style.uppercase);
        merge_field(&mut raw, "emojiAugmentation", &mut style.emoji_augmentation);
        merge_field(&mut raw, "singleWordMode", &mut style.single_word_mode);
        style.clamped()
    }
}

impl CaptionStyle {
    /// Copy with every size pulled into its renderable range. Rasterization
    /// cost grows with the square of the stroke and blur radii.
    pub fn clamped(&self) -> Self {
        Self {
            font_size: self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            stroke_width: self.stroke_width.clamp(0.0, MAX_STROKE_WIDTH),
            shadow_blur: self.shadow_blur.clamp(0.0, MAX_SHADOW_BLUR),
            shadow_offset_x: self.shadow_offset_x.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET),
            shadow_offset_y: self.shadow_offset_y.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET),
            ..self.clone()
        }
    }

    pub fn background_alpha(&self) -> f32 {
        let opacity = if self.background_opacity > 1.0 {
            self.background_opacity / 100.0
        } else {
            self.background_opacity
        };
        opacity.clamp(0.0, 1.0)
    }
}

/// Straight-alpha RGBA colour, channels in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const BLACK: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub fn with_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0.0
    }
}

/// Parse a CSS-like colour: `#rgb`, `#rrggbb`, `#rrggbbaa`, or one of a
/// few names. Returns `None` for anything else.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "transparent" | "none" | "" => return Some(Rgba::TRANSPARENT),
        "white" => return Some(Rgba::WHITE),
        "black" => return Some(Rgba::BLACK),
        "yellow" => return Some(Rgba::from_bytes(255, 221, 0, 255)),
        "red" => return Some(Rgba::from_bytes(255, 0, 0, 255)),
        _ => {}
    }

    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| byte(hex[i..i + 1].repeat(2).as_str());
            Some(Rgba::from_bytes(expand(0)?, expand(1)?, expand(2)?, 255))
        }
        6 => Some(Rgba::from_bytes(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?, 255)),
        8 => Some(Rgba::from_bytes(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])?,
        )),
        _ => None,
    }
}

/// Resolved colours for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub fill: Rgba,
    pub background: Rgba,
    pub stroke: Rgba,
    pub shadow: Rgba,
}

impl Palette {
    /// Resolve the style's colour strings. Unparseable colours fall back to
    /// white fill and transparent decorations.
    pub fn from_style(style: &CaptionStyle) -> Self {
        Self {
            fill: color_or(&style.font_color, "fontColor", Rgba::WHITE),
            background: color_or(&style.background_color, "backgroundColor", Rgba::TRANSPARENT)
                .with_alpha(style.background_alpha()),
            stroke: color_or(&style.stroke_color, "strokeColor", Rgba::TRANSPARENT),
            shadow: color_or(&style.shadow_color, "shadowColor", Rgba::TRANSPARENT),
        }
    }
}

fn color_or(value: &str, field: &str, fallback: Rgba) -> Rgba {
    parse_color(value).unwrap_or_else(|| {
        tracing::warn!(field, value, "Unparseable caption colour, using fallback");
        fallback
    })
}
