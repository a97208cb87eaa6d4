//! Per-call layout and render options

use serde::{Deserialize, Serialize};

use crate::bitmap::Rect;
use crate::constants::{
    DEFAULT_CHARACTER_SPACING, DEFAULT_DROP_SHADOW_OFFSET, DEFAULT_DROP_SHADOW_OPACITY,
    DEFAULT_JUSTIFY_CAP_CONTRACT, DEFAULT_JUSTIFY_CAP_EXPAND, DEFAULT_JUSTIFY_CHAR_WEIGHT_CONTRACT,
    DEFAULT_JUSTIFY_CHAR_WEIGHT_EXPAND, DEFAULT_JUSTIFY_CONTRACTION_PENALTY, DEFAULT_LINE_SPACING,
    DEFAULT_WORD_SPACING,
};

/// Monospacing policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monospacing {
    /// Monospace only if the font is naturally monospaced
    #[default]
    Natural,
    Yes,
    No,
}

/// Horizontal alignment within the layout width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Centre,
    Justify,
}

impl std::str::FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "centre" | "center" => Ok(Self::Centre),
            "justify" => Ok(Self::Justify),
            _ => Err(format!("unknown alignment \"{}\"", s)),
        }
    }
}

/// Width and height in pixels (or viewport units)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Maps a viewport rectangle onto a pixel surface
///
/// With a transform set, positions and layout widths passed to the drawing
/// primitive are in viewport units and measured sizes are returned in them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub surface_width: f32,
    pub surface_height: f32,
}

impl ViewportTransform {
    fn scale(&self) -> (f32, f32) {
        let sx = if self.width != 0.0 { self.surface_width / self.width } else { 1.0 };
        let sy = if self.height != 0.0 { self.surface_height / self.height } else { 1.0 };
        (sx, sy)
    }

    /// Viewport position to pixels
    pub fn point_to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        let (sx, sy) = self.scale();
        ((x - self.x) * sx, (y - self.y) * sy)
    }

    /// Viewport size to pixels
    pub fn size_to_pixels(&self, size: Size) -> Size {
        let (sx, sy) = self.scale();
        Size::new(size.width * sx, size.height * sy)
    }

    /// Pixel size to viewport units
    pub fn size_to_viewport(&self, size: Size) -> Size {
        let (sx, sy) = self.scale();
        Size::new(size.width / sx, size.height / sy)
    }
}

/// Everything that changes how text is laid out and coloured
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// RGBA, 0.0-1.0
    pub colour: [f32; 4],
    /// Fraction of the mean glyph width added after every character
    pub character_spacing: f32,
    /// Space width as a fraction of the mean glyph width
    pub word_spacing: f32,
    /// Fraction of the max line height
    pub line_spacing: f32,
    pub drop_shadow_active: bool,
    pub drop_shadow_colour: [f32; 4],
    /// Multiplies the shadow colour's alpha
    pub drop_shadow_opacity: f32,
    /// In units of mean glyph width
    pub drop_shadow_offset: (f32, f32),
    pub monospacing: Monospacing,
    pub word_wrap: bool,
    pub justify_character_weight_for_expand: f32,
    pub justify_character_weight_for_contract: f32,
    /// Max fraction of the line width added when justifying
    pub justify_cap_expand: f32,
    /// Max fraction of the line width removed when justifying
    pub justify_cap_contract: f32,
    pub justify_contraction_penalty: f32,
    pub lock_to_pixel: bool,
    /// 0.0 leaves positions alone, 1.0 rounds them to whole pixels
    pub lock_to_pixel_ratio: f32,
    /// Quads outside are dropped, quads crossing it are cut
    pub clipping_rectangle: Option<Rect>,
    pub transform: Option<ViewportTransform>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0, 1.0],
            character_spacing: DEFAULT_CHARACTER_SPACING,
            word_spacing: DEFAULT_WORD_SPACING,
            line_spacing: DEFAULT_LINE_SPACING,
            drop_shadow_active: false,
            drop_shadow_colour: [0.0, 0.0, 0.0, 1.0],
            drop_shadow_opacity: DEFAULT_DROP_SHADOW_OPACITY,
            drop_shadow_offset: DEFAULT_DROP_SHADOW_OFFSET,
            monospacing: Monospacing::Natural,
            word_wrap: true,
            justify_character_weight_for_expand: DEFAULT_JUSTIFY_CHAR_WEIGHT_EXPAND,
            justify_character_weight_for_contract: DEFAULT_JUSTIFY_CHAR_WEIGHT_CONTRACT,
            justify_cap_expand: DEFAULT_JUSTIFY_CAP_EXPAND,
            justify_cap_contract: DEFAULT_JUSTIFY_CAP_CONTRACT,
            justify_contraction_penalty: DEFAULT_JUSTIFY_CONTRACTION_PENALTY,
            lock_to_pixel: false,
            lock_to_pixel_ratio: 1.0,
            clipping_rectangle: None,
            transform: None,
        }
    }
}

impl RenderOptions {
    /// Shadow colour with the opacity applied
    pub fn effective_shadow_colour(&self) -> [f32; 4] {
        let [r, g, b, a] = self.drop_shadow_colour;
        [r, g, b, a * self.drop_shadow_opacity]
    }

    /// Blend `v` towards its rounded value when pixel locking is on
    pub fn lock(&self, v: f32) -> f32 {
        if self.lock_to_pixel {
            let r = self.lock_to_pixel_ratio;
            (1.0 - r) * v + r * v.round()
        } else {
            v
        }
    }
}
