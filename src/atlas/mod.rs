//! Glyph atlas data model
//!
//! A `GlyphTable` maps characters to packed glyph rectangles on one or
//! more `AtlasPage`s, together with the metrics the layout engine needs
//! (mean glyph width, max heights, kerning pairs).

pub mod builder;
pub mod kerning;
pub mod packer;
pub mod retarget;
pub mod serialize;
pub mod shadow;

use std::collections::{BTreeMap, HashMap};

use crate::bitmap::{Bitmap, Rect};
use crate::constants::MONOSPACE_TOLERANCE;
use crate::drawing::context::TextureId;
use crate::error::{FontError, Result};
use crate::layout::options::{Monospacing, RenderOptions};

pub use builder::Builder;

/// One packed character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// Index of the page holding the glyph
    pub page: usize,
    /// Pixel rectangle on the page
    pub rect: Rect,
    /// Distance from the top of the line to the top of the glyph
    pub y_offset: i32,
    pub character: char,
}

impl Glyph {
    pub fn new(page: usize, rect: Rect, y_offset: i32, character: char) -> Self {
        Self {
            page,
            rect,
            y_offset,
            character,
        }
    }
}

/// Atlas image plus its texture handle once uploaded
#[derive(Debug, Clone)]
pub struct AtlasPage {
    bitmap: Bitmap,
    texture: Option<TextureId>,
}

impl AtlasPage {
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            texture: None,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    pub(crate) fn set_texture(&mut self, texture: Option<TextureId>) {
        self.texture = texture;
    }
}

/// Character to glyph mapping plus font-wide metrics
#[derive(Debug, Clone, Default)]
pub struct GlyphTable {
    pub glyphs: BTreeMap<char, Glyph>,
    pub pages: Vec<AtlasPage>,
    pub mean_glyph_width: f32,
    pub max_glyph_height: i32,
    /// Max of glyph height plus vertical offset
    pub max_line_height: i32,
    pub is_drop_shadow: bool,
    pub drop_shadow: Option<Box<GlyphTable>>,
    pub naturally_monospaced: bool,
    /// (left, right) -> horizontal adjustment added after `left`
    pub kerning_pairs: HashMap<(char, char), i32>,
}

impl GlyphTable {
    /// Table from packed glyphs and pages, metrics computed from the glyphs
    pub fn new(glyphs: &[Glyph], pages: Vec<Bitmap>) -> Self {
        let mut table = Self {
            glyphs: glyphs.iter().map(|g| (g.character, *g)).collect(),
            pages: pages.into_iter().map(AtlasPage::new).collect(),
            ..Default::default()
        };
        table.update_metrics();
        table
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Glyphs in character order
    pub fn glyph_list(&self) -> Vec<Glyph> {
        self.glyphs.values().copied().collect()
    }

    pub fn page_bitmaps(&self) -> Vec<Bitmap> {
        self.pages.iter().map(|p| p.bitmap.clone()).collect()
    }

    pub fn kerning(&self, left: char, right: char) -> i32 {
        self.kerning_pairs.get(&(left, right)).copied().unwrap_or(0)
    }

    /// Kerning between `chars[index]` and whatever follows it
    ///
    /// At the end of `chars`, `next_word` (the following word node, if
    /// any) supplies the right-hand character.
    pub fn kerning_correction(&self, index: usize, chars: &[char], next_word: Option<&str>) -> i32 {
        let Some(&left) = chars.get(index) else {
            return 0;
        };
        let right = match chars.get(index + 1) {
            Some(&c) => c,
            None => match next_word.and_then(|w| w.chars().next()) {
                Some(c) => c,
                None => return 0,
            },
        };
        self.kerning(left, right)
    }

    /// Recompute mean width and max heights
    pub fn update_metrics(&mut self) {
        let (mean, max_height, max_line) = glyph_metrics(self.glyphs.values());
        self.mean_glyph_width = mean;
        self.max_glyph_height = max_height;
        self.max_line_height = max_line;
    }

    pub fn is_monospacing_active(&self, options: &RenderOptions) -> bool {
        match options.monospacing {
            Monospacing::Yes => true,
            Monospacing::No => false,
            Monospacing::Natural => self.naturally_monospaced,
        }
    }

    /// Advance of every glyph when monospacing
    pub fn monospace_width(&self, options: &RenderOptions) -> f32 {
        (1.0 + (1.0 + options.character_spacing) * self.mean_glyph_width).ceil()
    }

    pub fn line_spacing(&self, options: &RenderOptions) -> f32 {
        (self.max_line_height as f32 * options.line_spacing).ceil()
    }

    /// Fail if any two glyphs on the same page intersect
    pub fn validate_overlap(&self, stage: &str) -> Result<()> {
        check_overlap(&self.glyph_list(), stage)
    }
}

/// (mean width, max height, max height + offset)
pub fn glyph_metrics<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> (f32, i32, i32) {
    let mut count = 0usize;
    let mut total_width = 0i64;
    let mut max_height = 0;
    let mut max_line = 0;
    for g in glyphs {
        count += 1;
        total_width += g.rect.width as i64;
        max_height = max_height.max(g.rect.height);
        max_line = max_line.max(g.rect.height + g.y_offset);
    }
    let mean = if count == 0 {
        0.0
    } else {
        total_width as f32 / count as f32
    };
    (mean, max_height, max_line)
}

/// First pair of glyphs whose rectangles intersect on the same page
pub fn first_intercept(glyphs: &[Glyph]) -> Option<(char, char)> {
    for (i, a) in glyphs.iter().enumerate() {
        for b in &glyphs[i + 1..] {
            if a.page == b.page && a.rect.intersects(&b.rect) {
                return Some((a.character, b.character));
            }
        }
    }
    None
}

pub fn check_overlap(glyphs: &[Glyph], stage: &str) -> Result<()> {
    match first_intercept(glyphs) {
        Some((first, second)) => Err(FontError::GlyphOverlap {
            first,
            second,
            stage: stage.to_string(),
        }),
        None => Ok(()),
    }
}

/// True when the width spread is under 5% of the widest glyph
pub fn is_monospaced(widths: impl IntoIterator<Item = i32>) -> bool {
    let mut min = i32::MAX;
    let mut max = i32::MIN;
    for w in widths {
        min = min.min(w);
        max = max.max(w);
    }
    if max < min {
        return false;
    }
    ((max - min) as f32) < MONOSPACE_TOLERANCE * max as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(c: char, page: usize, x: i32, y: i32, w: i32, h: i32) -> Glyph {
        Glyph::new(page, Rect::new(x, y, w, h), 0, c)
    }

    #[test]
    fn test_monospace_detection() {
        assert!(is_monospaced([10, 10, 10, 10]));
        assert!(!is_monospaced([10, 4, 10, 10]));
        assert!(is_monospaced([100, 96]));
        assert!(!is_monospaced([100, 95]));
        assert!(!is_monospaced(std::iter::empty()));
    }

    #[test]
    fn test_first_intercept_same_page_only() {
        let glyphs = [
            glyph('a', 0, 0, 0, 10, 10),
            glyph('b', 1, 5, 5, 10, 10),
            glyph('c', 0, 10, 0, 10, 10),
        ];
        assert_eq!(first_intercept(&glyphs), None);

        let glyphs = [glyph('a', 0, 0, 0, 10, 10), glyph('b', 0, 9, 9, 10, 10)];
        assert_eq!(first_intercept(&glyphs), Some(('a', 'b')));
        let err = check_overlap(&glyphs, "after packing").unwrap_err();
        assert!(err.to_string().contains("'a' and 'b'"));
    }

    #[test]
    fn test_metrics() {
        let mut glyphs = vec![glyph('a', 0, 0, 0, 10, 12), glyph('b', 0, 20, 0, 4, 6)];
        glyphs[1].y_offset = 9;
        let table = GlyphTable::new(&glyphs, vec![]);
        assert_eq!(table.mean_glyph_width, 7.0);
        assert_eq!(table.max_glyph_height, 12);
        assert_eq!(table.max_line_height, 15);
    }

    #[test]
    fn test_kerning_correction_crosses_fragments() {
        let mut table = GlyphTable::new(&[glyph('a', 0, 0, 0, 4, 4)], vec![]);
        table.kerning_pairs.insert(('a', 'b'), -2);
        table.kerning_pairs.insert(('b', 'c'), -1);
        let chars = ['a', 'b'];
        assert_eq!(table.kerning_correction(0, &chars, None), -2);
        assert_eq!(table.kerning_correction(1, &chars, None), 0);
        assert_eq!(table.kerning_correction(1, &chars, Some("cd")), -1);
        assert_eq!(table.kerning_correction(5, &chars, None), 0);
    }

    #[test]
    fn test_monospace_width_and_line_spacing() {
        let mut table = GlyphTable::new(&[glyph('a', 0, 0, 0, 10, 10)], vec![]);
        table.max_line_height = 11;
        let options = RenderOptions::default();
        // ceil(1 + 1.05 * 10)
        assert_eq!(table.monospace_width(&options), 12.0);
        assert_eq!(table.line_spacing(&options), 11.0);

        table.naturally_monospaced = true;
        assert!(table.is_monospacing_active(&options));
        let forced_off = RenderOptions {
            monospacing: Monospacing::No,
            ..Default::default()
        };
        assert!(!table.is_monospacing_active(&forced_off));
    }
}
