//! Pairwise kerning
//!
//! For every ordered character pair the table stores the horizontal
//! adjustment added to the left glyph's advance. Without native kerning
//! from the rasterizer it is derived from per-row ink extents: the pair
//! is pulled together until the closest rows are one pixel apart.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::Glyph;
use crate::bitmap::Bitmap;
use crate::config::{CharacterKerningRule, KerningConfig};
use crate::font::rasterizer::GlyphRasterizer;

/// Horizontal ink extent of one glyph row, relative to the glyph's left edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct XLimits {
    min: i32,
    max: i32,
}

/// Kerning supplied by the rasterizer, measured at `scale` times the atlas size
pub struct NativeKerning<'a> {
    pub rasterizer: &'a dyn GlyphRasterizer,
    pub scale: f32,
}

/// Row extents over rows `y..=y+h` and columns `x..=x+w`
///
/// Rows without ink get `min = x + w - 1` and `max = 0` so they never
/// constrain the pair.
fn glyph_limits(glyph: &Glyph, page: &Bitmap, tolerance: u8) -> Vec<XLimits> {
    let rect = glyph.rect;
    let x_start = rect.x;
    let x_end = rect.x + rect.width;

    let raw: Vec<XLimits> = (rect.y..=rect.y + rect.height)
        .map(|y| {
            let ink = |x: &i32| !page.is_empty(*x, y, tolerance);
            let min = (x_start..=x_end).find(ink).map(|x| x - x_start);
            let max = (x_start..=x_end).rev().find(ink).map(|x| x - x_start);
            XLimits {
                min: min.unwrap_or(x_end - 1),
                max: max.unwrap_or(0),
            }
        })
        .collect();

    // Each row takes the widest extent of itself and its direct neighbours
    (0..raw.len())
        .map(|j| {
            let from = j.saturating_sub(1);
            let to = (j + 1).min(raw.len() - 1);
            raw[from..=to].iter().fold(raw[j], |acc, l| XLimits {
                min: acc.min.min(l.min),
                max: acc.max.max(l.max),
            })
        })
        .collect()
}

/// Free horizontal space between two glyphs placed edge to edge
fn worst_case(g1: &Glyph, l1: &[XLimits], g2: &Glyph, l2: &[XLimits]) -> i32 {
    let (w1, w2) = (g1.rect.width, g2.rect.width);
    let (yo1, yo2) = (g1.y_offset, g2.y_offset);
    let from = yo1.max(yo2);
    let to = (g1.rect.height + yo1).min(g2.rect.height + yo2);

    let mut worst = w1;
    for j in from..to {
        let (Some(a), Some(b)) = (
            l1.get((j - yo1) as usize),
            l2.get((j - yo2) as usize),
        ) else {
            continue;
        };
        worst = worst.min(w1 - a.max + b.min);
    }
    worst.min(w1).min(w2)
}

/// Adjustment for a pair given its free space and rule
pub fn pair_adjustment(rule: CharacterKerningRule, worst_case: i32, w1: i32, w2: i32) -> i32 {
    match rule {
        CharacterKerningRule::Zero => 1,
        CharacterKerningRule::NotMoreThanHalf => {
            1 - (w1.min(w2) as f32 * 0.5).min(worst_case as f32) as i32
        }
        CharacterKerningRule::Normal => 1 - worst_case,
    }
}

/// Kerning for every ordered pair of `chars` present in `glyphs`
pub fn calculate_kerning(
    chars: &[char],
    glyphs: &BTreeMap<char, Glyph>,
    pages: &[Bitmap],
    config: &KerningConfig,
    native: Option<NativeKerning<'_>>,
) -> HashMap<(char, char), i32> {
    let present: Vec<char> = chars.iter().copied().filter(|c| glyphs.contains_key(c)).collect();
    let mut pairs = HashMap::with_capacity(present.len() * present.len());

    if let Some(native) = native.filter(|n| n.rasterizer.has_kerning_info()) {
        for &c1 in &present {
            for &c2 in &present {
                let value = native.rasterizer.kerning(c1, c2) as f32 * native.scale;
                pairs.insert((c1, c2), value.round() as i32);
            }
        }
        debug!("Native kerning: {} pairs", pairs.len());
        return pairs;
    }

    let tolerance = config.alpha_empty_pixel_tolerance;
    let limits: HashMap<char, Vec<XLimits>> = present
        .iter()
        .filter_map(|c| {
            let glyph = glyphs.get(c)?;
            let page = pages.get(glyph.page)?;
            Some((*c, glyph_limits(glyph, page, tolerance)))
        })
        .collect();

    for &c1 in &present {
        for &c2 in &present {
            let (Some(g1), Some(g2), Some(l1), Some(l2)) =
                (glyphs.get(&c1), glyphs.get(&c2), limits.get(&c1), limits.get(&c2))
            else {
                continue;
            };
            let worst = worst_case(g1, l1, g2, l2);
            let rule = config.pair_rule(c1, c2);
            pairs.insert(
                (c1, c2),
                pair_adjustment(rule, worst, g1.rect.width, g2.rect.width),
            );
        }
    }

    debug!("Geometric kerning: {} pairs", pairs.len());
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{PixelFormat, Rect};

    /// Page with glyph 'A' as a full 10x10 block and 'L' as an L shape
    fn page() -> (Bitmap, BTreeMap<char, Glyph>) {
        let mut bmp = Bitmap::new(40, 20, PixelFormat::Rgba);
        let a = Rect::new(2, 2, 10, 10);
        bmp.fill_rect(a, [255, 255, 255, 255]);
        // 'L': vertical bar 2px wide, foot along the bottom row
        bmp.fill_rect(Rect::new(20, 2, 2, 10), [255, 255, 255, 255]);
        bmp.fill_rect(Rect::new(20, 11, 10, 1), [255, 255, 255, 255]);

        let mut glyphs = BTreeMap::new();
        glyphs.insert('A', Glyph::new(0, a, 0, 'A'));
        glyphs.insert('B', Glyph::new(0, a, 0, 'B'));
        glyphs.insert('L', Glyph::new(0, Rect::new(20, 2, 10, 10), 0, 'L'));
        (bmp, glyphs)
    }

    fn no_rules() -> KerningConfig {
        KerningConfig {
            alpha_empty_pixel_tolerance: 0,
            rules: Vec::new(),
        }
    }

    #[test]
    fn test_limits_smoothing() {
        let (bmp, glyphs) = page();
        let limits = glyph_limits(&glyphs[&'L'], &bmp, 0);
        assert_eq!(limits.len(), 11);
        // Row 8 is only the bar, but row 9 (the foot) widens it
        assert_eq!(limits[8], XLimits { min: 0, max: 9 });
        assert_eq!(limits[7], XLimits { min: 0, max: 1 });
        // Row 10 lies below the glyph: empty, smoothed by the foot
        assert_eq!(limits[10], XLimits { min: 0, max: 9 });
    }

    #[test]
    fn test_solid_blocks_touch() {
        let (bmp, glyphs) = page();
        let pairs = calculate_kerning(&['A', 'B', ' '], &glyphs, &[bmp], &no_rules(), None);
        // Full blocks have no free space: max 9, min 0 -> worst case 1
        assert_eq!(pairs[&('A', 'B')], 0);
        assert!(!pairs.contains_key(&(' ', 'A')));
    }

    #[test]
    fn test_l_followed_by_block_pulls_in() {
        let (bmp, glyphs) = page();
        let pairs = calculate_kerning(&['L', 'A'], &glyphs, &[bmp], &no_rules(), None);
        // Rows 0..7 give 10 - 1 + 0 = 9; rows 8.. are blocked by the foot
        assert_eq!(pairs[&('L', 'A')], 0);
        assert_eq!(pairs[&('A', 'L')], 0);
    }

    #[test]
    fn test_zero_rule_wins() {
        let (bmp, glyphs) = page();
        let mut config = no_rules();
        config.set_rule("A", CharacterKerningRule::Zero);
        config.set_rule("B", CharacterKerningRule::NotMoreThanHalf);
        let pairs = calculate_kerning(&['A', 'B'], &glyphs, &[bmp], &config, None);
        assert_eq!(pairs[&('A', 'B')], 1);
        assert_eq!(pairs[&('B', 'A')], 1);
        assert_eq!(pairs[&('A', 'A')], 1);
    }

    #[test]
    fn test_pair_adjustment_rules() {
        assert_eq!(pair_adjustment(CharacterKerningRule::Normal, 6, 10, 10), -5);
        assert_eq!(pair_adjustment(CharacterKerningRule::Zero, 6, 10, 10), 1);
        // Overlap capped at half the narrower glyph
        assert_eq!(pair_adjustment(CharacterKerningRule::NotMoreThanHalf, 6, 10, 8), -3);
        assert_eq!(pair_adjustment(CharacterKerningRule::NotMoreThanHalf, 2, 10, 8), -1);
        for worst in -5..12 {
            let adj = pair_adjustment(CharacterKerningRule::NotMoreThanHalf, worst, 10, 7);
            assert!(adj >= 1 - 3);
        }
    }

    struct Native;

    impl GlyphRasterizer for Native {
        fn size(&self) -> f32 {
            20.0
        }
        fn measure(&self, _ch: char) -> (i32, i32) {
            (10, 10)
        }
        fn draw(
            &self,
            _ch: char,
            _target: &mut Bitmap,
            _color: [u8; 3],
            _x: i32,
            _y: i32,
            _hint: crate::config::RenderHint,
        ) -> (i32, i32) {
            (0, 0)
        }
        fn has_glyph(&self, _ch: char) -> bool {
            true
        }
        fn has_kerning_info(&self) -> bool {
            true
        }
        fn kerning(&self, c1: char, c2: char) -> i32 {
            if (c1, c2) == ('A', 'B') {
                -4
            } else {
                0
            }
        }
    }

    #[test]
    fn test_native_kerning_is_scaled() {
        let (bmp, glyphs) = page();
        let native = NativeKerning {
            rasterizer: &Native,
            scale: 0.5,
        };
        let pairs = calculate_kerning(&['A', 'B'], &glyphs, &[bmp], &no_rules(), Some(native));
        assert_eq!(pairs[&('A', 'B')], -2);
        assert_eq!(pairs[&('B', 'A')], 0);
    }
}
