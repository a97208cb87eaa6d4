//! Greedy row packing of glyphs onto atlas pages
//!
//! Glyphs are placed left to right; a glyph that does not fit the row is
//! retried at the start of the next row, and a row that would not fit the
//! page opens a new page. The same walk runs twice: a measuring pass that
//! finds how much of the last page is used, then the copying pass. The last
//! page is cropped to that size (rounded up to a power of two on request).

use log::debug;

use super::Glyph;
use crate::bitmap::{Bitmap, PixelFormat, Rect};
use crate::constants::PACKING_RETRY_FACTOR;
use crate::error::{FontError, Result};

/// Page background: white with zero alpha
const PAGE_CLEAR: [u8; 4] = [255, 255, 255, 0];

/// Packing constraints
#[derive(Debug, Clone, Copy)]
pub struct PackSettings {
    pub max_width: u32,
    pub max_height: u32,
    /// Empty pixels on every side of a glyph
    pub margin: i32,
    pub force_power_of_two: bool,
}

/// Result of a packing run
#[derive(Debug, Clone)]
pub struct PackedSheets {
    /// Same order as the source glyphs
    pub glyphs: Vec<Glyph>,
    pub pages: Vec<Bitmap>,
}

/// Greedy row-fill cursor shared by both passes
struct Cursor {
    x: i32,
    y: i32,
    max_y_in_row: i32,
    page: usize,
}

enum Step {
    Placed { x: i32, y: i32 },
    Retry { new_page: bool },
}

impl Cursor {
    fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            max_y_in_row: 0,
            page: 0,
        }
    }

    fn step(&mut self, rect: &Rect, settings: &PackSettings, tallest: i32) -> Step {
        let margin2 = 2 * settings.margin;
        let (width, height) = (settings.max_width as i32, settings.max_height as i32);

        if self.x + rect.width + margin2 <= width && self.y + rect.height + margin2 <= height {
            let placed = Step::Placed {
                x: self.x,
                y: self.y,
            };
            self.x += rect.width + margin2;
            self.max_y_in_row = self.max_y_in_row.max(rect.height);
            return placed;
        }

        // Next row, or next page once even the tallest glyph would not fit
        self.y += self.max_y_in_row + margin2;
        self.x = 0;
        self.max_y_in_row = 0;
        let new_page = self.y + tallest + margin2 > height;
        if new_page {
            self.y = 0;
            self.page += 1;
        }
        Step::Retry { new_page }
    }
}

/// Pack `glyphs` (rectangles on `sources`) onto fresh RGBA pages
///
/// RGBA sources are copied as is; RGB sources are treated as luminance
/// masks and written as white with coverage in alpha.
pub fn pack(glyphs: &[Glyph], sources: &[Bitmap], settings: &PackSettings) -> Result<PackedSheets> {
    let tallest = glyphs.iter().map(|g| g.rect.height).max().unwrap_or(0);
    let attempts_limit = PACKING_RETRY_FACTOR * glyphs.len();
    let margin2 = 2 * settings.margin;

    // Measuring pass: size used on the last page
    let mut cursor = Cursor::new();
    let (mut required_w, mut required_h) = (0i32, 0i32);
    let mut i = 0;
    let mut attempts = 0;
    while i < glyphs.len() {
        attempts += 1;
        if attempts > attempts_limit {
            return Err(FontError::PackingFailed {
                glyphs: glyphs.len(),
                attempts: attempts - 1,
            });
        }
        let rect = glyphs[i].rect;
        match cursor.step(&rect, settings, tallest) {
            Step::Placed { x, y } => {
                required_w = required_w.max(x + rect.width + margin2);
                required_h = required_h.max(y + rect.height + margin2);
                i += 1;
            }
            Step::Retry { new_page: true } => {
                required_w = 0;
                required_h = 0;
            }
            Step::Retry { new_page: false } => {}
        }
    }
    let final_page = cursor.page;

    let mut last_w = required_w.max(1) as u32;
    let mut last_h = required_h.max(1) as u32;
    if settings.force_power_of_two {
        last_w = last_w.next_power_of_two();
        last_h = last_h.next_power_of_two();
    }
    last_w = last_w.min(settings.max_width);
    last_h = last_h.min(settings.max_height);

    let mut pages: Vec<Bitmap> = (0..=final_page)
        .map(|p| {
            let mut page = if p == final_page {
                Bitmap::new(last_w, last_h, PixelFormat::Rgba)
            } else {
                Bitmap::new(settings.max_width, settings.max_height, PixelFormat::Rgba)
            };
            page.clear(PAGE_CLEAR);
            page
        })
        .collect();

    // Copying pass: identical walk, so it always terminates
    let mut cursor = Cursor::new();
    let mut out = Vec::with_capacity(glyphs.len());
    let mut i = 0;
    while i < glyphs.len() {
        let source_glyph = &glyphs[i];
        let rect = source_glyph.rect;
        if let Step::Placed { x, y } = cursor.step(&rect, settings, tallest) {
            let (dest_x, dest_y) = (x + settings.margin, y + settings.margin);
            if let (Some(page), Some(source)) =
                (pages.get_mut(cursor.page), sources.get(source_glyph.page))
            {
                match source.format() {
                    PixelFormat::Rgba => page.blit(source, rect, dest_x, dest_y),
                    PixelFormat::Rgb => page.blit_mask(source, rect, dest_x, dest_y),
                }
            }
            out.push(Glyph::new(
                cursor.page,
                Rect::new(dest_x, dest_y, rect.width, rect.height),
                source_glyph.y_offset,
                source_glyph.character,
            ));
            i += 1;
        }
    }

    debug!(
        "Packed {} glyphs onto {} page(s), last page {}x{}",
        out.len(),
        pages.len(),
        last_w,
        last_h
    );
    Ok(PackedSheets { glyphs: out, pages })
}

/// Scale pages and glyph geometry by `scale` (truncating)
pub fn scale_sheets(sheets: &mut PackedSheets, scale: f32) {
    for page in sheets.pages.iter_mut() {
        let w = ((page.width() as f32 * scale) as u32).max(1);
        let h = ((page.height() as f32 * scale) as u32).max(1);
        *page = page.downscale(w, h);
    }
    for glyph in sheets.glyphs.iter_mut() {
        glyph.rect = Rect::new(
            (glyph.rect.x as f32 * scale) as i32,
            (glyph.rect.y as f32 * scale) as i32,
            (glyph.rect.width as f32 * scale) as i32,
            (glyph.rect.height as f32 * scale) as i32,
        );
        glyph.y_offset = (glyph.y_offset as f32 * scale) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::first_intercept;
    use proptest::prelude::*;

    fn settings(w: u32, h: u32, margin: i32) -> PackSettings {
        PackSettings {
            max_width: w,
            max_height: h,
            margin,
            force_power_of_two: false,
        }
    }

    /// Glyphs laid out side by side on one source strip
    fn strip(sizes: &[(i32, i32)]) -> (Vec<Glyph>, Bitmap) {
        let width: i32 = sizes.iter().map(|s| s.0 + 1).sum::<i32>() + 1;
        let height = sizes.iter().map(|s| s.1).max().unwrap_or(1);
        let mut bmp = Bitmap::new(width as u32, height as u32, PixelFormat::Rgba);
        let mut x = 0;
        let glyphs = sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| {
                let rect = Rect::new(x, 0, w, h);
                bmp.fill_rect(rect, [255, 255, 255, 255]);
                x += w + 1;
                Glyph::new(0, rect, 0, char::from_u32(0x41 + i as u32).unwrap_or('?'))
            })
            .collect();
        (glyphs, bmp)
    }

    #[test]
    fn test_single_row_and_crop() {
        let (glyphs, src) = strip(&[(4, 5), (6, 3)]);
        let sheets = pack(&glyphs, &[src], &settings(64, 64, 1)).unwrap();
        assert_eq!(sheets.pages.len(), 1);
        assert_eq!(sheets.glyphs[0].rect, Rect::new(1, 1, 4, 5));
        assert_eq!(sheets.glyphs[1].rect, Rect::new(7, 1, 6, 3));
        // Required: width 6 + 8 = 14, height 5 + 2 = 7
        assert_eq!(sheets.pages[0].width(), 14);
        assert_eq!(sheets.pages[0].height(), 7);
        assert_eq!(sheets.pages[0].pixel(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(sheets.pages[0].pixel(0, 0), Some([255, 255, 255, 0]));
    }

    #[test]
    fn test_power_of_two_crop() {
        let (glyphs, src) = strip(&[(4, 5), (6, 3)]);
        let mut s = settings(64, 64, 1);
        s.force_power_of_two = true;
        let sheets = pack(&glyphs, &[src], &s).unwrap();
        assert_eq!(sheets.pages[0].width(), 16);
        assert_eq!(sheets.pages[0].height(), 8);
    }

    #[test]
    fn test_row_wrap() {
        let (glyphs, src) = strip(&[(6, 4), (6, 4), (6, 4)]);
        let sheets = pack(&glyphs, &[src], &settings(16, 64, 1)).unwrap();
        assert_eq!(sheets.glyphs[0].rect, Rect::new(1, 1, 6, 4));
        assert_eq!(sheets.glyphs[1].rect, Rect::new(9, 1, 6, 4));
        assert_eq!(sheets.glyphs[2].rect, Rect::new(1, 7, 6, 4));
        assert_eq!(sheets.pages.len(), 1);
    }

    #[test]
    fn test_page_overflow_keeps_full_earlier_pages() {
        let (glyphs, src) = strip(&[(6, 6), (6, 6), (6, 6)]);
        let sheets = pack(&glyphs, &[src], &settings(8, 16, 1)).unwrap();
        assert_eq!(sheets.pages.len(), 2);
        assert_eq!(sheets.glyphs[0].page, 0);
        assert_eq!(sheets.glyphs[1].page, 0);
        assert_eq!(sheets.glyphs[2].page, 1);
        assert_eq!((sheets.pages[0].width(), sheets.pages[0].height()), (8, 16));
        assert_eq!((sheets.pages[1].width(), sheets.pages[1].height()), (8, 8));
    }

    #[test]
    fn test_oversized_glyph_fails() {
        let (glyphs, src) = strip(&[(40, 4)]);
        let err = pack(&glyphs, &[src], &settings(16, 16, 1)).unwrap_err();
        assert!(matches!(err, FontError::PackingFailed { glyphs: 1, .. }));
    }

    #[test]
    fn test_rgb_source_is_masked() {
        let mut src = Bitmap::new(3, 3, PixelFormat::Rgb);
        src.set_pixel(1, 1, [90, 90, 90, 0]);
        let glyphs = [Glyph::new(0, Rect::new(0, 0, 3, 3), 0, 'a')];
        let sheets = pack(&glyphs, &[src], &settings(8, 8, 0)).unwrap();
        assert_eq!(sheets.pages[0].pixel(1, 1), Some([255, 255, 255, 90]));
        assert_eq!(sheets.pages[0].pixel(0, 0), Some([255, 255, 255, 0]));
    }

    #[test]
    fn test_scale_sheets_truncates() {
        let (glyphs, src) = strip(&[(5, 7)]);
        let mut sheets = pack(&glyphs, &[src], &settings(16, 16, 1)).unwrap();
        sheets.glyphs[0].y_offset = 3;
        scale_sheets(&mut sheets, 0.5);
        assert_eq!(sheets.glyphs[0].rect, Rect::new(0, 0, 2, 3));
        assert_eq!(sheets.glyphs[0].y_offset, 1);
        assert_eq!(sheets.pages[0].width(), 3);
    }

    proptest! {
        #[test]
        fn prop_packed_glyphs_never_overlap(
            sizes in prop::collection::vec((1i32..20, 1i32..20), 1..60),
            margin in 0i32..4,
        ) {
            let (glyphs, src) = strip(&sizes);
            let sheets = pack(&glyphs, &[src], &settings(64, 64, margin)).unwrap();
            prop_assert_eq!(sheets.glyphs.len(), glyphs.len());
            prop_assert_eq!(first_intercept(&sheets.glyphs), None);
            for g in &sheets.glyphs {
                let page = &sheets.pages[g.page];
                prop_assert!(g.rect.right() <= page.width() as i32);
                prop_assert!(g.rect.bottom() <= page.height() as i32);
            }
        }
    }
}
