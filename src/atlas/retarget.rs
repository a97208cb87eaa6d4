//! Glyph rectangle retargeting
//!
//! Inward retargeting shrinks a rectangle to the ink it contains;
//! outward retargeting grows it while the neighbouring rows/columns
//! still contain ink. Emptiness follows the bitmap format: black for
//! RGB strips, alpha at or below the tolerance for RGBA pages.

use log::trace;

use super::Glyph;
use crate::bitmap::{Bitmap, Rect};

fn column_has_ink(bitmap: &Bitmap, x: i32, rows: impl Iterator<Item = i32>, tolerance: u8) -> bool {
    rows.into_iter().any(|y| !bitmap.is_empty(x, y, tolerance))
}

fn row_has_ink(bitmap: &Bitmap, y: i32, columns: impl Iterator<Item = i32>, tolerance: u8) -> bool {
    columns.into_iter().any(|x| !bitmap.is_empty(x, y, tolerance))
}

/// Shrink the glyph rectangle to its tight ink bounds
///
/// Columns are searched from both sides over the rectangle's rows; rows are
/// then searched over columns `[start_x, end_x]`. An axis without ink
/// collapses to the rectangle's top-left. `y_offset` becomes the new top.
pub fn retarget_inwards(bitmap: &Bitmap, glyph: &mut Glyph, tolerance: u8) {
    let rect = glyph.rect;
    let rows = || rect.y..rect.bottom();

    let start_x = (rect.x..rect.right()).find(|&x| column_has_ink(bitmap, x, rows(), tolerance));
    let end_x = (rect.x..rect.right())
        .rev()
        .find(|&x| column_has_ink(bitmap, x, rows(), tolerance));
    let (start_x, end_x) = match (start_x, end_x) {
        (Some(s), Some(e)) => (s, e),
        _ => (rect.x, rect.x),
    };

    let columns = || start_x..=end_x;
    let start_y = (rect.y..rect.bottom()).find(|&y| row_has_ink(bitmap, y, columns(), tolerance));
    let end_y = (rect.y..rect.bottom())
        .rev()
        .find(|&y| row_has_ink(bitmap, y, columns(), tolerance));
    let (start_y, end_y) = match (start_y, end_y) {
        (Some(s), Some(e)) => (s, e),
        _ => (rect.y, rect.y),
    };

    glyph.rect = Rect::new(start_x, start_y, end_x - start_x + 1, end_y - start_y + 1);
    glyph.y_offset = glyph.rect.y;
    trace!("Retarget in '{}': {:?} -> {:?}", glyph.character, rect, glyph.rect);
}

/// Grow the glyph rectangle while adjacent columns/rows contain ink
///
/// Each side starts at its own outermost row or column; an empty edge
/// line moves that side one step inward. Sides stop at the bitmap bounds.
/// The vertical offset follows the top edge so the ink stays in place. A
/// rectangle with no ink at all is left unchanged.
pub fn retarget_outwards(bitmap: &Bitmap, glyph: &mut Glyph, tolerance: u8) {
    let rect = glyph.rect;
    let max_x = bitmap.width() as i32 - 1;
    let max_y = bitmap.height() as i32 - 1;
    let rows = || rect.y..rect.bottom();

    let mut start_x = rect.x;
    loop {
        if start_x < 0 {
            start_x = 0;
            break;
        }
        if !column_has_ink(bitmap, start_x, rows(), tolerance) {
            start_x += 1;
            break;
        }
        start_x -= 1;
    }

    let mut end_x = rect.right() - 1;
    loop {
        if end_x > max_x {
            end_x = max_x;
            break;
        }
        if !column_has_ink(bitmap, end_x, rows(), tolerance) {
            end_x -= 1;
            break;
        }
        end_x += 1;
    }

    if end_x < start_x {
        return;
    }
    let columns = || start_x..=end_x;

    let mut start_y = rect.y;
    loop {
        if start_y < 0 {
            start_y = 0;
            break;
        }
        if !row_has_ink(bitmap, start_y, columns(), tolerance) {
            start_y += 1;
            break;
        }
        start_y -= 1;
    }

    let mut end_y = rect.bottom() - 1;
    loop {
        if end_y > max_y {
            end_y = max_y;
            break;
        }
        if !row_has_ink(bitmap, end_y, columns(), tolerance) {
            end_y -= 1;
            break;
        }
        end_y += 1;
    }

    if end_y < start_y {
        return;
    }

    glyph.y_offset += start_y - rect.y;
    glyph.rect = Rect::new(start_x, start_y, end_x - start_x + 1, end_y - start_y + 1);
    trace!("Retarget out '{}': {:?} -> {:?}", glyph.character, rect, glyph.rect);
}

/// Retarget every glyph inward on its page, then normalise offsets
pub fn retarget_all_inwards(pages: &[Bitmap], glyphs: &mut [Glyph], tolerance: u8) {
    for glyph in glyphs.iter_mut() {
        if let Some(page) = pages.get(glyph.page) {
            retarget_inwards(page, glyph, tolerance);
        }
    }
    normalise_offsets(glyphs);
}

pub fn retarget_all_outwards(pages: &[Bitmap], glyphs: &mut [Glyph], tolerance: u8) {
    for glyph in glyphs.iter_mut() {
        if let Some(page) = pages.get(glyph.page) {
            retarget_outwards(page, glyph, tolerance);
        }
    }
}

/// Shift offsets so the highest glyph sits one pixel below the line top
pub fn normalise_offsets(glyphs: &mut [Glyph]) {
    let Some(min) = glyphs.iter().map(|g| g.y_offset).min() else {
        return;
    };
    let headroom = min - 1;
    for glyph in glyphs.iter_mut() {
        glyph.y_offset -= headroom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::PixelFormat;

    fn ink(format: PixelFormat, w: u32, h: u32, region: Rect) -> Bitmap {
        let mut bmp = Bitmap::new(w, h, format);
        bmp.fill_rect(region, [255, 255, 255, 255]);
        bmp
    }

    #[test]
    fn test_inward_finds_tight_bounds() {
        let bmp = ink(PixelFormat::Rgb, 20, 20, Rect::new(5, 6, 4, 3));
        let mut g = Glyph::new(0, Rect::new(2, 2, 12, 12), 0, 'x');
        retarget_inwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(5, 6, 4, 3));
        assert_eq!(g.y_offset, 6);
    }

    #[test]
    fn test_inward_empty_collapses_to_top_left() {
        let bmp = Bitmap::new(20, 20, PixelFormat::Rgb);
        let mut g = Glyph::new(0, Rect::new(3, 4, 10, 10), 0, ' ');
        retarget_inwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(3, 4, 1, 1));
    }

    #[test]
    fn test_inward_alpha_tolerance() {
        let mut bmp = ink(PixelFormat::Rgba, 20, 20, Rect::new(8, 8, 2, 2));
        // Faint halo that the tolerance hides
        bmp.set_pixel(4, 8, [255, 255, 255, 10]);
        let mut g = Glyph::new(0, Rect::new(0, 0, 15, 15), 0, 'o');
        retarget_inwards(&bmp, &mut g, 10);
        assert_eq!(g.rect, Rect::new(8, 8, 2, 2));

        let mut g = Glyph::new(0, Rect::new(0, 0, 15, 15), 0, 'o');
        retarget_inwards(&bmp, &mut g, 0);
        assert_eq!(g.rect.x, 4);
    }

    #[test]
    fn test_outward_regrows_shrunk_rect() {
        let bmp = ink(PixelFormat::Rgba, 20, 20, Rect::new(5, 5, 6, 4));
        let mut g = Glyph::new(0, Rect::new(6, 6, 2, 2), 3, 'x');
        retarget_outwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(5, 5, 6, 4));
        assert_eq!(g.y_offset, 2);
    }

    #[test]
    fn test_outward_settles_on_last_ink_line() {
        // One empty column on the right and one empty row at the bottom
        let bmp = ink(PixelFormat::Rgba, 20, 20, Rect::new(5, 5, 4, 4));
        let mut g = Glyph::new(0, Rect::new(5, 5, 5, 5), 0, 'x');
        retarget_outwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(5, 5, 4, 4));
        assert_eq!(g.y_offset, 0);
    }

    #[test]
    fn test_inward_ignores_ink_past_the_rect() {
        let mut bmp = ink(PixelFormat::Rgb, 20, 20, Rect::new(4, 4, 3, 3));
        // Neighbour starting right at the exclusive edge
        bmp.fill_rect(Rect::new(10, 4, 2, 2), [255, 255, 255, 255]);
        let mut g = Glyph::new(0, Rect::new(2, 2, 8, 8), 0, 'x');
        retarget_inwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(4, 4, 3, 3));
    }

    #[test]
    fn test_outward_stops_at_bitmap_edge() {
        let bmp = ink(PixelFormat::Rgba, 8, 8, Rect::new(0, 0, 8, 8));
        let mut g = Glyph::new(0, Rect::new(2, 2, 2, 2), 0, 'x');
        retarget_outwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(0, 0, 8, 8));
    }

    #[test]
    fn test_outward_ignores_empty_glyph() {
        let bmp = Bitmap::new(8, 8, PixelFormat::Rgba);
        let mut g = Glyph::new(0, Rect::new(2, 2, 1, 1), 1, ' ');
        retarget_outwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, Rect::new(2, 2, 1, 1));
        assert_eq!(g.y_offset, 1);
    }

    #[test]
    fn test_inward_then_outward_is_stable() {
        let region = Rect::new(7, 3, 5, 9);
        let bmp = ink(PixelFormat::Rgba, 24, 16, region);
        let mut g = Glyph::new(0, Rect::new(1, 1, 20, 14), 0, 'x');
        retarget_inwards(&bmp, &mut g, 0);
        let tight = g.rect;
        retarget_outwards(&bmp, &mut g, 0);
        assert_eq!(g.rect, tight);
        assert_eq!(g.rect, region);
    }

    #[test]
    fn test_normalise_offsets_leaves_headroom() {
        let mut glyphs = vec![
            Glyph::new(0, Rect::new(0, 10, 1, 1), 10, 'a'),
            Glyph::new(0, Rect::new(0, 4, 1, 1), 4, 'b'),
            Glyph::new(0, Rect::new(0, 7, 1, 1), 7, 'c'),
        ];
        normalise_offsets(&mut glyphs);
        let offsets: Vec<i32> = glyphs.iter().map(|g| g.y_offset).collect();
        assert_eq!(offsets, vec![7, 1, 4]);
    }
}
