//! Drop shadow glyph tables
//!
//! The shadow repacks the same glyphs with a margin wide enough for the
//! blur, paints them black and spreads the alpha channel.

use log::info;

use super::packer::{pack, scale_sheets, PackSettings};
use super::retarget::retarget_all_outwards;
use super::{check_overlap, Glyph, GlyphTable};
use crate::bitmap::Bitmap;
use crate::config::{ShadowConfig, ShadowType};
use crate::constants::SHADOW_MARGIN_PER_RADIUS;
use crate::error::Result;

/// Build a drop shadow table from packed glyphs and their pages
pub fn build_drop_shadow(
    pages: &[Bitmap],
    glyphs: &[Glyph],
    config: &ShadowConfig,
    tolerance: u8,
) -> Result<GlyphTable> {
    let settings = PackSettings {
        max_width: config.max_texture_size,
        max_height: config.max_texture_size,
        margin: config.glyph_margin + SHADOW_MARGIN_PER_RADIUS * config.blur_radius as i32,
        force_power_of_two: config.force_power_of_two,
    };
    let mut sheets = pack(glyphs, pages, &settings)?;

    if config.scale != 1.0 {
        scale_sheets(&mut sheets, config.scale);
    }

    for page in sheets.pages.iter_mut() {
        page.colour(0, 0, 0);
        match config.shadow_type {
            ShadowType::Blurred => page.blur_alpha(config.blur_radius, config.blur_passes),
            ShadowType::Expanded => page.expand_alpha(config.blur_radius, config.blur_passes),
        }
    }

    retarget_all_outwards(&sheets.pages, &mut sheets.glyphs, tolerance);
    check_overlap(&sheets.glyphs, "in the drop shadow")?;

    let mut table = GlyphTable::new(&sheets.glyphs, sheets.pages);
    table.is_drop_shadow = true;
    info!(
        "Drop shadow generated: {} glyphs, {} page(s), {:?} radius {} x{}",
        table.glyphs.len(),
        table.pages.len(),
        config.shadow_type,
        config.blur_radius,
        config.blur_passes
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{PixelFormat, Rect};

    fn source() -> (Vec<Bitmap>, Vec<Glyph>) {
        let mut page = Bitmap::new(32, 16, PixelFormat::Rgba);
        page.clear([255, 255, 255, 0]);
        page.fill_rect(Rect::new(2, 2, 4, 6), [255, 255, 255, 255]);
        page.fill_rect(Rect::new(10, 2, 6, 6), [255, 255, 255, 255]);
        let glyphs = vec![
            Glyph::new(0, Rect::new(2, 2, 4, 6), 1, 'i'),
            Glyph::new(0, Rect::new(10, 2, 6, 6), 1, 'o'),
        ];
        (vec![page], glyphs)
    }

    #[test]
    fn test_blurred_shadow_grows_and_blackens() {
        let (pages, glyphs) = source();
        let config = ShadowConfig {
            blur_radius: 1,
            blur_passes: 1,
            force_power_of_two: false,
            max_texture_size: 128,
            ..Default::default()
        };
        let table = build_drop_shadow(&pages, &glyphs, &config, 0).unwrap();
        assert!(table.is_drop_shadow);
        assert_eq!(table.pages.len(), 1);

        let i = table.glyph('i').unwrap();
        // Blur spreads one pixel on every side
        assert_eq!(i.rect.width, 6);
        assert_eq!(i.rect.height, 8);
        assert_eq!(i.y_offset, 0);

        let page = table.pages[0].bitmap();
        let [r, g, b, a] = page
            .pixel(i.rect.x + 3, i.rect.y + 4)
            .unwrap();
        assert_eq!((r, g, b), (0, 0, 0));
        assert_eq!(a, 255);
        assert!(table.mean_glyph_width > 0.0);
    }

    #[test]
    fn test_expanded_shadow() {
        let (pages, glyphs) = source();
        let config = ShadowConfig {
            shadow_type: ShadowType::Expanded,
            blur_radius: 2,
            blur_passes: 1,
            max_texture_size: 128,
            ..Default::default()
        };
        let table = build_drop_shadow(&pages, &glyphs, &config, 0).unwrap();
        let o = table.glyph('o').unwrap();
        assert_eq!((o.rect.width, o.rect.height), (10, 10));
        assert_eq!(table.validate_overlap("test").ok(), Some(()));
    }
}
