//! Glyph atlas builder
//!
//! Rasterizes the configured characters into a single strip, tightens
//! every glyph to its ink, packs the glyphs onto pages and, when super
//! sampling, scales the pages back down. Kerning and the optional drop
//! shadow are derived from the packed pages.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::kerning::{calculate_kerning, NativeKerning};
use super::packer::{pack, scale_sheets, PackSettings};
use super::retarget::{retarget_all_inwards, retarget_all_outwards};
use super::serialize::save_glyph_table;
use super::shadow::build_drop_shadow;
use super::{check_overlap, is_monospaced, Glyph, GlyphTable};
use crate::bitmap::{Bitmap, PixelFormat, Rect};
use crate::config::{BuildConfig, FontStyle};
use crate::constants::STRIP_MARGIN;
use crate::error::{FontError, Result};
use crate::font::rasterizer::{open_font, resolve_hint, GlyphRasterizer};

/// Builds glyph tables from a rasterizer
pub struct Builder<'a> {
    config: &'a BuildConfig,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    fn super_sample(&self) -> f32 {
        self.config.super_sample_levels as f32
    }

    /// Open `font` (file path or family name) at the super-sampled size
    /// and build its table
    pub fn build_font(&self, font: &str, size: f32, style: FontStyle) -> Result<GlyphTable> {
        self.config.validate()?;
        let rasterizer = open_font(font, size * self.super_sample(), style)?;
        self.build(&rasterizer)
    }

    /// Build, then write the pages and `.qfont` file under `name`
    pub fn build_and_save(&self, rasterizer: &dyn GlyphRasterizer, name: &Path) -> Result<(GlyphTable, PathBuf)> {
        let table = self.build(rasterizer)?;
        let path = save_glyph_table(&table, name)?;
        Ok((table, path))
    }

    /// Characters the rasterizer can draw; space is always kept
    fn supported_chars(&self, rasterizer: &dyn GlyphRasterizer) -> Result<Vec<char>> {
        let mut chars = Vec::new();
        let mut skipped = 0usize;
        for c in self.config.chars() {
            if c == ' ' || rasterizer.has_glyph(c) {
                chars.push(c);
            } else {
                debug!("Font has no glyph for {:?} (U+{:04X})", c, c as u32);
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!("{} characters not supported by this font were skipped", skipped);
        }
        if chars.iter().all(|&c| c == ' ') {
            return Err(FontError::EmptyCharacterSet);
        }
        Ok(chars)
    }

    /// Draw every character into one RGB strip, each in its own padded cell
    fn rasterize_strip(&self, rasterizer: &dyn GlyphRasterizer, chars: &[char]) -> (Bitmap, Vec<Glyph>) {
        let sizes: Vec<(i32, i32)> = chars.iter().map(|&c| rasterizer.measure(c)).collect();
        let max_w = sizes.iter().map(|s| s.0).max().unwrap_or(0);
        let max_h = sizes.iter().map(|s| s.1).max().unwrap_or(0);

        let width = ((max_w + STRIP_MARGIN) * chars.len() as i32 + STRIP_MARGIN).max(1) as u32;
        let height = ((max_h + STRIP_MARGIN) * 2).max(1) as u32;
        debug!("Glyph strip: {}x{} for {} characters", width, height, chars.len());

        let hint = resolve_hint(self.config.render_hint, rasterizer.size() / self.super_sample());
        let mut strip = Bitmap::new(width, height, PixelFormat::Rgb);
        let mut glyphs = Vec::with_capacity(chars.len());
        let mut x = STRIP_MARGIN;
        for (&c, &(w, h)) in chars.iter().zip(&sizes) {
            let (dx, dy) = rasterizer.draw(c, &mut strip, [255, 255, 255], x, STRIP_MARGIN, hint);
            glyphs.push(Glyph::new(0, Rect::new(x + dx, STRIP_MARGIN + dy, w, h), 0, c));
            x += w + STRIP_MARGIN;
        }
        (strip, glyphs)
    }

    /// Build a glyph table from `rasterizer`, which must already render at
    /// the super-sampled size
    pub fn build(&self, rasterizer: &dyn GlyphRasterizer) -> Result<GlyphTable> {
        self.config.validate()?;
        let ss = self.super_sample();
        let tolerance = self.config.kerning.alpha_empty_pixel_tolerance;

        let chars = self.supported_chars(rasterizer)?;
        let (strip, mut glyphs) = self.rasterize_strip(rasterizer, &chars);
        let naturally_monospaced = is_monospaced(glyphs.iter().map(|g| g.rect.width));

        retarget_all_inwards(std::slice::from_ref(&strip), &mut glyphs, tolerance);

        let settings = PackSettings {
            max_width: self.config.max_texture_size * self.config.super_sample_levels as u32,
            max_height: self.config.max_texture_size * self.config.super_sample_levels as u32,
            margin: self.config.glyph_margin * self.config.super_sample_levels as i32,
            force_power_of_two: self.config.force_power_of_two,
        };
        let mut sheets = pack(&glyphs, std::slice::from_ref(&strip), &settings)?;
        check_overlap(&sheets.glyphs, "after packing")?;

        if self.config.super_sample_levels != 1 {
            scale_sheets(&mut sheets, 1.0 / ss);
            retarget_all_outwards(&sheets.pages, &mut sheets.glyphs, tolerance);
            check_overlap(&sheets.glyphs, "after resizing")?;
        }

        let mut table = GlyphTable::new(&sheets.glyphs, sheets.pages);
        table.naturally_monospaced = naturally_monospaced;
        table.kerning_pairs = calculate_kerning(
            &chars,
            &table.glyphs,
            &table.page_bitmaps(),
            &self.config.kerning,
            Some(NativeKerning {
                rasterizer,
                scale: 1.0 / ss,
            }),
        );

        if let Some(shadow) = &self.config.shadow {
            let shadow_table = build_drop_shadow(&table.page_bitmaps(), &sheets.glyphs, shadow, tolerance)?;
            table.drop_shadow = Some(Box::new(shadow_table));
        }

        let (w, h) = table
            .pages
            .last()
            .map(|p| (p.width(), p.height()))
            .unwrap_or((0, 0));
        info!(
            "Glyph atlas generated: {}x{}, {} glyphs, {} page(s)",
            w,
            h,
            table.glyphs.len(),
            table.pages.len()
        );
        Ok(table)
    }
}
