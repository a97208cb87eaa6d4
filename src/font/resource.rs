//! Font resource
//!
//! A `Font` is a glyph table on exactly one atlas page, optionally paired
//! with a drop shadow font, plus the texture handles once uploaded.

use std::path::Path;

use log::debug;

use crate::atlas::serialize::load_glyph_table;
use crate::atlas::{AtlasPage, Builder, Glyph, GlyphTable};
use crate::config::{BuildConfig, FontStyle, LoaderConfig};
use crate::drawing::context::{RenderContext, TextureId};
use crate::error::{FontError, Result};
use crate::layout::{Alignment, RenderOptions, Size, TextLayout};

#[derive(Debug, Clone)]
pub struct Font {
    table: GlyphTable,
    drop_shadow: Option<Box<Font>>,
}

impl Font {
    /// Wrap a built or loaded table; the table and its shadow must each
    /// have exactly one page
    pub fn from_table(mut table: GlyphTable) -> Result<Self> {
        if table.pages.len() != 1 {
            return Err(FontError::PageCount {
                pages: table.pages.len(),
                drop_shadow: table.is_drop_shadow,
            });
        }
        let drop_shadow = match table.drop_shadow.take() {
            Some(shadow) => Some(Box::new(Font::from_table(*shadow)?)),
            None => None,
        };
        Ok(Self { table, drop_shadow })
    }

    /// Rasterize `font` (file path or family name) at `size` pixels
    pub fn build(font: &str, size: f32, style: FontStyle, config: &BuildConfig) -> Result<Self> {
        let table = Builder::new(config).build_font(font, size, style)?;
        Self::from_table(table)
    }

    /// Load a `.qfont` file and its page image
    pub fn load(path: &Path, config: &LoaderConfig) -> Result<Self> {
        let font = Self::from_table(load_glyph_table(path, config)?)?;
        debug!(
            "Font ready: {} ({} glyphs{})",
            path.display(),
            font.table.glyphs.len(),
            if font.drop_shadow.is_some() { ", drop shadow" } else { "" }
        );
        Ok(font)
    }

    pub fn data(&self) -> &GlyphTable {
        &self.table
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.table.glyph(c)
    }

    pub fn kerning(&self, left: char, right: char) -> i32 {
        self.table.kerning(left, right)
    }

    pub fn mean_glyph_width(&self) -> f32 {
        self.table.mean_glyph_width
    }

    pub fn max_glyph_height(&self) -> i32 {
        self.table.max_glyph_height
    }

    pub fn max_line_height(&self) -> i32 {
        self.table.max_line_height
    }

    pub fn is_naturally_monospaced(&self) -> bool {
        self.table.naturally_monospaced
    }

    pub fn monospace_width(&self, options: &RenderOptions) -> f32 {
        self.table.monospace_width(options)
    }

    pub fn line_spacing(&self, options: &RenderOptions) -> f32 {
        self.table.line_spacing(options)
    }

    pub fn drop_shadow(&self) -> Option<&Font> {
        self.drop_shadow.as_deref()
    }

    pub fn page(&self) -> Option<&AtlasPage> {
        self.table.pages.first()
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.page().and_then(AtlasPage::texture)
    }

    /// Register the page (and the shadow's page) with `ctx`
    ///
    /// Uploading twice keeps the existing texture.
    pub fn upload(&mut self, ctx: &mut RenderContext) -> Result<TextureId> {
        let page = self.table.pages.first_mut().ok_or(FontError::PageCount {
            pages: 0,
            drop_shadow: self.table.is_drop_shadow,
        })?;
        let id = match page.texture() {
            Some(id) => id,
            None => {
                let id = ctx.register_texture(page.bitmap());
                page.set_texture(Some(id));
                id
            }
        };
        if let Some(shadow) = self.drop_shadow.as_mut() {
            shadow.upload(ctx)?;
        }
        Ok(id)
    }

    /// Free the textures registered by `upload`
    pub fn release(&mut self, ctx: &mut RenderContext) {
        for page in self.table.pages.iter_mut() {
            if let Some(id) = page.texture() {
                ctx.release_texture(id);
                page.set_texture(None);
            }
        }
        if let Some(shadow) = self.drop_shadow.as_mut() {
            shadow.release(ctx);
        }
    }

    /// Size of `text` laid out within `max_size`, or on unbounded lines
    pub fn measure(&self, text: &str, options: &RenderOptions, max_size: Option<Size>, alignment: Alignment) -> Size {
        let layout = TextLayout::new(&self.table, options);
        match max_size {
            Some(max_size) => {
                let mut processed = layout.process_text(text, max_size, alignment);
                layout.layout(&mut processed, None)
            }
            None => layout.layout_unbounded(text, alignment, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{Bitmap, PixelFormat, Rect};

    fn table(pages: usize) -> GlyphTable {
        let glyphs = [
            Glyph::new(0, Rect::new(0, 0, 8, 10), 1, 'a'),
            Glyph::new(0, Rect::new(10, 0, 8, 10), 1, ' '),
        ];
        let pages = (0..pages).map(|_| Bitmap::new(32, 16, PixelFormat::Rgba)).collect();
        GlyphTable::new(&glyphs, pages)
    }

    #[test]
    fn test_page_count_enforced() {
        assert!(Font::from_table(table(1)).is_ok());
        match Font::from_table(table(2)) {
            Err(FontError::PageCount { pages, drop_shadow }) => {
                assert_eq!(pages, 2);
                assert!(!drop_shadow);
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }

        let mut with_shadow = table(1);
        let mut shadow = table(2);
        shadow.is_drop_shadow = true;
        with_shadow.drop_shadow = Some(Box::new(shadow));
        let err = Font::from_table(with_shadow).err().unwrap();
        assert!(err.to_string().starts_with("Drop shadow font"));
    }

    #[test]
    fn test_upload_and_release() {
        let mut base = table(1);
        let mut shadow = table(1);
        shadow.is_drop_shadow = true;
        base.drop_shadow = Some(Box::new(shadow));
        let mut font = Font::from_table(base).unwrap();

        let mut ctx = RenderContext::new();
        let id = font.upload(&mut ctx).unwrap();
        assert_eq!(font.texture(), Some(id));
        assert!(font.drop_shadow().unwrap().texture().is_some());
        assert_eq!(font.upload(&mut ctx).unwrap(), id);
        assert_eq!(ctx.texture_count(), 2);

        font.release(&mut ctx);
        assert_eq!(font.texture(), None);
        assert_eq!(ctx.texture_count(), 0);
    }

    #[test]
    fn test_metrics_and_measure() {
        let font = Font::from_table(table(1)).unwrap();
        assert_eq!(font.mean_glyph_width(), 8.0);
        assert_eq!(font.max_line_height(), 11);
        let options = RenderOptions {
            character_spacing: 0.0,
            ..Default::default()
        };
        let size = font.measure("aa", &options, None, Alignment::Left);
        assert_eq!(size, Size::new(16.0, 11.0));
        let bounded = font.measure("aa aa", &options, Some(Size::new(20.0, 0.0)), Alignment::Left);
        assert_eq!(bounded, Size::new(16.0, 22.0));
    }
}
